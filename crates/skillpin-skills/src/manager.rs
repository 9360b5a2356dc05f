//! Lifecycle operations over the lockfile
//!
//! [`SkillManager`] ties the lockfile store, the reconciliation policy and a
//! scanner together. Every operation is sequential and writes the lockfile
//! itself, so callers never touch the store directly.

use skillpin_lockfile::{diff, LockfileDiff, LockfileStore};
use skillpin_source::{expand_home, expand_source, is_local_source, select_skill, Checkout, ResolveOptions};
use skillpin_types::{InstalledSkill, Lockfile, ResolvedSkill, Result, SkillEntry, SkillpinError, MANIFEST_FILE, ROOT_PATH};
use tracing::{debug, info, warn};

use crate::collaborators::{find_installed, Installer, Remover, Scanner};
use crate::policy::{Decision, InstallTarget, ReconcileFailure, ReconcileReport, ReconciliationPolicy};

/// Options for [`SkillManager::add`]
#[derive(Debug, Clone, Default)]
pub struct AddOptions {
    /// Skill to pick when the repository holds several
    pub skill: Option<String>,
    /// Branch to resolve instead of the remote default
    pub branch: Option<String>,
}

/// Classification of one locked skill, as reported by [`SkillManager::status`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillStatus {
    /// Skill name
    pub name: String,
    /// Pinned commit
    pub git_ref: String,
    /// What an install pass would do
    pub decision: Decision,
}

/// Runs install, add, update, remove and status against one lockfile
#[derive(Debug)]
pub struct SkillManager<I, S> {
    store: LockfileStore,
    policy: ReconciliationPolicy<I>,
    scanner: S,
}

impl<I, S> SkillManager<I, S>
where
    I: Installer + Remover,
    S: Scanner,
{
    /// Create a manager
    pub fn new(store: LockfileStore, policy: ReconciliationPolicy<I>, scanner: S) -> Self {
        Self {
            store,
            policy,
            scanner,
        }
    }

    /// The lockfile store
    pub fn store(&self) -> &LockfileStore {
        &self.store
    }

    /// The reconciliation policy
    pub fn policy(&self) -> &ReconciliationPolicy<I> {
        &self.policy
    }

    fn read_required(&self) -> Result<Lockfile> {
        self.store.read()?.ok_or_else(|| {
            SkillpinError::NotFound(format!("Lockfile {}", self.store.path().display()))
        })
    }

    /// Bring every installed skill in line with the lockfile
    ///
    /// The lockfile is written once, at the end, if any entry was refreshed.
    /// On failure the refreshes made before it are still written, and the
    /// failure carries the report of every skill processed.
    pub async fn install(&self, force: bool) -> std::result::Result<ReconcileReport, ReconcileFailure> {
        let mut lock = self.read_required()?;
        let original = lock.clone();
        let installed = self.scanner.scan().await?;

        let result = self.policy.install_all(&mut lock, &installed, force).await;
        if lock != original {
            if let Err(error) = self.store.write(&lock) {
                let report = match result {
                    Ok(report) => report,
                    Err(failure) => failure.report,
                };
                return Err(ReconcileFailure { report, error });
            }
            info!("Updated {}", self.store.path().display());
        }
        result
    }

    /// Resolve `source`, install the chosen skill and pin it
    ///
    /// Returns the name the skill was locked under and its entry.
    pub async fn add(&self, source: &str, options: &AddOptions) -> Result<(String, SkillEntry)> {
        let mut lock = self.store.read_or_default()?;
        let installed = self.scanner.scan().await?;

        let (tree, source) = self.open(source, options.branch.as_deref()).await?;
        let result = self.add_from(&tree, &source, options, &installed).await;
        let cleaned = tree.cleanup();
        let (name, entry) = result?;
        cleaned?;

        if let Some(previous) = lock.insert(name.clone(), entry.clone()) {
            info!("Re-pinned '{}' from {} to {}", name, previous.git_ref, entry.git_ref);
        }
        self.store.write(&lock)?;
        info!("Added '{}' at {}", name, entry.git_ref);
        Ok((name, entry))
    }

    async fn add_from(
        &self,
        tree: &Checkout,
        source: &str,
        options: &AddOptions,
        installed: &[InstalledSkill],
    ) -> Result<(String, SkillEntry)> {
        let skills = self.policy.resolver().find_skills(tree.path(), source).await?;
        let skill = select_skill(&skills, options.skill.as_deref())?;
        let name = lock_name(skill);

        let entry = skill.to_entry();
        let target = InstallTarget {
            name: &name,
            git_ref: &entry.git_ref,
            subpath: entry.subpath(),
            expected: None,
            replace: find_installed(installed, &name).is_some(),
        };
        let integrity = self.policy.install_from(tree.path(), &target).await?;
        Ok((name, entry.with_integrity(integrity)))
    }

    /// Move locked skills to the newest upstream commit
    ///
    /// With no names every locked skill is checked. The lockfile is written
    /// after each skill that moves, so a later failure keeps earlier updates.
    /// Returns how the lockfile changed.
    pub async fn update(&self, names: &[String]) -> Result<LockfileDiff> {
        let mut lock = self.read_required()?;
        let original = lock.clone();

        let selected: Vec<String> = if names.is_empty() {
            lock.names().cloned().collect()
        } else {
            for name in names {
                if lock.get(name).is_none() {
                    return Err(SkillpinError::NotFound(format!("Skill '{name}' is not locked")));
                }
            }
            names.to_vec()
        };

        let installed = self.scanner.scan().await?;
        for name in &selected {
            let Some(entry) = lock.get(name).cloned() else {
                continue;
            };

            let (tree, _) = self.open(&entry.source, None).await?;
            let result = self.update_from(&tree, name, &entry, &installed).await;
            let cleaned = tree.cleanup();
            let updated = result?;
            cleaned?;

            if let Some(updated) = updated {
                info!("Updated '{}' from {} to {}", name, entry.git_ref, updated.git_ref);
                lock.insert(name.clone(), updated);
                self.store.write(&lock)?;
            } else {
                debug!("Skill '{}' is already at the latest commit", name);
            }
        }

        Ok(diff(&original, &lock))
    }

    async fn update_from(
        &self,
        tree: &Checkout,
        name: &str,
        entry: &SkillEntry,
        installed: &[InstalledSkill],
    ) -> Result<Option<SkillEntry>> {
        let head = self.policy.resolver().resolve_ref(tree.path()).await?;
        if head == entry.git_ref {
            return Ok(None);
        }

        if !tree.path().join(&entry.path).join(MANIFEST_FILE).is_file() {
            let skills = self.policy.resolver().find_skills(tree.path(), &entry.source).await?;
            return Err(SkillpinError::Resolution {
                message: format!("Skill '{name}' no longer exists at {} in {}", entry.path, entry.source),
                available: skills.into_iter().map(|s| s.name).collect(),
            });
        }

        let target = InstallTarget {
            name,
            git_ref: &head,
            subpath: entry.subpath(),
            expected: None,
            replace: find_installed(installed, name).is_some(),
        };
        let integrity = self.policy.install_from(tree.path(), &target).await?;
        Ok(Some(
            SkillEntry::new(&entry.source, &entry.path, head).with_integrity(integrity),
        ))
    }

    /// Uninstall a locked skill and drop it from the lockfile
    pub async fn remove(&self, name: &str) -> Result<SkillEntry> {
        let mut lock = self.read_required()?;
        if lock.get(name).is_none() {
            return Err(SkillpinError::NotFound(format!("Skill '{name}' is not locked")));
        }

        let installed = self.scanner.scan().await?;
        if find_installed(&installed, name).is_some() {
            self.policy.installer().remove(name).await?;
        } else {
            warn!("Skill '{}' is locked but not installed", name);
        }

        let entry = lock
            .remove(name)
            .ok_or_else(|| SkillpinError::NotFound(format!("Skill '{name}' is not locked")))?;
        self.store.write(&lock)?;
        info!("Removed '{}'", name);
        Ok(entry)
    }

    /// Classify every locked skill without changing anything
    pub async fn status(&self) -> Result<Vec<SkillStatus>> {
        let lock = self.read_required()?;
        let installed = self.scanner.scan().await?;

        Ok(lock
            .skills
            .iter()
            .map(|(name, entry)| SkillStatus {
                name: name.clone(),
                git_ref: entry.git_ref.clone(),
                decision: self
                    .policy
                    .check(name, entry, find_installed(&installed, name), false),
            })
            .collect())
    }

    /// Clone `source` shallowly, returning the checkout and the source to lock
    ///
    /// A local source must be the root of a git work tree. It is cloned like
    /// a remote, so only committed content is installed, and it is locked
    /// under its canonical path.
    async fn open(&self, source: &str, branch: Option<&str>) -> Result<(Checkout, String)> {
        let source = if is_local_source(source) {
            let path = std::fs::canonicalize(expand_home(source))?;
            let root = self.policy.resolver().toplevel(&path).await?;
            if root != path {
                return Err(SkillpinError::resolution(format!(
                    "Local source {} is not the root of its repository ({})",
                    path.display(),
                    root.display()
                )));
            }
            debug!("Using local repository {}", path.display());
            path.to_string_lossy().into_owned()
        } else {
            expand_source(source)
        };

        let options = ResolveOptions {
            branch: branch.map(str::to_string),
        };
        let checkout = self.policy.resolver().resolve_repo(&source, &options).await?;
        Ok((checkout, source))
    }
}

/// Name a discovered skill is locked under
///
/// A root-level skill is named after its repository.
fn lock_name(skill: &ResolvedSkill) -> String {
    if skill.name != ROOT_PATH {
        return skill.name.clone();
    }
    let trimmed = skill.source.trim_end_matches('/');
    let last = trimmed.rsplit(|c: char| c == '/' || c == ':').next().unwrap_or(trimmed);
    last.strip_suffix(".git").unwrap_or(last).to_string()
}
