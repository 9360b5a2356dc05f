//! Reconciliation of locked entries against installed skills
//!
//! Each locked skill moves through
//! `Unchecked → {Satisfied | Drifted}` and `Drifted → Installing → {Verified | Failed}`.
//! [`classify`] is the pure decision table; [`ReconciliationPolicy`] adds
//! the live content hash and drives the install-then-verify sequence.

use skillpin_integrity::{compute_skill_hash, verify_integrity, write_skill_metadata};
use skillpin_source::SourceResolver;
use skillpin_types::{InstalledSkill, Lockfile, Result, SkillEntry, SkillpinError};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::collaborators::{find_installed, InstallRequest, Installer, Remover};

/// Why a locked skill has to be (re)installed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriftReason {
    /// Nothing is installed under the skill's name
    NotInstalled,
    /// Reinstall was requested regardless of state
    Forced,
    /// Installed directory has no manifest
    MissingManifest,
    /// Installed without a sidecar, so its origin is unknown
    Unmanaged,
    /// Installed from a different commit
    RefMismatch {
        /// Commit recorded in the sidecar
        installed: String,
    },
    /// Installed content no longer hashes to the recorded integrity
    LocalEdits,
}

impl fmt::Display for DriftReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriftReason::NotInstalled => write!(f, "not installed"),
            DriftReason::Forced => write!(f, "forced"),
            DriftReason::MissingManifest => write!(f, "missing manifest"),
            DriftReason::Unmanaged => write!(f, "unmanaged"),
            DriftReason::RefMismatch { installed } => write!(f, "wrong commit ({installed})"),
            DriftReason::LocalEdits => write!(f, "local edits"),
        }
    }
}

/// What to do with one locked skill
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// On-disk state already matches the lock
    Satisfied,
    /// Install or reinstall
    Install(DriftReason),
}

/// Where a skill is in its reconciliation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkillState {
    /// Not yet compared with the disk
    Unchecked,
    /// Nothing to do
    Satisfied,
    /// Needs a (re)install
    Drifted(DriftReason),
    /// Install in progress
    Installing,
    /// Installed and hashed as expected
    Verified,
    /// Install or verification failed
    Failed,
}

impl SkillState {
    /// Satisfied, Verified and Failed end a reconciliation
    pub fn is_terminal(&self) -> bool {
        matches!(self, SkillState::Satisfied | SkillState::Verified | SkillState::Failed)
    }

    /// State after a decision has been made for an unchecked skill
    pub fn decided(decision: Decision) -> Self {
        match decision {
            Decision::Satisfied => SkillState::Satisfied,
            Decision::Install(reason) => SkillState::Drifted(reason),
        }
    }
}

impl fmt::Display for SkillState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkillState::Unchecked => write!(f, "unchecked"),
            SkillState::Satisfied => write!(f, "up to date"),
            SkillState::Drifted(reason) => write!(f, "drifted: {reason}"),
            SkillState::Installing => write!(f, "installing"),
            SkillState::Verified => write!(f, "installed"),
            SkillState::Failed => write!(f, "failed"),
        }
    }
}

/// Apply the decision table to one locked entry
///
/// Only recorded state is consulted here; the live content hash is checked
/// by [`ReconciliationPolicy::check`].
pub fn classify(entry: &SkillEntry, installed: Option<&InstalledSkill>, force: bool) -> Decision {
    let Some(installed) = installed else {
        return Decision::Install(DriftReason::NotInstalled);
    };
    if force {
        return Decision::Install(DriftReason::Forced);
    }
    if !installed.has_manifest {
        return Decision::Install(DriftReason::MissingManifest);
    }
    let Some(metadata) = &installed.metadata else {
        return Decision::Install(DriftReason::Unmanaged);
    };
    if metadata.git_ref != entry.git_ref {
        return Decision::Install(DriftReason::RefMismatch {
            installed: metadata.git_ref.clone(),
        });
    }
    match &entry.integrity {
        Some(integrity) if *integrity != metadata.integrity => Decision::Install(DriftReason::LocalEdits),
        _ => Decision::Satisfied,
    }
}

/// Outcome for one skill of a reconciliation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillReport {
    /// Skill name
    pub name: String,
    /// Terminal state reached
    pub state: SkillState,
    /// Why it was reinstalled, if it was
    pub reason: Option<DriftReason>,
    /// Lock entry was refreshed with a new ref or integrity
    pub refreshed: bool,
}

/// Per-skill results of [`ReconciliationPolicy::install_all`], in lock order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// One report per locked skill that was processed
    pub skills: Vec<SkillReport>,
}

impl ReconcileReport {
    /// Number of skills that were reinstalled
    pub fn installed_count(&self) -> usize {
        self.skills.iter().filter(|s| s.state == SkillState::Verified).count()
    }

    /// True when some lock entry was refreshed
    pub fn lock_changed(&self) -> bool {
        self.skills.iter().any(|s| s.refreshed)
    }
}

/// A reconciliation pass that stopped at a failing skill
///
/// `report` holds every skill processed up to and including the failed one,
/// whose state is [`SkillState::Failed`].
#[derive(Debug)]
pub struct ReconcileFailure {
    /// Skills processed before the pass stopped
    pub report: ReconcileReport,
    /// Cause of the failure
    pub error: SkillpinError,
}

impl fmt::Display for ReconcileFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.error.fmt(f)
    }
}

impl std::error::Error for ReconcileFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl From<SkillpinError> for ReconcileFailure {
    fn from(error: SkillpinError) -> Self {
        Self {
            report: ReconcileReport::default(),
            error,
        }
    }
}

/// A skill to install from an already available local tree
#[derive(Debug, Clone, Copy)]
pub struct InstallTarget<'a> {
    /// Skill name
    pub name: &'a str,
    /// Commit the tree is at
    pub git_ref: &'a str,
    /// Directory of the skill inside the tree, `None` for the root
    pub subpath: Option<&'a str>,
    /// Integrity the result must hash to
    pub expected: Option<&'a str>,
    /// Something is already installed under `name`
    pub replace: bool,
}

/// Decides and performs installs for locked skills
#[derive(Debug, Clone)]
pub struct ReconciliationPolicy<I> {
    resolver: SourceResolver,
    installer: I,
    skills_dir: PathBuf,
}

impl<I: Installer + Remover> ReconciliationPolicy<I> {
    /// `skills_dir` is where the installer places each skill, as `<skills_dir>/<name>`
    pub fn new(resolver: SourceResolver, installer: I, skills_dir: impl Into<PathBuf>) -> Self {
        Self {
            resolver,
            installer,
            skills_dir: skills_dir.into(),
        }
    }

    /// Resolver used for clones
    pub fn resolver(&self) -> &SourceResolver {
        &self.resolver
    }

    /// Installer capability
    pub fn installer(&self) -> &I {
        &self.installer
    }

    /// Directory skills are installed into
    pub fn skills_dir(&self) -> &Path {
        &self.skills_dir
    }

    /// Directory a skill is expected to be installed into
    pub fn installed_dir(&self, name: &str) -> PathBuf {
        self.skills_dir.join(name)
    }

    /// Decide what to do with `entry`, including a live content hash
    ///
    /// A skill that looks satisfied on record is hashed and compared with the
    /// lock's integrity, or the sidecar's when the lock has none. A mismatch
    /// or an unreadable directory counts as local edits.
    pub fn check(&self, name: &str, entry: &SkillEntry, installed: Option<&InstalledSkill>, force: bool) -> Decision {
        let decision = classify(entry, installed, force);
        let (Decision::Satisfied, Some(installed)) = (&decision, installed) else {
            debug!("Skill '{}': {:?}", name, decision);
            return decision;
        };

        let expected = entry
            .integrity
            .as_deref()
            .or(installed.metadata.as_ref().map(|m| m.integrity.as_str()));
        let Some(expected) = expected else {
            return decision;
        };

        match compute_skill_hash(&installed.disk_path) {
            Ok(actual) if actual == expected => {
                debug!("Skill '{}' is up to date", name);
                Decision::Satisfied
            }
            Ok(actual) => {
                warn!("Skill '{}' was modified on disk ({} != {})", name, actual, expected);
                Decision::Install(DriftReason::LocalEdits)
            }
            Err(e) => {
                warn!("Could not hash skill '{}': {}", name, e);
                Decision::Install(DriftReason::LocalEdits)
            }
        }
    }

    /// Install `target` from the local tree at `root`, then verify and record it
    ///
    /// Returns the integrity of the installed directory. On an integrity
    /// mismatch the sidecar is left untouched.
    pub async fn install_from(&self, root: &Path, target: &InstallTarget<'_>) -> Result<String> {
        if target.replace {
            debug!("Removing installed copy of '{}'", target.name);
            self.installer.remove(target.name).await?;
        }

        let source = root.to_string_lossy();
        self.installer
            .install(&InstallRequest {
                source: &source,
                name: target.name,
                git_ref: Some(target.git_ref),
                subpath: target.subpath,
            })
            .await?;

        let dir = self.installed_dir(target.name);
        let actual = compute_skill_hash(&dir)?;
        if let Some(expected) = target.expected {
            verify_integrity(target.name, expected, &actual)?;
        }
        write_skill_metadata(&dir, target.git_ref, &actual)?;

        info!("Installed '{}' at {}", target.name, target.git_ref);
        Ok(actual)
    }

    /// Reinstall a locked skill from a full clone at its pinned commit
    ///
    /// The lock's integrity, if any, must match. The clone is removed on
    /// every exit path.
    pub async fn reinstall(&self, name: &str, entry: &SkillEntry, replace: bool) -> Result<String> {
        let checkout = self.resolver.clone_at_ref(&entry.source, &entry.git_ref).await?;
        let target = InstallTarget {
            name,
            git_ref: &entry.git_ref,
            subpath: entry.subpath(),
            expected: entry.integrity.as_deref(),
            replace,
        };

        let result = self.install_from(checkout.path(), &target).await;
        let cleaned = checkout.cleanup();
        let integrity = result?;
        cleaned?;
        Ok(integrity)
    }

    /// Reconcile every locked skill, one at a time
    ///
    /// Entries whose integrity changed are refreshed in `lock` as soon as
    /// their install verifies. The first failure stops the pass: the failed
    /// skill is reported as [`SkillState::Failed`] and refreshes made before
    /// it stay in `lock`.
    pub async fn install_all(
        &self,
        lock: &mut Lockfile,
        installed: &[InstalledSkill],
        force: bool,
    ) -> std::result::Result<ReconcileReport, ReconcileFailure> {
        let mut report = ReconcileReport::default();
        let entries: Vec<(String, SkillEntry)> =
            lock.skills.iter().map(|(n, e)| (n.clone(), e.clone())).collect();

        for (name, entry) in entries {
            let mut state = SkillState::Unchecked;
            let current = find_installed(installed, &name);

            let decided = SkillState::decided(self.check(&name, &entry, current, force));
            transition(&name, &mut state, decided);
            let SkillState::Drifted(reason) = state.clone() else {
                report.skills.push(SkillReport {
                    name,
                    state,
                    reason: None,
                    refreshed: false,
                });
                continue;
            };

            transition(&name, &mut state, SkillState::Installing);
            info!("Installing '{}' ({})", name, reason);
            let integrity = match self.reinstall(&name, &entry, current.is_some()).await {
                Ok(integrity) => integrity,
                Err(error) => {
                    transition(&name, &mut state, SkillState::Failed);
                    warn!("Skill '{}' failed: {}", name, error);
                    report.skills.push(SkillReport {
                        name,
                        state,
                        reason: Some(reason),
                        refreshed: false,
                    });
                    return Err(ReconcileFailure { report, error });
                }
            };
            transition(&name, &mut state, SkillState::Verified);

            let refreshed = entry.integrity.as_deref() != Some(integrity.as_str());
            if refreshed {
                lock.insert(name.clone(), entry.with_integrity(integrity));
            }
            report.skills.push(SkillReport {
                name,
                state,
                reason: Some(reason),
                refreshed,
            });
        }

        info!(
            "Reconciled {} skills, {} installed",
            report.skills.len(),
            report.installed_count()
        );
        Ok(report)
    }
}

fn transition(name: &str, state: &mut SkillState, next: SkillState) {
    debug!("Skill '{}': {} -> {}", name, state, next);
    *state = next;
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use skillpin_types::{SkillMetadata, MANIFEST_FILE};
    use std::fs;
    use std::sync::Mutex;

    fn sha(c: char) -> String {
        c.to_string().repeat(40)
    }

    fn entry(git_ref: &str, integrity: Option<&str>) -> SkillEntry {
        let entry = SkillEntry::new("https://github.com/a/b.git", "skills/pdf", git_ref);
        match integrity {
            Some(i) => entry.with_integrity(i),
            None => entry,
        }
    }

    fn installed(metadata: Option<(&str, &str)>, has_manifest: bool) -> InstalledSkill {
        InstalledSkill {
            name: "pdf".into(),
            disk_path: PathBuf::from("/skills/pdf"),
            has_manifest,
            metadata: metadata.map(|(r, i)| SkillMetadata {
                git_ref: r.into(),
                integrity: i.into(),
            }),
        }
    }

    #[test]
    fn test_classify_decision_table() {
        let a = sha('a');
        let b = sha('b');

        assert_eq!(
            classify(&entry(&a, None), None, false),
            Decision::Install(DriftReason::NotInstalled)
        );
        assert_eq!(
            classify(&entry(&a, None), Some(&installed(None, true)), false),
            Decision::Install(DriftReason::Unmanaged)
        );
        assert_eq!(
            classify(&entry(&a, None), Some(&installed(Some((&b, "sha256:1")), true)), false),
            Decision::Install(DriftReason::RefMismatch { installed: b.clone() })
        );
        assert_eq!(
            classify(
                &entry(&a, Some("sha256:2")),
                Some(&installed(Some((&a, "sha256:1")), true)),
                false
            ),
            Decision::Install(DriftReason::LocalEdits)
        );
        assert_eq!(
            classify(
                &entry(&a, Some("sha256:1")),
                Some(&installed(Some((&a, "sha256:1")), true)),
                false
            ),
            Decision::Satisfied
        );
        assert_eq!(
            classify(&entry(&a, None), Some(&installed(Some((&a, "sha256:1")), true)), false),
            Decision::Satisfied
        );
        assert_eq!(
            classify(
                &entry(&a, Some("sha256:1")),
                Some(&installed(Some((&a, "sha256:1")), true)),
                true
            ),
            Decision::Install(DriftReason::Forced)
        );
        assert_eq!(
            classify(&entry(&a, None), Some(&installed(Some((&a, "sha256:1")), false)), false),
            Decision::Install(DriftReason::MissingManifest)
        );
    }

    #[test]
    fn test_state_transitions() {
        assert!(!SkillState::Unchecked.is_terminal());
        assert!(!SkillState::Installing.is_terminal());
        assert!(!SkillState::Drifted(DriftReason::Forced).is_terminal());
        assert!(SkillState::decided(Decision::Satisfied).is_terminal());
        assert_eq!(
            SkillState::decided(Decision::Install(DriftReason::Unmanaged)),
            SkillState::Drifted(DriftReason::Unmanaged)
        );
        assert!(SkillState::Verified.is_terminal());
        assert!(SkillState::Failed.is_terminal());
    }

    /// Installer that copies `<source>/<subpath>` into `<skills_dir>/<name>`
    struct CopyInstaller {
        skills_dir: PathBuf,
        extra_file: Option<(&'static str, &'static str)>,
        calls: Mutex<Vec<String>>,
    }

    impl CopyInstaller {
        fn new(skills_dir: &Path) -> Self {
            Self {
                skills_dir: skills_dir.to_path_buf(),
                extra_file: None,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    fn copy_dir(from: &Path, to: &Path) {
        fs::create_dir_all(to).unwrap();
        for item in fs::read_dir(from).unwrap() {
            let item = item.unwrap();
            let target = to.join(item.file_name());
            if item.file_type().unwrap().is_dir() {
                copy_dir(&item.path(), &target);
            } else {
                fs::copy(item.path(), target).unwrap();
            }
        }
    }

    impl Installer for CopyInstaller {
        async fn install(&self, request: &InstallRequest<'_>) -> Result<()> {
            self.calls.lock().unwrap().push(format!("install {}", request.name));
            let from = match request.subpath {
                Some(sub) => Path::new(request.source).join(sub),
                None => PathBuf::from(request.source),
            };
            let to = self.skills_dir.join(request.name);
            copy_dir(&from, &to);
            if let Some((name, contents)) = self.extra_file {
                fs::write(to.join(name), contents).unwrap();
            }
            Ok(())
        }
    }

    impl Remover for CopyInstaller {
        async fn remove(&self, name: &str) -> Result<()> {
            self.calls.lock().unwrap().push(format!("remove {name}"));
            fs::remove_dir_all(self.skills_dir.join(name))?;
            Ok(())
        }
    }

    fn source_tree(root: &Path) {
        let skill = root.join("skills/pdf");
        fs::create_dir_all(&skill).unwrap();
        fs::write(skill.join(MANIFEST_FILE), "---\nname: pdf\n---\n").unwrap();
        fs::write(skill.join("script.py"), "print('pdf')\n").unwrap();
    }

    #[tokio::test]
    async fn test_install_from_writes_sidecar() {
        let src = tempfile::tempdir().unwrap();
        let skills = tempfile::tempdir().unwrap();
        source_tree(src.path());

        let policy = ReconciliationPolicy::new(
            SourceResolver::default(),
            CopyInstaller::new(skills.path()),
            skills.path(),
        );
        let a = sha('a');
        let target = InstallTarget {
            name: "pdf",
            git_ref: &a,
            subpath: Some("skills/pdf"),
            expected: None,
            replace: false,
        };
        let integrity = policy.install_from(src.path(), &target).await.unwrap();

        let dir = skills.path().join("pdf");
        assert_eq!(integrity, compute_skill_hash(&dir).unwrap());
        let metadata = skillpin_integrity::read_skill_metadata(&dir).unwrap();
        assert_eq!(metadata.git_ref, a);
        assert_eq!(metadata.integrity, integrity);
    }

    #[tokio::test]
    async fn test_install_from_integrity_mismatch_leaves_no_sidecar() {
        let src = tempfile::tempdir().unwrap();
        let skills = tempfile::tempdir().unwrap();
        source_tree(src.path());

        let mut installer = CopyInstaller::new(skills.path());
        installer.extra_file = Some(("injected.txt", "surprise"));
        let policy = ReconciliationPolicy::new(SourceResolver::default(), installer, skills.path());

        let a = sha('a');
        let expected = format!("sha256:{}", "0".repeat(64));
        let target = InstallTarget {
            name: "pdf",
            git_ref: &a,
            subpath: Some("skills/pdf"),
            expected: Some(&expected),
            replace: false,
        };
        let err = policy.install_from(src.path(), &target).await.unwrap_err();
        match err {
            SkillpinError::IntegrityMismatch { skill, expected: e, .. } => {
                assert_eq!(skill, "pdf");
                assert_eq!(e, expected);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(skillpin_integrity::read_skill_metadata(&skills.path().join("pdf")).is_none());
    }

    #[tokio::test]
    async fn test_install_from_replaces_existing_copy() {
        let src = tempfile::tempdir().unwrap();
        let skills = tempfile::tempdir().unwrap();
        source_tree(src.path());
        fs::create_dir_all(skills.path().join("pdf")).unwrap();
        fs::write(skills.path().join("pdf/stale.txt"), "old").unwrap();

        let policy = ReconciliationPolicy::new(
            SourceResolver::default(),
            CopyInstaller::new(skills.path()),
            skills.path(),
        );
        let a = sha('a');
        let target = InstallTarget {
            name: "pdf",
            git_ref: &a,
            subpath: Some("skills/pdf"),
            expected: None,
            replace: true,
        };
        policy.install_from(src.path(), &target).await.unwrap();

        assert!(!skills.path().join("pdf/stale.txt").exists());
        let calls = policy.installer().calls.lock().unwrap().clone();
        assert_eq!(calls, vec!["remove pdf", "install pdf"]);
    }

    #[tokio::test]
    async fn test_check_detects_live_edits() {
        let src = tempfile::tempdir().unwrap();
        let skills = tempfile::tempdir().unwrap();
        source_tree(src.path());

        let policy = ReconciliationPolicy::new(
            SourceResolver::default(),
            CopyInstaller::new(skills.path()),
            skills.path(),
        );
        let a = sha('a');
        let target = InstallTarget {
            name: "pdf",
            git_ref: &a,
            subpath: Some("skills/pdf"),
            expected: None,
            replace: false,
        };
        let integrity = policy.install_from(src.path(), &target).await.unwrap();

        let dir = skills.path().join("pdf");
        let on_disk = InstalledSkill {
            name: "pdf".into(),
            disk_path: dir.clone(),
            has_manifest: true,
            metadata: skillpin_integrity::read_skill_metadata(&dir),
        };
        let locked = entry(&a, None);
        assert_eq!(policy.check("pdf", &locked, Some(&on_disk), false), Decision::Satisfied);

        fs::write(dir.join("script.py"), "print('edited')\n").unwrap();
        assert_eq!(
            policy.check("pdf", &locked, Some(&on_disk), false),
            Decision::Install(DriftReason::LocalEdits)
        );

        let pinned = entry(&a, Some(&integrity));
        assert_eq!(
            policy.check("pdf", &pinned, Some(&on_disk), false),
            Decision::Install(DriftReason::LocalEdits)
        );
    }

    #[tokio::test]
    async fn test_install_all_skips_satisfied_skills() {
        let skills = tempfile::tempdir().unwrap();
        let dir = skills.path().join("pdf");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(MANIFEST_FILE), "x").unwrap();
        let integrity = compute_skill_hash(&dir).unwrap();
        let a = sha('a');
        write_skill_metadata(&dir, &a, &integrity).unwrap();

        let policy = ReconciliationPolicy::new(
            SourceResolver::new("definitely-not-a-git-binary"),
            CopyInstaller::new(skills.path()),
            skills.path(),
        );
        let mut lock = Lockfile::new();
        lock.insert("pdf", entry(&a, Some(&integrity)));
        let before = lock.clone();

        let on_disk = vec![InstalledSkill {
            name: "pdf".into(),
            disk_path: dir.clone(),
            has_manifest: true,
            metadata: skillpin_integrity::read_skill_metadata(&dir),
        }];
        let report = policy.install_all(&mut lock, &on_disk, false).await.unwrap();

        assert_eq!(lock, before);
        assert_eq!(report.skills.len(), 1);
        assert_eq!(report.skills[0].state, SkillState::Satisfied);
        assert!(!report.lock_changed());
        assert!(policy.installer().calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_install_all_stops_at_first_failure() {
        let skills = tempfile::tempdir().unwrap();
        let policy = ReconciliationPolicy::new(
            SourceResolver::new("definitely-not-a-git-binary"),
            CopyInstaller::new(skills.path()),
            skills.path(),
        );
        let mut lock = Lockfile::new();
        lock.insert("pdf", entry(&sha('a'), None));
        lock.insert("xlsx", entry(&sha('b'), None));

        let before = lock.clone();

        let failure = policy.install_all(&mut lock, &[], false).await.unwrap_err();
        assert!(matches!(failure.error, SkillpinError::Resolution { .. }));
        assert_eq!(
            failure.report.skills,
            vec![SkillReport {
                name: "pdf".into(),
                state: SkillState::Failed,
                reason: Some(DriftReason::NotInstalled),
                refreshed: false,
            }]
        );
        assert_eq!(failure.report.installed_count(), 0);
        assert_eq!(lock, before);
        assert!(policy.installer().calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_install_all_reports_skills_before_failure() {
        let skills = tempfile::tempdir().unwrap();
        let dir = skills.path().join("docx");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(MANIFEST_FILE), "x").unwrap();
        let integrity = compute_skill_hash(&dir).unwrap();
        let a = sha('a');
        write_skill_metadata(&dir, &a, &integrity).unwrap();

        let policy = ReconciliationPolicy::new(
            SourceResolver::new("definitely-not-a-git-binary"),
            CopyInstaller::new(skills.path()),
            skills.path(),
        );
        let mut lock = Lockfile::new();
        lock.insert("docx", entry(&a, Some(&integrity)));
        lock.insert("pdf", entry(&a, None));
        lock.insert("xlsx", entry(&a, None));

        let on_disk = vec![InstalledSkill {
            name: "docx".into(),
            disk_path: dir.clone(),
            has_manifest: true,
            metadata: skillpin_integrity::read_skill_metadata(&dir),
        }];
        let failure = policy.install_all(&mut lock, &on_disk, false).await.unwrap_err();

        let states: Vec<_> = failure
            .report
            .skills
            .iter()
            .map(|s| (s.name.as_str(), s.state.clone()))
            .collect();
        assert_eq!(
            states,
            vec![("docx", SkillState::Satisfied), ("pdf", SkillState::Failed)]
        );
        assert!(failure.to_string().contains("definitely-not-a-git-binary"));
    }
}
