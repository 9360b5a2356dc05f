//! Skillpin source resolution
//!
//! Normalizes source identifiers, clones repositories with the `git`
//! executable, resolves commits and discovers skill manifests.
//!
//! ## Clones
//!
//! - [`SourceResolver::resolve_repo`] makes a shallow clone, enough to read a
//!   branch tip.
//! - [`SourceResolver::clone_at_ref`] makes a full clone, because a shallow
//!   clone cannot reliably fetch an arbitrary historical commit.
//!
//! Both return a [`Checkout`] that removes itself when dropped.

#![deny(unsafe_code, unused_imports, unused_variables, missing_docs)]

pub mod checkout;
pub mod discover;
pub mod expand;
mod git;

pub use checkout::{cleanup_clone, Checkout};
pub use discover::{discover_manifests, select_skill, ManifestLocation};
pub use expand::{expand_home, expand_source, is_local_source};

use skillpin_types::{ResolvedSkill, Result, SkillpinError};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default git executable
pub const DEFAULT_GIT: &str = "git";

/// Options for [`SourceResolver::resolve_repo`]
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    /// Branch to request from the remote instead of its default
    pub branch: Option<String>,
}

impl ResolveOptions {
    /// Request a specific branch
    pub fn branch(branch: impl Into<String>) -> Self {
        Self {
            branch: Some(branch.into()),
        }
    }
}

/// Resolves sources to local checkouts via the `git` executable
#[derive(Debug, Clone)]
pub struct SourceResolver {
    git: String,
    checkout_dir: Option<PathBuf>,
}

impl SourceResolver {
    /// Create a resolver using the given git program
    pub fn new(git: impl Into<String>) -> Self {
        Self {
            git: git.into(),
            checkout_dir: None,
        }
    }

    /// Place checkouts under `dir` instead of the system temporary directory
    pub fn with_checkout_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.checkout_dir = Some(dir.into());
        self
    }

    /// Directory checkouts are created in, if not the system default
    pub fn checkout_dir(&self) -> Option<&Path> {
        self.checkout_dir.as_deref()
    }

    /// The git program in use
    pub fn git_program(&self) -> &str {
        &self.git
    }

    /// Check that the git program can be executed
    pub async fn is_available(&self) -> bool {
        matches!(git::run(&self.git, ["--version"], None).await, Ok(Ok(_)))
    }

    /// Shallow-clone `source` into a fresh temporary directory
    ///
    /// # Errors
    /// Returns a resolution error if the clone fails
    pub async fn resolve_repo(&self, source: &str, options: &ResolveOptions) -> Result<Checkout> {
        let url = expand_source(source);
        let checkout = Checkout::create(self.checkout_dir())?;

        let mut args = vec!["clone".to_string(), "--quiet".into(), "--depth".into(), "1".into()];
        if let Some(branch) = &options.branch {
            args.push("--branch".into());
            args.push(branch.clone());
        }
        args.push(url.clone());
        args.push(checkout.path().to_string_lossy().into_owned());

        git::run_checked(&self.git, &args, None).await?;

        info!("Cloned {} (shallow)", url);
        Ok(checkout)
    }

    /// Fully clone `source` and check out the exact commit `git_ref`
    ///
    /// # Errors
    /// Returns a resolution error if the clone or checkout fails, or if HEAD
    /// does not end up at `git_ref`
    pub async fn clone_at_ref(&self, source: &str, git_ref: &str) -> Result<Checkout> {
        let url = expand_source(source);
        let checkout = Checkout::create(self.checkout_dir())?;
        let dir = checkout.path().to_string_lossy().into_owned();

        git::run_checked(
            &self.git,
            ["clone", "--quiet", "--no-checkout", url.as_str(), dir.as_str()],
            None,
        )
        .await?;
        git::run_checked(
            &self.git,
            ["checkout", "--quiet", "--detach", git_ref],
            Some(checkout.path()),
        )
        .await?;

        let head = self.resolve_ref(checkout.path()).await?;
        if head != git_ref {
            return Err(SkillpinError::resolution(format!(
                "Checkout of {url} landed on {head}, expected {git_ref}"
            )));
        }

        info!("Cloned {} at {}", url, git_ref);
        Ok(checkout)
    }

    /// Return the root of the work tree containing `dir`
    ///
    /// # Errors
    /// Returns a resolution error if `dir` is not inside a git work tree
    pub async fn toplevel(&self, dir: &Path) -> Result<PathBuf> {
        let root = git::run_checked(&self.git, ["rev-parse", "--show-toplevel"], Some(dir)).await?;
        Ok(std::fs::canonicalize(root)?)
    }

    /// Return the commit HEAD points at
    ///
    /// # Errors
    /// Returns [`SkillpinError::NotFound`] when the checkout has no commits
    pub async fn resolve_ref(&self, checkout: &Path) -> Result<String> {
        match git::run(&self.git, ["log", "-1", "--format=%H"], Some(checkout)).await? {
            Ok(sha) if !sha.is_empty() => Ok(sha),
            Ok(_) => Err(SkillpinError::NotFound(format!(
                "No commits in checkout {}",
                checkout.display()
            ))),
            Err(failure) if checkout.join(".git").exists() => {
                debug!("git log failed: {}", failure.stderr);
                Err(SkillpinError::NotFound(format!(
                    "No commits in checkout {}",
                    checkout.display()
                )))
            }
            Err(failure) => Err(failure.into_error()),
        }
    }

    /// Find every skill in a checkout, each carrying the checkout's HEAD
    pub async fn find_skills(&self, checkout: &Path, source: &str) -> Result<Vec<ResolvedSkill>> {
        let git_ref = self.resolve_ref(checkout).await?;
        let skills: Vec<_> = discover_manifests(checkout)?
            .into_iter()
            .map(|location| ResolvedSkill {
                name: location.name,
                source: source.to_string(),
                path: location.path,
                git_ref: git_ref.clone(),
            })
            .collect();

        debug!("Found {} skills in {}", skills.len(), source);
        Ok(skills)
    }
}

impl Default for SourceResolver {
    fn default() -> Self {
        Self::new(DEFAULT_GIT)
    }
}
