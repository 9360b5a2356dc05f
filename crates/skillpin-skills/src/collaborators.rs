//! External collaborators: the installer, the remover and the scanner
//!
//! Skillpin never copies skill files itself. It hands a resolved local path
//! to an installer, asks a remover to delete an installed skill, and asks a
//! scanner what is currently installed.

#![allow(async_fn_in_trait)]

use skillpin_types::{InstalledSkill, Result};

/// Everything an installer needs to materialize one skill
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstallRequest<'a> {
    /// Local checkout path or source to install from
    pub source: &'a str,
    /// Name the skill is installed under
    pub name: &'a str,
    /// Commit the source is pinned to, if known
    pub git_ref: Option<&'a str>,
    /// Directory of the skill inside `source`, `None` for the root
    pub subpath: Option<&'a str>,
}

/// Materializes a skill's files
pub trait Installer {
    /// Install one skill, failing if the installer reports failure
    async fn install(&self, request: &InstallRequest<'_>) -> Result<()>;
}

/// Deletes an installed skill's files
pub trait Remover {
    /// Remove the skill installed under `name`
    async fn remove(&self, name: &str) -> Result<()>;
}

/// Enumerates installed skills
pub trait Scanner {
    /// Every skill currently installed
    async fn scan(&self) -> Result<Vec<InstalledSkill>>;
}

/// Find `name` in a scan result
pub fn find_installed<'a>(installed: &'a [InstalledSkill], name: &str) -> Option<&'a InstalledSkill> {
    installed.iter().find(|skill| skill.name == name)
}
