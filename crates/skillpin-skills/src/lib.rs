//! Skillpin Skills - reconciliation of locked skills
//!
//! Decides, for every skill in the lockfile, whether what is installed on disk
//! already satisfies the lock, and drives the install-then-verify sequence
//! when it does not.
//!
//! ## Flow
//!
//! 1. The lockfile is read through [`skillpin_lockfile::LockfileStore`]
//! 2. A [`Scanner`] reports what is installed
//! 3. [`ReconciliationPolicy`] classifies each entry and, for drifted ones,
//!    clones the pinned commit, runs the [`Installer`], hashes the result and
//!    writes the sidecar
//!
//! Installing files is always delegated; [`CommandInstaller`] is the
//! executable-backed capability and can only be obtained by probing.

#![deny(unsafe_code, dead_code, unused_imports, unused_variables, missing_docs)]

pub mod collaborators;
pub mod command;
pub mod manager;
pub mod policy;

pub use collaborators::{find_installed, InstallRequest, Installer, Remover, Scanner};
pub use command::{CommandConfig, CommandInstaller, CommandLine, CommandScanner, DirectoryScanner};
pub use manager::{AddOptions, SkillManager, SkillStatus};
pub use policy::{
    classify, Decision, DriftReason, InstallTarget, ReconcileFailure, ReconcileReport, ReconciliationPolicy,
    SkillReport, SkillState,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        AddOptions, CommandConfig, CommandInstaller, Decision, Installer, ReconciliationPolicy, Remover, Scanner,
        SkillManager,
    };
}
