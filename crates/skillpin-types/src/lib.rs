//! Skillpin Types - Core types shared by the skillpin crates
//!
//! This module defines the lock state, the ephemeral records produced while
//! resolving and scanning skills, and the error taxonomy.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

pub mod error;
pub mod walk;

pub use error::{Result, SkillpinError};

/// Marker file whose presence defines a directory as a skill
pub const MANIFEST_FILE: &str = "SKILL.md";

/// Sidecar file written inside every installed skill directory
pub const METADATA_FILE: &str = ".skillpin.json";

/// Name and path used for a skill whose manifest sits at the repository root
pub const ROOT_PATH: &str = ".";

/// The only lockfile format version understood
pub const LOCKFILE_VERSION: u32 = 1;

/// A locked skill: where it comes from and the exact commit it is pinned to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillEntry {
    /// Canonical clone URL
    pub source: String,
    /// Slash-separated directory of the manifest inside the source repo
    pub path: String,
    /// Full 40-character lowercase commit SHA
    #[serde(rename = "ref")]
    pub git_ref: String,
    /// `sha256:<hex>` content hash of the installed directory at `git_ref`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integrity: Option<String>,
}

impl SkillEntry {
    pub fn new(source: impl Into<String>, path: impl Into<String>, git_ref: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            path: path.into(),
            git_ref: git_ref.into(),
            integrity: None,
        }
    }

    pub fn with_integrity(mut self, integrity: impl Into<String>) -> Self {
        self.integrity = Some(integrity.into());
        self
    }

    /// Subpath to hand to the installer, `None` for a root-level skill
    pub fn subpath(&self) -> Option<&str> {
        if self.path == ROOT_PATH || self.path.is_empty() {
            None
        } else {
            Some(&self.path)
        }
    }
}

/// The lock state: every skill name mapped to its pinned entry
///
/// Skills live in a `BTreeMap`, so iteration and serialization are always
/// sorted by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lockfile {
    pub version: u32,
    pub skills: BTreeMap<String, SkillEntry>,
}

impl Lockfile {
    pub fn new() -> Self {
        Self {
            version: LOCKFILE_VERSION,
            skills: BTreeMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&SkillEntry> {
        self.skills.get(name)
    }

    /// Insert or replace an entry, returning the previous one
    pub fn insert(&mut self, name: impl Into<String>, entry: SkillEntry) -> Option<SkillEntry> {
        self.skills.insert(name.into(), entry)
    }

    pub fn remove(&mut self, name: &str) -> Option<SkillEntry> {
        self.skills.remove(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.skills.keys()
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }
}

impl Default for Lockfile {
    fn default() -> Self {
        Self::new()
    }
}

/// A manifest discovered inside a checkout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedSkill {
    pub name: String,
    pub source: String,
    pub path: String,
    #[serde(rename = "ref")]
    pub git_ref: String,
}

impl ResolvedSkill {
    /// Lock entry pinning this skill, without integrity yet
    pub fn to_entry(&self) -> SkillEntry {
        SkillEntry::new(&self.source, &self.path, &self.git_ref)
    }
}

/// What was actually installed, as recorded in the sidecar file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillMetadata {
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub integrity: String,
}

/// A skill found on disk by the scanner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstalledSkill {
    pub name: String,
    pub disk_path: PathBuf,
    pub has_manifest: bool,
    #[serde(default)]
    pub metadata: Option<SkillMetadata>,
}

/// Outcome of reading a file that may be absent or unreadable
#[derive(Debug)]
pub enum Loaded<T> {
    /// Nothing exists at the path
    NotFound,
    /// Something exists but could not be turned into a `T`
    Malformed(SkillpinError),
    Found(T),
}

impl<T> Loaded<T> {
    /// Absent and malformed both collapse to `None`
    pub fn ok(self) -> Option<T> {
        match self {
            Loaded::Found(value) => Some(value),
            Loaded::NotFound | Loaded::Malformed(_) => None,
        }
    }

    /// Absent becomes `None`, malformed becomes the error
    pub fn into_result(self) -> Result<Option<T>> {
        match self {
            Loaded::NotFound => Ok(None),
            Loaded::Malformed(e) => Err(e),
            Loaded::Found(value) => Ok(Some(value)),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Loaded::NotFound)
    }
}
