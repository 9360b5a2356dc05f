//! Lockfile persistence
//!
//! Reads, validates, writes and diffs `skills.lock.json`. The on-disk form is
//! byte-stable: skills sorted by name, 2-space indentation and exactly one
//! trailing newline.

use skillpin_types::{Loaded, Lockfile, Result, SkillpinError};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub mod diff;
pub mod validate;

pub use diff::{diff, LockfileDiff};
pub use validate::{is_commit_sha, validate};

/// Default lockfile name, relative to the working directory
pub const DEFAULT_LOCKFILE: &str = "skills.lock.json";

/// Lockfile storage bound to a single path
#[derive(Debug, Clone)]
pub struct LockfileStore {
    path: PathBuf,
}

impl LockfileStore {
    /// Create a store for the lockfile at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the lockfile, distinguishing absent from malformed
    pub fn load(&self) -> Loaded<Lockfile> {
        load(&self.path)
    }

    /// Read the lockfile; `None` when no file exists
    ///
    /// # Errors
    /// Fails with a parse error for invalid JSON and a validation error for
    /// schema violations
    pub fn read(&self) -> Result<Option<Lockfile>> {
        read(&self.path)
    }

    /// Read the lockfile, starting from an empty one when absent
    pub fn read_or_default(&self) -> Result<Lockfile> {
        Ok(self.read()?.unwrap_or_default())
    }

    /// Validate and persist `lockfile`
    pub fn write(&self, lockfile: &Lockfile) -> Result<()> {
        write(lockfile, &self.path)
    }
}

/// Read and classify the lockfile at `path`
pub fn load(path: &Path) -> Loaded<Lockfile> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Loaded::NotFound,
        Err(e) => return Loaded::Malformed(e.into()),
    };

    let parsed = serde_json::from_str::<serde_json::Value>(&content)
        .map_err(SkillpinError::from)
        .and_then(|value| validate::parse(&value));

    match parsed {
        Ok(lockfile) => Loaded::Found(lockfile),
        Err(e) => Loaded::Malformed(e),
    }
}

/// Read the lockfile at `path`; `None` when no file exists
pub fn read(path: &Path) -> Result<Option<Lockfile>> {
    let lockfile = load(path).into_result()?;
    if let Some(lockfile) = &lockfile {
        debug!("Loaded lockfile {:?} with {} skills", path, lockfile.len());
    }
    Ok(lockfile)
}

/// Render `lockfile` in its canonical on-disk form
///
/// # Errors
/// Validation runs first, so an invalid in-memory lockfile is never rendered
pub fn to_canonical_string(lockfile: &Lockfile) -> Result<String> {
    validate(&serde_json::to_value(lockfile)?)?;

    // `skills` is a BTreeMap, so the key order is already ascending.
    let mut out = serde_json::to_string_pretty(lockfile)?;
    out.push('\n');
    Ok(out)
}

/// Validate and atomically write `lockfile` to `path`
pub fn write(lockfile: &Lockfile, path: &Path) -> Result<()> {
    let data = to_canonical_string(lockfile)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, data)?;
    fs::rename(&tmp, path)?;

    info!("Wrote lockfile {:?} ({} skills)", path, lockfile.len());
    Ok(())
}
