//! Deterministic content hashing of skill directories

use sha2::{Digest, Sha256};
use skillpin_types::walk::{excluding, walk_files};
use skillpin_types::{Result, SkillpinError, METADATA_FILE};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Prefix of every integrity value
pub const INTEGRITY_PREFIX: &str = "sha256:";

/// Names left out of the content hash
pub const HASH_EXCLUSIONS: [&str; 1] = [METADATA_FILE];

/// Hash every regular file under `dir` into `sha256:<hex>`
///
/// Files are fed in sorted walk order. Each one is framed as its
/// `/`-separated relative path, a NUL byte, its length as a big-endian `u64`
/// and then its raw bytes, so no two trees share an input stream.
/// Directories contribute only through their files and the sidecar file is
/// skipped, so rewriting the sidecar never changes the hash.
pub fn compute_skill_hash(dir: &Path) -> Result<String> {
    let mut hasher = Sha256::new();
    let files = walk_files(dir, excluding(&HASH_EXCLUSIONS))?;

    for file in &files {
        let content = fs::read(&file.path)?;
        hasher.update(file.relative.as_bytes());
        hasher.update([0u8]);
        hasher.update((content.len() as u64).to_be_bytes());
        hasher.update(&content);
    }

    let integrity = format!("{INTEGRITY_PREFIX}{}", hex::encode(hasher.finalize()));
    debug!("Hashed {} files in {:?}: {}", files.len(), dir, integrity);
    Ok(integrity)
}

/// True when `value` looks like `sha256:` followed by 64 lowercase hex digits
pub fn is_integrity_hash(value: &str) -> bool {
    value.strip_prefix(INTEGRITY_PREFIX).is_some_and(|hex| {
        hex.len() == 64 && hex.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    })
}

/// Compare a freshly computed hash with the pinned one
///
/// # Errors
/// Returns [`SkillpinError::IntegrityMismatch`] when they differ
pub fn verify_integrity(skill: &str, expected: &str, actual: &str) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(SkillpinError::IntegrityMismatch {
            skill: skill.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        })
    }
}
