//! Per-skill sidecar recording what was actually installed

use skillpin_types::{Loaded, Result, SkillMetadata, METADATA_FILE};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

/// Persist `{ref, integrity}` as the sidecar inside `dir`
pub fn write_skill_metadata(dir: &Path, git_ref: &str, integrity: &str) -> Result<()> {
    let metadata = SkillMetadata {
        git_ref: git_ref.to_string(),
        integrity: integrity.to_string(),
    };
    let mut data = serde_json::to_string_pretty(&metadata)?;
    data.push('\n');
    fs::write(dir.join(METADATA_FILE), data)?;

    debug!("Recorded {} / {} in {:?}", git_ref, integrity, dir);
    Ok(())
}

/// Read and classify the sidecar inside `dir`
pub fn load_skill_metadata(dir: &Path) -> Loaded<SkillMetadata> {
    let content = match fs::read_to_string(dir.join(METADATA_FILE)) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Loaded::NotFound,
        Err(e) => return Loaded::Malformed(e.into()),
    };

    match serde_json::from_str::<SkillMetadata>(&content) {
        Ok(metadata) => Loaded::Found(metadata),
        Err(e) => Loaded::Malformed(e.into()),
    }
}

/// Read the sidecar inside `dir`
///
/// Never fails: an absent, unparsable or incomplete sidecar yields `None`,
/// meaning the skill's provenance cannot be verified.
pub fn read_skill_metadata(dir: &Path) -> Option<SkillMetadata> {
    match load_skill_metadata(dir) {
        Loaded::Found(metadata) => Some(metadata),
        Loaded::NotFound => None,
        Loaded::Malformed(e) => {
            debug!("Ignoring unreadable sidecar in {:?}: {}", dir, e);
            None
        }
    }
}
