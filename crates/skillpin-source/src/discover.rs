//! Manifest discovery inside a checkout

use skillpin_types::walk::{excluding, walk_files};
use skillpin_types::{ResolvedSkill, Result, SkillpinError, MANIFEST_FILE, ROOT_PATH};
use std::path::Path;

/// Directories never searched for manifests
pub const DISCOVERY_EXCLUSIONS: [&str; 2] = [".git", "node_modules"];

/// Location of one manifest-bearing directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestLocation {
    /// Last segment of the directory, `.` for the root
    pub name: String,
    /// Directory relative to the checkout root with `/` separators, `.` for the root
    pub path: String,
}

/// Find every directory under `root` that directly contains the manifest
///
/// The search does not stop at the first hit: a repository may host several
/// skills at different depths, including one at its root.
pub fn discover_manifests(root: &Path) -> Result<Vec<ManifestLocation>> {
    let files = walk_files(root, excluding(&DISCOVERY_EXCLUSIONS))?;

    let locations = files
        .iter()
        .filter_map(|file| {
            let dir = match file.relative.rsplit_once('/') {
                Some((dir, name)) if name == MANIFEST_FILE => dir,
                None if file.relative == MANIFEST_FILE => ROOT_PATH,
                _ => return None,
            };
            let name = dir.rsplit('/').next().unwrap_or(dir);
            Some(ManifestLocation {
                name: name.to_string(),
                path: dir.to_string(),
            })
        })
        .collect();

    Ok(locations)
}

/// Pick one skill out of the discovered set
///
/// With a name, the skill of that name; without one, the only skill if there
/// is exactly one. Failures list what was discovered.
pub fn select_skill<'a>(skills: &'a [ResolvedSkill], name: Option<&str>) -> Result<&'a ResolvedSkill> {
    let available = || skills.iter().map(|s| s.name.clone()).collect::<Vec<_>>();

    match name {
        Some(name) => skills
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| SkillpinError::Resolution {
                message: format!("Skill '{name}' not found in repository"),
                available: available(),
            }),
        None => match skills {
            [only] => Ok(only),
            [] => Err(SkillpinError::resolution(format!(
                "No {MANIFEST_FILE} found in repository"
            ))),
            _ => Err(SkillpinError::Resolution {
                message: "Repository contains several skills; choose one by name".into(),
                available: available(),
            }),
        },
    }
}
