//! Deterministic recursive file traversal
//!
//! Entries are visited in ascending byte order of their names at every level,
//! and any file or directory whose name matches the exclusion predicate is
//! skipped together with everything beneath it.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::Result;

/// A regular file found by [`walk_files`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkedFile {
    /// Absolute (or root-joined) path to the file
    pub path: PathBuf,
    /// Path relative to the walk root, always with `/` separators
    pub relative: String,
}

/// Collect every regular file under `root` in deterministic order
///
/// The root itself is never tested against `exclude`. Symlinks are not
/// followed and are not reported.
pub fn walk_files<F>(root: &Path, exclude: F) -> Result<Vec<WalkedFile>>
where
    F: Fn(&str) -> bool,
{
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0 || !exclude(&entry.file_name().to_string_lossy())
        });

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = to_slash_path(entry.path().strip_prefix(root).unwrap_or(entry.path()));
        files.push(WalkedFile {
            path: entry.into_path(),
            relative,
        });
    }

    Ok(files)
}

/// Predicate excluding any entry whose name is in `names`
pub fn excluding<'a>(names: &'a [&'a str]) -> impl Fn(&str) -> bool + 'a {
    move |name| names.contains(&name)
}

/// Render a relative path with forward slashes regardless of host separator
pub fn to_slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
