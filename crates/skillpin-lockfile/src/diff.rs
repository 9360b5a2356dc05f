//! Differences between two lock states

use skillpin_types::Lockfile;

/// Skill names that differ between two lockfiles, each list sorted by name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockfileDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    /// Present in both with a different `ref`
    pub changed: Vec<String>,
}

impl LockfileDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}

/// Compare two lockfiles
///
/// Only a `ref` change counts as changed; edits to `source`, `path` or
/// `integrity` alone are ignored.
pub fn diff(old: &Lockfile, new: &Lockfile) -> LockfileDiff {
    let added = new
        .skills
        .keys()
        .filter(|name| !old.skills.contains_key(*name))
        .cloned()
        .collect();

    let removed = old
        .skills
        .keys()
        .filter(|name| !new.skills.contains_key(*name))
        .cloned()
        .collect();

    let changed = old
        .skills
        .iter()
        .filter_map(|(name, before)| {
            let after = new.skills.get(name)?;
            (after.git_ref != before.git_ref).then(|| name.clone())
        })
        .collect();

    LockfileDiff {
        added,
        removed,
        changed,
    }
}
