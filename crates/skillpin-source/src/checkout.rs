//! Scoped temporary checkouts

use skillpin_types::Result;
use std::io::ErrorKind;
use std::path::Path;
use tempfile::TempDir;
use tracing::{debug, warn};

const CHECKOUT_PREFIX: &str = "skillpin-";

/// A clone living in its own temporary directory
///
/// The directory is removed when the checkout is dropped, so every exit path
/// of the code that created it cleans up. Call [`Checkout::cleanup`] to
/// observe removal errors instead of ignoring them.
#[derive(Debug)]
pub struct Checkout {
    dir: TempDir,
}

impl Checkout {
    /// Create a fresh, empty checkout directory under `parent`, or under the
    /// system temporary directory when none is given
    pub(crate) fn create(parent: Option<&Path>) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(CHECKOUT_PREFIX);
        let dir = match parent {
            Some(parent) => {
                std::fs::create_dir_all(parent)?;
                builder.tempdir_in(parent)?
            }
            None => builder.tempdir()?,
        };
        debug!("Created checkout directory {:?}", dir.path());
        Ok(Self { dir })
    }

    /// Root of the checkout
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Remove the checkout now
    pub fn cleanup(self) -> Result<()> {
        let path = self.dir.path().to_path_buf();
        if let Err(e) = self.dir.close() {
            warn!("Failed to remove checkout {:?}: {}", path, e);
            cleanup_clone(&path)?;
        }
        Ok(())
    }
}

impl AsRef<Path> for Checkout {
    fn as_ref(&self) -> &Path {
        self.path()
    }
}

/// Recursively remove a checkout directory
///
/// Safe to call on a path that no longer exists.
pub fn cleanup_clone(path: &Path) -> Result<()> {
    match std::fs::remove_dir_all(path) {
        Ok(()) => {
            debug!("Removed checkout {:?}", path);
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_checkout_removed_on_drop() {
        let checkout = Checkout::create(None).unwrap();
        let path = checkout.path().to_path_buf();
        std::fs::write(path.join("file"), "x").unwrap();
        assert!(path.exists());

        drop(checkout);
        assert!(!path.exists());
    }

    #[test]
    fn test_explicit_cleanup() {
        let checkout = Checkout::create(None).unwrap();
        let path = checkout.path().to_path_buf();
        checkout.cleanup().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_create_under_parent() {
        let tmp = tempfile::tempdir().unwrap();
        let parent = tmp.path().join("checkouts");
        let checkout = Checkout::create(Some(&parent)).unwrap();
        assert!(checkout.path().starts_with(&parent));
        let name = checkout.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(CHECKOUT_PREFIX));

        drop(checkout);
        assert_eq!(std::fs::read_dir(&parent).unwrap().count(), 0);
    }

    #[test]
    fn test_cleanup_clone_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("clone");
        std::fs::create_dir_all(target.join("nested/deeper")).unwrap();
        std::fs::write(target.join("nested/deeper/file"), "x").unwrap();

        cleanup_clone(&target).unwrap();
        assert!(!target.exists());
        cleanup_clone(&target).unwrap();
    }
}
