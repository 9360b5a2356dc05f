//! Skillpin integrity engine
//!
//! Content hashes of installed skill directories and the sidecar that records
//! which ref and hash were installed.

pub mod hash;
pub mod metadata;

pub use hash::{compute_skill_hash, is_integrity_hash, verify_integrity, INTEGRITY_PREFIX};
pub use metadata::{load_skill_metadata, read_skill_metadata, write_skill_metadata};
