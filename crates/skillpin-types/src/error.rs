//! Error types shared by every skillpin crate

use thiserror::Error;

/// Skillpin errors
#[derive(Debug, Error)]
pub enum SkillpinError {
    /// Malformed or unsupported lockfile schema
    #[error("{0}")]
    Validation(String),

    /// Something the operation needs does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Freshly installed content does not hash to the pinned value
    #[error(
        "Integrity mismatch for skill '{skill}': expected {expected}, got {actual}. \
         Re-pin the skill if this change is intended"
    )]
    IntegrityMismatch {
        /// Skill name
        skill: String,
        /// Hash recorded in the lockfile
        expected: String,
        /// Hash computed after install
        actual: String,
    },

    /// Clone, checkout or ref resolution failed, or a skill is missing from a repo
    #[error("{message}{}", format_available(.available))]
    Resolution {
        /// What went wrong
        message: String,
        /// Skill names that were actually discovered, if any
        available: Vec<String>,
    },

    /// The external installer, remover or scanner reported failure
    #[error("Install of '{skill}' failed: {reason}")]
    Install {
        /// Skill name
        skill: String,
        /// Failure reason
        reason: String,
    },

    /// JSON syntax error
    #[error("JSON error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Generic I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SkillpinError {
    /// Resolution failure without discovery context
    pub fn resolution(message: impl Into<String>) -> Self {
        SkillpinError::Resolution {
            message: message.into(),
            available: Vec::new(),
        }
    }
}

fn format_available(available: &[String]) -> String {
    if available.is_empty() {
        String::new()
    } else {
        format!(" (available skills: {})", available.join(", "))
    }
}

/// Convenient Result type alias
pub type Result<T> = std::result::Result<T, SkillpinError>;
