//! Lockfile schema validation
//!
//! Validation runs on the raw JSON value rather than on a deserialized struct
//! so that every rejection can name the offending skill, field and value.

use regex::Regex;
use serde_json::{Map, Value};
use skillpin_integrity::is_integrity_hash;
use skillpin_types::{Lockfile, Result, SkillEntry, SkillpinError, LOCKFILE_VERSION};
use std::sync::LazyLock;

const SUBJECT: &str = "Lockfile";

/// Fields every skill entry must carry as strings, checked in this order
const REQUIRED_FIELDS: [&str; 3] = ["source", "path", "ref"];

#[allow(clippy::expect_used)]
static COMMIT_SHA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-f]{40}$").expect("commit SHA pattern is valid"));

/// True when `git_ref` is a full lowercase 40-character commit SHA
pub fn is_commit_sha(git_ref: &str) -> bool {
    COMMIT_SHA.is_match(git_ref)
}

/// Validate a parsed lockfile document
///
/// # Errors
/// Returns [`SkillpinError::Validation`] describing the first violation found
pub fn validate(data: &Value) -> Result<()> {
    let root = data
        .as_object()
        .ok_or_else(|| invalid(format!("{SUBJECT} must be a JSON object")))?;

    match root.get("version") {
        Some(v) if v.as_f64() == Some(f64::from(LOCKFILE_VERSION)) => {}
        other => {
            return Err(invalid(format!(
                "Unsupported lockfile version: {}",
                describe(other)
            )))
        }
    }

    let skills = skills_object(root)?;
    for (name, entry) in skills {
        validate_entry(name, entry)?;
    }

    Ok(())
}

/// Validate and convert a parsed document into a [`Lockfile`]
///
/// Unknown fields are dropped.
pub fn parse(data: &Value) -> Result<Lockfile> {
    validate(data)?;

    let mut lockfile = Lockfile::new();
    let Some(root) = data.as_object() else {
        return Ok(lockfile);
    };

    for (name, entry) in skills_object(root)? {
        let field = |key: &str| {
            entry
                .get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_default()
        };
        lockfile.insert(
            name.clone(),
            SkillEntry {
                source: field("source"),
                path: field("path"),
                git_ref: field("ref"),
                integrity: entry
                    .get("integrity")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            },
        );
    }

    Ok(lockfile)
}

fn skills_object(root: &Map<String, Value>) -> Result<&Map<String, Value>> {
    root.get("skills")
        .and_then(Value::as_object)
        .ok_or_else(|| invalid(format!("{SUBJECT} must have a 'skills' object")))
}

fn validate_entry(name: &str, entry: &Value) -> Result<()> {
    let entry = entry
        .as_object()
        .ok_or_else(|| invalid(format!("Skill '{name}' must be an object")))?;

    for field in REQUIRED_FIELDS {
        if !entry.get(field).is_some_and(Value::is_string) {
            return Err(invalid(format!(
                "Skill '{name}' missing or invalid field '{field}'"
            )));
        }
    }

    let git_ref = entry.get("ref").and_then(Value::as_str).unwrap_or_default();
    if !is_commit_sha(git_ref) {
        return Err(invalid(format!(
            "Skill '{name}' has invalid ref '{git_ref}': must be a full 40-character commit SHA"
        )));
    }

    match entry.get("integrity") {
        None | Some(Value::Null) => Ok(()),
        Some(Value::String(integrity)) if is_integrity_hash(integrity) => Ok(()),
        Some(Value::String(integrity)) => Err(invalid(format!(
            "Skill '{name}' has invalid integrity '{integrity}': must be sha256: followed by 64 lowercase hex characters"
        ))),
        Some(_) => Err(invalid(format!(
            "Skill '{name}' has invalid field 'integrity'"
        ))),
    }
}

/// Render a value the way it appears in version error messages
fn describe(value: Option<&Value>) -> String {
    match value {
        None => "undefined".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(v) => v.to_string(),
    }
}

fn invalid(message: String) -> SkillpinError {
    SkillpinError::Validation(message)
}
