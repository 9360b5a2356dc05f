//! Source identifier normalization
//!
//! Turns the many ways a user can name a repository (shorthand, pasted
//! browser URLs, SSH remotes) into one canonical clone URL. Every function
//! here is idempotent: expanding an already expanded source is a no-op.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Host whose URLs are reduced to `owner/repo`
pub const PRIMARY_HOST: &str = "github.com";

/// Host whose URLs may carry nested subgroups before a `/-/tree/` marker
pub const SECONDARY_HOST: &str = "gitlab.com";

#[allow(clippy::expect_used)]
static SSH_SOURCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:ssh://|[A-Za-z0-9._~-]+@[A-Za-z0-9.-]+:)").expect("ssh pattern is valid")
});

#[allow(clippy::expect_used)]
static SHORTHAND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._-]+/[A-Za-z0-9._-]+$").expect("shorthand pattern is valid")
});

#[allow(clippy::expect_used)]
static HTTP_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(https?)://([^/?#]+)([^?#]*)").expect("http pattern is valid")
});

/// Expand a user-supplied source into a canonical clone URL
///
/// - SSH remotes pass through unchanged.
/// - `https://github.com/<owner>/<repo>/tree/<branch>/...` collapses to
///   `https://github.com/<owner>/<repo>.git`.
/// - `https://gitlab.com/<group>/.../<repo>/-/tree/<branch>/...` collapses to
///   `https://gitlab.com/<group>/.../<repo>.git`.
/// - Other HTTP(S) hosts pass through unchanged.
/// - `owner/repo` shorthand expands to the GitHub URL.
/// - Anything else (local paths included) passes through verbatim.
#[must_use]
pub fn expand_source(source: &str) -> String {
    let source = source.trim();

    if SSH_SOURCE.is_match(source) {
        return source.to_string();
    }

    if let Some(caps) = HTTP_URL.captures(source) {
        let scheme = caps.get(1).map_or("https", |m| m.as_str());
        let authority = caps.get(2).map_or("", |m| m.as_str());
        let path = caps.get(3).map_or("", |m| m.as_str());

        return match host_of(authority).as_str() {
            PRIMARY_HOST | "www.github.com" => expand_primary(scheme, authority, path),
            SECONDARY_HOST | "www.gitlab.com" => expand_secondary(scheme, authority, path),
            _ => None,
        }
        .unwrap_or_else(|| source.to_string());
    }

    if is_shorthand(source) {
        return format!("https://{PRIMARY_HOST}/{}", with_git_suffix(source));
    }

    source.to_string()
}

/// True for sources that name a directory on this machine
#[must_use]
pub fn is_local_source(source: &str) -> bool {
    let source = source.trim();
    source.starts_with("./")
        || source.starts_with("../")
        || source.starts_with("~/")
        || source == "~"
        || source == "."
        || Path::new(source).is_absolute()
}

/// Replace a leading `~` with the home directory
///
/// Paths without one, and paths on machines with no known home, are returned
/// as given.
#[must_use]
pub fn expand_home(source: &str) -> PathBuf {
    let source = source.trim();
    let rest = match source.strip_prefix('~') {
        Some("") => "",
        Some(rest) if rest.starts_with('/') => rest.trim_start_matches('/'),
        _ => return PathBuf::from(source),
    };
    match dirs::home_dir() {
        Some(home) if rest.is_empty() => home,
        Some(home) => home.join(rest),
        None => PathBuf::from(source),
    }
}

/// `owner/repo` where neither half is made only of dots
fn is_shorthand(source: &str) -> bool {
    SHORTHAND.is_match(source)
        && source
            .split('/')
            .all(|segment| !segment.chars().all(|c| c == '.'))
}

/// Keep only `/<owner>/<repo>` and make sure it ends in `.git`
fn expand_primary(scheme: &str, authority: &str, path: &str) -> Option<String> {
    let mut segments = path.split('/').filter(|s| !s.is_empty());
    let owner = segments.next()?;
    let repo = segments.next()?;
    Some(format!("{scheme}://{authority}/{owner}/{}", with_git_suffix(repo)))
}

/// Cut everything from the `/-/tree/` marker on and make sure it ends in `.git`
fn expand_secondary(scheme: &str, authority: &str, path: &str) -> Option<String> {
    let repo_path = match path.find("/-/tree/") {
        Some(idx) => &path[..idx],
        None => path.strip_suffix("/-/tree").unwrap_or(path),
    };
    let repo_path = repo_path.trim_end_matches('/');
    if repo_path.trim_start_matches('/').is_empty() {
        return None;
    }
    Some(format!("{scheme}://{authority}{}", with_git_suffix(repo_path)))
}

fn with_git_suffix(repo: &str) -> String {
    if repo.ends_with(".git") {
        repo.to_string()
    } else {
        format!("{repo}.git")
    }
}

/// Lowercased host of an URL authority, without credentials or port
fn host_of(authority: &str) -> String {
    let host = authority.rsplit_once('@').map_or(authority, |(_, h)| h);
    let host = host.split_once(':').map_or(host, |(h, _)| h);
    host.to_ascii_lowercase()
}
