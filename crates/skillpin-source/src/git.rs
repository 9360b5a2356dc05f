//! Thin wrapper around the `git` executable

use skillpin_types::{Result, SkillpinError};
use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Output of a git invocation that exited unsuccessfully
#[derive(Debug)]
pub(crate) struct GitFailure {
    pub(crate) command: String,
    pub(crate) stderr: String,
}

impl GitFailure {
    pub(crate) fn into_error(self) -> SkillpinError {
        SkillpinError::resolution(format!("{} failed: {}", self.command, self.stderr))
    }
}

/// Run `git` with `args`, returning trimmed stdout
///
/// Credential prompts are disabled so an inaccessible remote fails instead of
/// waiting for input.
pub(crate) async fn run<I, S>(
    program: &str,
    args: I,
    cwd: Option<&Path>,
) -> Result<std::result::Result<String, GitFailure>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let args: Vec<_> = args.into_iter().map(|a| a.as_ref().to_owned()).collect();
    let command = format!(
        "{program} {}",
        args.iter()
            .map(|a| a.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    );
    debug!("Running {}", command);

    let mut cmd = Command::new(program);
    cmd.args(&args)
        .env("GIT_TERMINAL_PROMPT", "0")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    let output = cmd.output().await.map_err(|e| {
        SkillpinError::resolution(format!("failed to run {program}: {e}"))
    })?;

    if output.status.success() {
        Ok(Ok(String::from_utf8_lossy(&output.stdout).trim().to_string()))
    } else {
        Ok(Err(GitFailure {
            command,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }))
    }
}

/// Run `git` and turn an unsuccessful exit into a resolution error
pub(crate) async fn run_checked<I, S>(program: &str, args: I, cwd: Option<&Path>) -> Result<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    run(program, args, cwd).await?.map_err(GitFailure::into_error)
}
