//! Collaborators backed by external executables

use serde::Deserialize;
use skillpin_integrity::read_skill_metadata;
use skillpin_types::{InstalledSkill, Result, SkillpinError, MANIFEST_FILE};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::collaborators::{InstallRequest, Installer, Remover, Scanner};

/// Skill name used in errors that concern the whole installation
const ALL_SKILLS: &str = "*";

/// How to launch an external collaborator
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum CommandConfig {
    /// Simple form: a command string split on whitespace
    Simple(String),

    /// Advanced form with explicit arguments and environment
    Advanced {
        /// Program to execute
        ///
        /// If `args` is empty this is split on whitespace like the simple form.
        command: String,

        /// Arguments placed before the operation arguments
        #[serde(default)]
        args: Vec<String>,

        /// Extra environment variables for the child process
        #[serde(default)]
        env: HashMap<String, String>,
    },
}

/// A resolved program invocation prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    /// Program to execute
    pub program: String,
    /// Leading arguments
    pub args: Vec<String>,
    /// Environment variables
    pub env: HashMap<String, String>,
}

impl CommandConfig {
    /// Split the configuration into program, leading arguments and environment
    #[must_use]
    pub fn command_line(&self) -> CommandLine {
        match self {
            CommandConfig::Simple(s) => split_command(s, HashMap::new()),
            CommandConfig::Advanced { command, args, env } => {
                if args.is_empty() {
                    split_command(command, env.clone())
                } else {
                    CommandLine {
                        program: command.clone(),
                        args: args.clone(),
                        env: env.clone(),
                    }
                }
            }
        }
    }
}

fn split_command(command: &str, env: HashMap<String, String>) -> CommandLine {
    let parts: Vec<&str> = command.split_whitespace().collect();
    let program = parts
        .first()
        .map_or_else(|| command.to_string(), |p| (*p).to_string());
    let args = parts.iter().skip(1).map(|a| (*a).to_string()).collect();
    CommandLine { program, args, env }
}

impl CommandLine {
    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).envs(&self.env);
        cmd
    }
}

/// Installer and remover that shell out to a configured executable
///
/// Invocations are `<cmd> install <source> <name> [--ref <sha>] [--path <subpath>]`
/// and `<cmd> remove <name>`, with stdin, stdout and stderr inherited so the
/// installer may prompt. The only way to obtain one is [`CommandInstaller::probe`],
/// which makes holding a value proof that the executable runs.
#[derive(Debug, Clone)]
pub struct CommandInstaller {
    line: CommandLine,
}

impl CommandInstaller {
    /// Check once that the installer runs and return the capability
    ///
    /// # Errors
    /// Returns [`SkillpinError::NotFound`] if `<cmd> --version` cannot be run
    /// or exits unsuccessfully
    pub async fn probe(config: &CommandConfig) -> Result<Self> {
        let line = config.command_line();
        let status = line
            .command()
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match status {
            Ok(status) if status.success() => {
                info!("Installer '{}' is available", line.program);
                Ok(Self { line })
            }
            Ok(status) => Err(SkillpinError::NotFound(format!(
                "Installer '{}' is not usable ({status})",
                line.program
            ))),
            Err(e) => Err(SkillpinError::NotFound(format!(
                "Installer '{}' is not available: {e}",
                line.program
            ))),
        }
    }

    /// The program being invoked
    pub fn program(&self) -> &str {
        &self.line.program
    }

    async fn run(&self, skill: &str, args: &[&str]) -> Result<()> {
        debug!("Running installer {} {:?}", self.line.program, args);
        let status = self
            .line
            .command()
            .args(args)
            .status()
            .await
            .map_err(|e| SkillpinError::Install {
                skill: skill.to_string(),
                reason: format!("failed to run '{}': {e}", self.line.program),
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(SkillpinError::Install {
                skill: skill.to_string(),
                reason: format!("'{}' exited with {status}", self.line.program),
            })
        }
    }
}

impl Installer for CommandInstaller {
    async fn install(&self, request: &InstallRequest<'_>) -> Result<()> {
        let mut args = vec!["install", request.source, request.name];
        if let Some(git_ref) = request.git_ref {
            args.extend(["--ref", git_ref]);
        }
        if let Some(subpath) = request.subpath {
            args.extend(["--path", subpath]);
        }
        self.run(request.name, &args).await
    }
}

impl Remover for CommandInstaller {
    async fn remove(&self, name: &str) -> Result<()> {
        self.run(name, &["remove", name]).await
    }
}

/// Scanner that runs an executable printing a JSON array of installed skills
#[derive(Debug, Clone)]
pub struct CommandScanner {
    line: CommandLine,
}

impl CommandScanner {
    /// Create a scanner from its launch configuration
    pub fn new(config: &CommandConfig) -> Self {
        Self {
            line: config.command_line(),
        }
    }
}

impl Scanner for CommandScanner {
    async fn scan(&self) -> Result<Vec<InstalledSkill>> {
        let output = self
            .line
            .command()
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| scan_failure(format!("failed to run '{}': {e}", self.line.program)))?;

        if !output.status.success() {
            return Err(scan_failure(format!(
                "'{}' exited with {}: {}",
                self.line.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let skills: Vec<InstalledSkill> = serde_json::from_slice(&output.stdout)?;
        debug!("Scanner reported {} installed skills", skills.len());
        Ok(skills)
    }
}

fn scan_failure(reason: String) -> SkillpinError {
    SkillpinError::Install {
        skill: ALL_SKILLS.to_string(),
        reason,
    }
}

/// Scanner that lists the immediate subdirectories of the skills directory
#[derive(Debug, Clone)]
pub struct DirectoryScanner {
    skills_dir: PathBuf,
}

impl DirectoryScanner {
    /// Scan `skills_dir`
    pub fn new(skills_dir: impl Into<PathBuf>) -> Self {
        Self {
            skills_dir: skills_dir.into(),
        }
    }

    /// Directory being scanned
    pub fn skills_dir(&self) -> &Path {
        &self.skills_dir
    }
}

impl Scanner for DirectoryScanner {
    async fn scan(&self) -> Result<Vec<InstalledSkill>> {
        let mut entries = match tokio::fs::read_dir(&self.skills_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Skills directory {:?} does not exist", self.skills_dir);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut skills = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            // Follows symlinks, so linked skill directories are listed too
            match tokio::fs::metadata(&path).await {
                Ok(meta) if meta.is_dir() => {}
                Ok(_) => continue,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    debug!("Skipping dangling link {:?}", path);
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
                warn!("Skipping skill directory with non UTF-8 name: {:?}", path);
                continue;
            };

            skills.push(InstalledSkill {
                name,
                has_manifest: path.join(MANIFEST_FILE).is_file(),
                metadata: read_skill_metadata(&path),
                disk_path: path,
            });
        }

        skills.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(skills)
    }
}
