use anyhow::Context;
use serde::Deserialize;
use skillpin_skills::CommandConfig;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Default config template created when no config exists
const DEFAULT_CONFIG: &str = r#"
[lockfile]
path = "skills.lock.json"  # Set via SKILLPIN_LOCKFILE env var

[skills]
dir = ".claude/skills"  # Where the installer places each skill

[git]
program = "git"
# checkout_dir = "/var/tmp/skillpin"  # Where clones are made (default: system temp dir)

# Simple form: installer = "npx -y skills"
# Advanced form: command, args and env
[installer]
command = "npx"
args = ["-y", "skills"]

# Optional: a command printing installed skills as JSON.
# Without it the skills directory is listed directly.
# [scanner]
# command = "skills-scan"

[install]
force = false

[logging]
level = "info"  # trace, debug, info, warn, error
format = "text"  # text or json
"#;

#[derive(Debug, Deserialize, Clone)]
pub struct LockfileConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SkillsConfig {
    pub dir: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GitConfig {
    pub program: String,
    #[serde(default)]
    pub checkout_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct InstallConfig {
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default)]
    pub format: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub lockfile: LockfileConfig,
    pub skills: SkillsConfig,
    pub git: GitConfig,
    pub installer: CommandConfig,
    #[serde(default)]
    pub scanner: Option<CommandConfig>,
    #[serde(default)]
    pub install: InstallConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Get the global config path: ~/.skillpin/skillpin.toml
    fn global_config_path() -> anyhow::Result<PathBuf> {
        let home = dirs::home_dir().context("Could not find home directory")?;
        Ok(home.join(".skillpin").join("skillpin.toml"))
    }

    /// Ensure global config directory and file exist, creating defaults if needed
    fn ensure_global_config() -> anyhow::Result<PathBuf> {
        let config_path = Self::global_config_path()?;

        if let Some(config_dir) = config_path.parent() {
            if !config_dir.exists() {
                fs::create_dir_all(config_dir)?;
                eprintln!("Created config directory: {}", config_dir.display());
            }
        }

        if !config_path.exists() {
            fs::write(&config_path, DEFAULT_CONFIG.trim())?;
            eprintln!("Created default config: {}", config_path.display());
        }

        Ok(config_path)
    }

    /// Load configuration with layered approach:
    /// 1. Global config: ~/.skillpin/skillpin.toml (auto-created if missing)
    /// 2. Local override: ./skillpin.toml (project, optional)
    /// 3. Environment variables (highest priority)
    pub fn load() -> anyhow::Result<Self> {
        // Load .env file from current directory
        dotenvy::dotenv().ok();

        let global_config_path = Self::ensure_global_config()?;

        // Later sources override earlier ones
        let mut config_builder = config::Config::builder()
            .add_source(config::File::from(global_config_path))
            .add_source(config::File::with_name("skillpin").required(false))
            .add_source(
                config::Environment::with_prefix("SKILLPIN")
                    .separator("__")
                    .try_parsing(true),
            );

        // Convenience env var overrides
        if let Ok(path) = env::var("SKILLPIN_LOCKFILE") {
            config_builder = config_builder.set_override("lockfile.path", path)?;
        }

        if let Ok(installer) = env::var("SKILLPIN_INSTALLER") {
            config_builder = config_builder.set_override("installer", installer)?;
        }

        let config = config_builder
            .build()
            .context("Failed to read configuration")?;

        let config: Self = config
            .try_deserialize()
            .context("Invalid configuration")?;
        Ok(config)
    }
}
