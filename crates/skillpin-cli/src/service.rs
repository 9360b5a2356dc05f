use crate::args::Command;
use crate::config::Config;
use anyhow::{Context, Result};
use skillpin_lockfile::LockfileStore;
use skillpin_logging::LogFormat;
use skillpin_skills::{
    AddOptions, CommandInstaller, CommandScanner, Decision, DirectoryScanner, ReconcileReport, ReconciliationPolicy,
    Scanner, SkillManager,
};
use skillpin_source::SourceResolver;
use tracing::{info, warn};

/// Skillpin service - runs one lifecycle operation
pub struct SkillpinService {
    config: Config,
}

impl SkillpinService {
    /// Create a new service
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run `command` to completion
    pub async fn run(self, command: Command) -> Result<()> {
        skillpin_logging::init_logging(
            &self.config.logging.level,
            LogFormat::from_name(&self.config.logging.format),
        )?;

        let mut resolver = SourceResolver::new(&self.config.git.program);
        if let Some(dir) = &self.config.git.checkout_dir {
            resolver = resolver.with_checkout_dir(dir);
        }
        if !resolver.is_available().await {
            warn!("git program '{}' could not be run", resolver.git_program());
        }

        // Probe the installer once; every operation below shares the capability
        let installer = CommandInstaller::probe(&self.config.installer)
            .await
            .context("Installer check failed")?;

        let store = LockfileStore::new(&self.config.lockfile.path);
        let policy = ReconciliationPolicy::new(resolver, installer, &self.config.skills.dir);
        info!("Using lockfile {}", store.path().display());

        match &self.config.scanner {
            Some(scanner) => {
                let manager = SkillManager::new(store, policy, CommandScanner::new(scanner));
                self.dispatch(&manager, command).await
            }
            None => {
                let manager = SkillManager::new(store, policy, DirectoryScanner::new(&self.config.skills.dir));
                self.dispatch(&manager, command).await
            }
        }
    }

    async fn dispatch<S: Scanner>(&self, manager: &SkillManager<CommandInstaller, S>, command: Command) -> Result<()> {
        match command {
            Command::Install { force } => match manager.install(force || self.config.install.force).await {
                Ok(report) => {
                    print_report(&report);
                    println!(
                        "{} skills checked, {} installed",
                        report.skills.len(),
                        report.installed_count()
                    );
                }
                Err(failure) => {
                    print_report(&failure.report);
                    return Err(failure.into());
                }
            },
            Command::Add { source, skill, branch } => {
                let options = AddOptions { skill, branch };
                let (name, entry) = manager.add(&source, &options).await?;
                println!("Added {} at {}", name, entry.git_ref);
            }
            Command::Update { names } => {
                let changes = manager.update(&names).await?;
                if changes.is_empty() {
                    println!("All skills are up to date");
                }
                for name in &changes.changed {
                    println!("Updated {}", name);
                }
            }
            Command::Remove { name } => {
                manager.remove(&name).await?;
                println!("Removed {}", name);
            }
            Command::Status => {
                for status in manager.status().await? {
                    match status.decision {
                        Decision::Satisfied => println!("{}: up to date ({})", status.name, status.git_ref),
                        Decision::Install(reason) => println!("{}: drifted ({})", status.name, reason),
                    }
                }
            }
        }
        Ok(())
    }
}

fn print_report(report: &ReconcileReport) {
    for skill in &report.skills {
        match &skill.reason {
            Some(reason) => println!("{}: {} ({})", skill.name, skill.state, reason),
            None => println!("{}: {}", skill.name, skill.state),
        }
    }
}
