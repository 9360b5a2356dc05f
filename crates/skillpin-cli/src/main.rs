mod args;
mod config;
mod service;

use anyhow::Result;
use args::Command;
use config::Config;
use service::SkillpinService;

#[tokio::main]
async fn main() -> Result<()> {
    let command = Command::parse(std::env::args().skip(1))?;

    // Load configuration
    let config = Config::load()?;

    SkillpinService::new(config).run(command).await
}
