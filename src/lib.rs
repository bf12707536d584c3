pub mod cli;
pub mod core;
pub mod engine;
pub mod providers;

use crate::core::config::AppConfig;
use anyhow::Result;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub enum AppCommand {
    /// Resolve a comma-delimited list of raw keys such as `USDKRW20221202`
    Rates { keys: String, json: bool },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Rate batch starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    match command {
        AppCommand::Rates { keys, json } => cli::rates::run(&keys, json, &config).await,
    }
}
