//! geoembed CLI entry point.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;

use geoembed::cli::{commands, handle_error, Cli, Commands};
use geoembed::domain::models::Config;
use geoembed::infrastructure::config::ConfigLoader;
use geoembed::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() {
    let Cli { command, json, config } = Cli::parse();

    if let Err(err) = run(command, json, config.as_deref()).await {
        handle_error(err, json);
    }
}

async fn run(command: Commands, json: bool, config_path: Option<&Path>) -> Result<()> {
    let config = match command {
        Commands::Init(args) => return commands::init::execute(args, json),
        _ => load_config(config_path)?,
    };

    let log_config = LogConfig::try_from(&config.logging).context("Invalid logging configuration")?;
    let _logger = LoggerImpl::init(&log_config)?;

    match command {
        Commands::Insert(args) => commands::insert::execute(args, &config, json).await,
        Commands::Search(args) => commands::search::execute(args, &config, json).await,
        Commands::Stats => commands::stats::execute(&config, json).await,
        Commands::Init(_) => Ok(()),
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}
