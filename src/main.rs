//! BatchTrim CLI
//!
//! Command-line client for a batch video trimming service.
//!
//! # Usage
//!
//! ```bash
//! batchtrim scan --input "D:/anime/season1"
//! batchtrim run --input "D:/anime/season1" --output "D:/out" --skip "00:00..01:30" --parts 2
//! batchtrim status --json
//! ```

use anyhow::Result;
use clap::Parser;
use tracing::debug;

use batchtrim::cli::{commands, Cli, Commands};
use batchtrim::config_initialization::initialize_configuration_hierarchy;
use batchtrim::utils::logging::{LoggingConfig, LoggingSystem};

/// Main entry point for the BatchTrim CLI application
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = initialize_configuration_hierarchy(&cli).await?;

    let logging = LoggingSystem::new(LoggingConfig::from(&config));
    logging.initialize()?;
    logging.log_system_info();
    debug!("Service URL: {}", config.service_url);

    match cli.command {
        Commands::Scan(args) => commands::scan(&config, args).await,
        Commands::Run(args) => commands::run(&config, args).await,
        Commands::Status(args) => commands::status(&config, args).await,
    }
}
