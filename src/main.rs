//! ReelMash
//!
//! Automated short-form vertical video mashups: keyword-matched sources are
//! downloaded, cut into random 9:16 segments, captioned with a quote and
//! concatenated into one video per cycle.
//!
//! # Usage
//!
//! ```bash
//! reelmash run once -n 3
//! reelmash run continuous -d 300
//! reelmash serve --port 5000
//! reelmash clean --keep 10
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use reelmash_cli::cli::{commands, Cli, Commands};
use reelmash_cli::config_initialization::initialize_configuration;
use reelmash_cli::utils::logging::init_logging;

/// Main entry point for the ReelMash CLI
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level, cli.json_logs)?;
    info!("Starting ReelMash {}", env!("CARGO_PKG_VERSION"));

    let config = initialize_configuration(&cli.config_overrides())
        .context("Invalid configuration")?;

    match cli.command {
        Commands::Run(args) => commands::run(args, config).await,
        Commands::Fetch(args) => commands::fetch(args, config).await,
        Commands::Serve(args) => commands::serve(args, config).await,
        Commands::List => commands::list(config).await,
        Commands::Clean(args) => commands::clean(args, config).await,
        Commands::Stats => commands::stats(config).await,
        Commands::Disk => commands::disk(config).await,
        Commands::Config(args) => commands::show_config(args, &config),
    }
}
