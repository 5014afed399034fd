//! CLI module for ReelMash
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config_initialization::ConfigOverrides;

pub mod args;
pub mod commands;

/// ReelMash
///
/// Builds short vertical mashups from keyword-matched source clips with a
/// quote burned into one segment.
#[derive(Parser, Debug)]
#[command(name = "reelmash")]
#[command(about = "ReelMash - automated vertical video mashups")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true, env = "REELMASH_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Logging level, used when RUST_LOG is unset
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Override the output directory
    #[arg(long, global = true, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Override the scratch directory
    #[arg(long, global = true, value_name = "DIR")]
    pub temp_dir: Option<PathBuf>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn config_overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            config_file: self.config.clone(),
            output_dir: self.output_dir.clone(),
            temp_dir: self.temp_dir.clone(),
        }
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate mashups once, hourly or continuously
    Run(args::RunArgs),
    /// Download one video by URL into the scratch area
    Fetch(args::FetchArgs),
    /// Start the HTTP control surface
    Serve(args::ServeArgs),
    /// List generated videos
    List,
    /// Delete generated videos or scratch files
    Clean(args::CleanArgs),
    /// Show library statistics
    Stats,
    /// Show disk usage
    Disk,
    /// Show the effective configuration
    Config(args::ConfigArgs),
}
