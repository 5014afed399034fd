//! Command-line argument definitions

use std::path::PathBuf;

use clap::{ArgGroup, Args, ValueEnum};

use crate::domain::rules::MAX_VIDEOS_PER_REQUEST;

/// How `run` schedules generation cycles
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RunMode {
    /// A single cycle, then exit
    Once,
    /// One cycle now and one per configured interval
    Hourly,
    /// Back-to-back cycles separated by --delay
    Continuous,
}

fn parse_video_count(value: &str) -> Result<usize, String> {
    let count: usize = value
        .parse()
        .map_err(|_| format!("'{}' is not a number", value))?;
    if (1..=MAX_VIDEOS_PER_REQUEST).contains(&count) {
        Ok(count)
    } else {
        Err(format!("must be between 1 and {}", MAX_VIDEOS_PER_REQUEST))
    }
}

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Scheduling mode
    #[arg(value_enum)]
    pub mode: RunMode,

    /// Videos per cycle
    #[arg(short = 'n', long, default_value = "1", value_parser = parse_video_count)]
    pub num_videos: usize,

    /// Seconds between cycles in continuous mode
    #[arg(short, long, default_value = "60")]
    pub delay: u64,

    /// Only collect the source library, generate nothing
    #[arg(long)]
    pub init_only: bool,
}

/// Arguments for the fetch command
#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Video URL to download into the scratch area
    #[arg(long)]
    pub url: String,
}

/// Arguments for the serve command
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Bind address
    #[arg(long, default_value = "0.0.0.0", env = "REELMASH_HOST")]
    pub host: String,

    /// Bind port
    #[arg(long, default_value = "5000", env = "REELMASH_PORT")]
    pub port: u16,
}

/// Arguments for the clean command
#[derive(Args, Debug)]
#[command(group(ArgGroup::new("scope").args(["all", "temp", "keep"])))]
pub struct CleanArgs {
    /// Delete every generated video and every scratch file
    #[arg(long)]
    pub all: bool,

    /// Delete scratch files only
    #[arg(long)]
    pub temp: bool,

    /// Keep the N newest videos and delete the rest
    #[arg(long, value_name = "N")]
    pub keep: Option<usize>,
}

/// Arguments for the config command
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Print the effective configuration as TOML
    #[arg(long)]
    pub toml: bool,

    /// Write the effective configuration to FILE
    #[arg(long, value_name = "FILE")]
    pub save: Option<PathBuf>,
}
