//! Command implementations

use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::adapters::TomlConfigAdapter;
use crate::app::{AppContainer, DefaultAppContainer};
use crate::cli::args::{CleanArgs, ConfigArgs, FetchArgs, RunArgs, RunMode, ServeArgs};
use crate::config::AppConfig;
use crate::server::{self, AppState};
use crate::utils::Utils;

const RULE: &str = "============================================================";

fn container(config: &AppConfig) -> Result<DefaultAppContainer> {
    DefaultAppContainer::new(config).context("Failed to set up the pipeline")
}

/// Receiver that flips to `true` on Ctrl-C
fn shutdown_on_ctrl_c() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Interrupt received, stopping after the current cycle");
                let _ = tx.send(true);
            }
            Err(e) => warn!("Could not listen for Ctrl-C: {}", e),
        }
    });
    rx
}

/// Execute the run command
pub async fn run(args: RunArgs, config: AppConfig) -> Result<()> {
    let container = container(&config)?;
    let session = container.session();

    if args.init_only {
        let count = session
            .initialize_source_library()
            .await
            .context("Failed to initialize the source library")?;
        println!("Source library initialized with {} video(s)", count);
        return Ok(());
    }

    let scheduler = container.scheduler();
    match args.mode {
        RunMode::Once => {
            let videos = scheduler
                .run_once(args.num_videos)
                .await
                .context("Generation cycle failed")?;
            if videos.is_empty() {
                bail!("No videos were generated");
            }
            println!("Generated {} video(s):", videos.len());
            for video in &videos {
                println!(
                    "  {} ({:.1}s, {}, {})",
                    video.path.display(),
                    video.duration,
                    video.resolution,
                    Utils::format_file_size(video.file_size)
                );
            }
        }
        RunMode::Hourly => {
            let report = scheduler
                .run_periodic(args.num_videos, shutdown_on_ctrl_c())
                .await;
            println!(
                "Stopped after {} cycle(s), {} video(s) generated",
                report.cycles, report.videos
            );
        }
        RunMode::Continuous => {
            let report = scheduler
                .run_continuous(
                    args.num_videos,
                    Duration::from_secs(args.delay),
                    shutdown_on_ctrl_c(),
                )
                .await;
            println!(
                "Stopped after {} cycle(s), {} video(s) generated",
                report.cycles, report.videos
            );
        }
    }
    Ok(())
}

/// Execute the fetch command
pub async fn fetch(args: FetchArgs, config: AppConfig) -> Result<()> {
    let container = container(&config)?;
    let source = container
        .acquire_interactor()
        .fetch_url(&args.url)
        .await
        .with_context(|| format!("Failed to fetch {}", args.url))?;

    println!(
        "Downloaded {} ({}, {})",
        source.path.display(),
        Utils::format_duration(Duration::from_secs_f64(source.duration.max(0.0))),
        source.resolution
    );
    Ok(())
}

/// Execute the serve command
pub async fn serve(args: ServeArgs, config: AppConfig) -> Result<()> {
    let container = container(&config)?;
    let state = AppState::new(&container, config);

    let mut stop = shutdown_on_ctrl_c();
    let shutdown = async move {
        let _ = stop.wait_for(|stopped| *stopped).await;
    };

    server::serve(state, &args.host, args.port, shutdown)
        .await
        .context("Control surface failed")?;
    Ok(())
}

/// Execute the list command
pub async fn list(config: AppConfig) -> Result<()> {
    let videos = container(&config)?
        .library_interactor()
        .list_videos()
        .await
        .context("Failed to list videos")?;

    if videos.is_empty() {
        println!("No videos generated yet.");
        return Ok(());
    }

    println!("Generated videos ({} total)", videos.len());
    println!("{}", RULE);
    for (i, video) in videos.iter().enumerate() {
        println!("{}. {}", i + 1, video.filename);
        match &video.error {
            Some(error) => println!("   Error: {}", error),
            None => {
                if let Some(duration) = video.duration {
                    println!("   Duration:   {:.1}s", duration);
                }
                if let Some(resolution) = &video.resolution {
                    println!("   Resolution: {}", resolution);
                }
                if let Some(fps) = video.fps {
                    println!("   FPS:        {:.2}", fps);
                }
            }
        }
        println!("   Size:       {:.2} MB", video.size_mb);
        println!("   Path:       {}", video.path.display());
    }
    Ok(())
}

/// Execute the clean command
pub async fn clean(args: CleanArgs, config: AppConfig) -> Result<()> {
    let library = container(&config)?.library_interactor();

    if args.all {
        let report = library.clean_all().await.context("Cleanup failed")?;
        println!(
            "Deleted {} file(s), freed {}",
            report.deleted,
            Utils::format_file_size(report.freed_bytes)
        );
    } else if args.temp {
        let report = library
            .clean_scratch()
            .await
            .context("Scratch cleanup failed")?;
        println!("Deleted {} scratch file(s)", report.deleted);
    } else if let Some(keep) = args.keep {
        let report = library
            .clean_old_videos(keep)
            .await
            .context("Retention cleanup failed")?;
        println!(
            "Kept the {} newest video(s), deleted {}",
            keep, report.deleted
        );
    } else {
        bail!("Specify --all, --temp or --keep N");
    }
    Ok(())
}

/// Execute the stats command
pub async fn stats(config: AppConfig) -> Result<()> {
    let stats = container(&config)?
        .library_interactor()
        .statistics()
        .await
        .context("Failed to collect statistics")?;

    println!("Statistics");
    println!("{}", RULE);
    println!("Total videos:   {}", stats.total_videos);
    println!("Total size:     {:.2} MB", stats.total_size_mb);
    println!("Average size:   {:.2} MB", stats.average_size_mb);
    if let Some(newest) = &stats.newest_video {
        println!("Newest:         {}", newest);
    }
    if let Some(oldest) = &stats.oldest_video {
        println!("Oldest:         {}", oldest);
    }
    println!(
        "Scratch files:  {} ({:.2} MB)",
        stats.temp_files, stats.temp_size_mb
    );
    Ok(())
}

/// Execute the disk command
pub async fn disk(config: AppConfig) -> Result<()> {
    let usage = container(&config)?
        .library_interactor()
        .disk_usage()
        .await
        .context("Failed to measure disk usage")?;

    println!("Disk usage");
    println!("{}", RULE);
    println!("Output directory: {:.2} MB", usage.output_mb);
    println!("Temp directory:   {:.2} MB", usage.temp_mb);
    println!("Total:            {:.2} MB", usage.total_mb);
    Ok(())
}

/// Execute the config command
pub fn show_config(args: ConfigArgs, config: &AppConfig) -> Result<()> {
    if let Some(path) = &args.save {
        TomlConfigAdapter::new()
            .save_config(config, path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Configuration written to {}", path.display());
        return Ok(());
    }

    if args.toml {
        let text = toml::to_string_pretty(config).context("Failed to render configuration")?;
        print!("{}", text);
        return Ok(());
    }

    println!("Configuration");
    println!("{}", RULE);
    println!("Output directory: {}", config.output_dir.display());
    println!("Temp directory:   {}", config.temp_dir.display());
    println!();
    println!("Video settings:");
    println!("  Max length:      {}s", config.max_video_length);
    println!("  Min length:      {}s", config.min_video_length);
    println!("  Clips per video: {}", config.clips_per_video);
    println!("  Resolution:      {}", config.video_resolution);
    println!("  Frame rate:      {}", config.frame_rate);
    println!();
    println!("Scheduling:");
    println!(
        "  Interval:        every {} hour(s)",
        config.generation_interval_hours
    );
    println!();
    println!("Keywords ({}):", config.keywords.len());
    for keyword in &config.keywords {
        println!("  - {}", keyword);
    }
    println!();
    println!("Quotes ({}):", config.quotes.len());
    for quote in config.quotes.iter().take(5) {
        println!("  - {}", quote);
    }
    if config.quotes.len() > 5 {
        println!("  ... and {} more", config.quotes.len() - 5);
    }
    Ok(())
}
