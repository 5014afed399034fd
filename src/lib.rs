//! ReelMash Library
//!
//! Builds short vertical mashup videos from keyword-matched source clips.
//! The pipeline is organized as domain rules, ports, adapters over the
//! external tools (yt-dlp, ffmpeg, ffprobe) and application interactors,
//! with a CLI and an HTTP control surface on top.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod config;
pub mod config_initialization;
pub mod domain;
pub mod error;
pub mod ports;
pub mod server;
pub mod utils;

// Re-export commonly used types
pub use app::{AppContainer, DefaultAppContainer, GenerationSession, Scheduler};
pub use config::AppConfig;
pub use domain::errors::DomainError;
pub use domain::model::{GeneratedVideo, SessionStatus, SourceVideo};
pub use error::{ReelError, ReelResult};
