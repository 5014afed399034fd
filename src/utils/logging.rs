//! Tracing subscriber setup

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{ReelError, ReelResult};

/// Log levels accepted by `--log-level`
pub const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Filter from `RUST_LOG` when set, otherwise from `level`
pub fn build_filter(level: &str) -> ReelResult<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    let level = level.trim().to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        return Err(ReelError::ConfigError {
            message: format!(
                "Unknown log level '{}', expected one of {}",
                level,
                LOG_LEVELS.join(", ")
            ),
        });
    }
    EnvFilter::try_new(&level).map_err(|e| ReelError::ConfigError {
        message: e.to_string(),
    })
}

/// Install the global subscriber. Logs go to stderr so command output on
/// stdout stays machine-readable.
pub fn init_logging(level: &str, json: bool) -> ReelResult<()> {
    let filter = build_filter(level)?;

    let result = if json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_thread_ids(false),
            )
            .with(filter)
            .try_init()
    };

    result.map_err(|e| ReelError::ConfigError {
        message: format!("Logging already initialized: {}", e),
    })
}
