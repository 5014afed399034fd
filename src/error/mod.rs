//! Error handling module for ReelMash

use thiserror::Error;

use crate::domain::errors::DomainError;

/// Process-level error type for ReelMash operations
#[derive(Error, Debug)]
pub enum ReelError {
    /// Configuration could not be loaded or failed validation
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Configuration file is not valid TOML
    #[error("Failed to parse configuration file {path}: {source}")]
    ConfigParseError {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    /// HTTP control surface failed to start
    #[error("Server error: {message}")]
    ServerError { message: String },

    /// Pipeline or session failure
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type alias for ReelMash operations
pub type ReelResult<T> = std::result::Result<T, ReelError>;
