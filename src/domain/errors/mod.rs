// Domain errors - Error types for the domain layer

use std::fmt;

/// Domain-specific error types
#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Invalid arguments or configuration provided
    BadArgs(String),
    /// File system operation failed
    FsFail(String),
    /// Media probing failed
    ProbeFail(String),
    /// Source retrieval failed
    DownloadFail(String),
    /// FFmpeg rendering, overlay or encode failed
    RenderFail(String),
    /// A generation cycle is already running
    Busy(String),
    /// No usable source material
    NoSources(String),
    /// Processing error
    ProcessingError(String),
}

impl DomainError {
    /// Whether this error signals a conflict with an active generation cycle
    pub fn is_busy(&self) -> bool {
        matches!(self, DomainError::Busy(_))
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainError::BadArgs(msg) => write!(f, "Bad arguments: {}", msg),
            DomainError::FsFail(msg) => write!(f, "File system error: {}", msg),
            DomainError::ProbeFail(msg) => write!(f, "Probe failed: {}", msg),
            DomainError::DownloadFail(msg) => write!(f, "Download failed: {}", msg),
            DomainError::RenderFail(msg) => write!(f, "Render failed: {}", msg),
            DomainError::Busy(msg) => write!(f, "Busy: {}", msg),
            DomainError::NoSources(msg) => write!(f, "No sources: {}", msg),
            DomainError::ProcessingError(msg) => write!(f, "Processing error: {}", msg),
        }
    }
}

impl std::error::Error for DomainError {}

impl From<std::io::Error> for DomainError {
    fn from(err: std::io::Error) -> Self {
        DomainError::FsFail(err.to_string())
    }
}
