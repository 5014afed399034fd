// Ports - Interface definitions (contracts)

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use async_trait::async_trait;

use crate::domain::errors::*;
use crate::domain::model::*;

/// Port for media file probing and analysis
#[async_trait]
pub trait ProbePort: Send + Sync {
    /// Probe media file and return its primary stream information
    async fn probe_media(&self, file_path: &Path) -> Result<MediaInfo, DomainError>;
}

/// Port for retrieving source clips from the network
#[async_trait]
pub trait SourcePort: Send + Sync {
    /// Search for `keyword` and download up to `max_results` clips no longer
    /// than `max_duration` seconds into `dest_dir`. Returns the files that
    /// made it to disk; individual failures are not errors.
    async fn fetch_search(
        &self,
        keyword: &str,
        max_results: usize,
        max_duration: f64,
        dest_dir: &Path,
    ) -> Result<Vec<PathBuf>, DomainError>;

    /// Download one explicit URL into `dest_dir`
    async fn fetch_url(&self, url: &str, dest_dir: &Path) -> Result<PathBuf, DomainError>;
}

/// Port for rendering segments and encoding mashups
#[async_trait]
pub trait RenderPort: Send + Sync {
    /// Cut, crop, scale and re-time one window of a source into `output`
    async fn render_segment(&self, plan: &SegmentPlan, output: &Path) -> Result<(), DomainError>;

    /// Burn wrapped text lines into `input`, writing `output`
    async fn render_overlay(
        &self,
        input: &Path,
        layout: &OverlayLayout,
        style: &TextStyle,
        output: &Path,
    ) -> Result<(), DomainError>;

    /// Concatenate normalized segments in order and encode the delivery file
    async fn concat_encode(
        &self,
        inputs: &[PathBuf],
        settings: &EncodeSettings,
        frame_rate: u32,
        output: &Path,
    ) -> Result<(), DomainError>;
}

/// Positioned text lines ready for drawing
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayLayout {
    pub lines: Vec<String>,
    /// Top edge of the first line in pixels
    pub origin_y: u32,
    pub line_height: u32,
}

/// Port for file system operations
#[async_trait]
pub trait FsPort: Send + Sync {
    /// Whether a file or directory exists at `file_path`
    async fn file_exists(&self, file_path: &Path) -> Result<bool, DomainError>;

    /// Create directory (including parent directories)
    async fn create_directory(&self, dir_path: &Path) -> Result<(), DomainError>;

    /// Regular files directly inside `dir_path`; missing directory is empty
    async fn list_files(&self, dir_path: &Path) -> Result<Vec<FileEntry>, DomainError>;

    /// Delete file
    async fn delete_file(&self, file_path: &Path) -> Result<(), DomainError>;

    /// Total bytes of all files below `dir_path`, recursively
    async fn directory_size(&self, dir_path: &Path) -> Result<u64, DomainError>;

    /// Create an empty, uniquely named file in `dir_path` that is deleted
    /// when the returned handle drops
    async fn create_temp_file(
        &self,
        dir_path: &Path,
        prefix: &str,
        suffix: &str,
    ) -> Result<tempfile::TempPath, DomainError>;
}

/// A regular file found by `FsPort::list_files`
#[derive(Debug, Clone, PartialEq)]
pub struct FileEntry {
    pub path: PathBuf,
    pub size: u64,
    pub modified: Option<SystemTime>,
}

impl FileEntry {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}
