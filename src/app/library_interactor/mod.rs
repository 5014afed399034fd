// Library interactor - Generated video listing, retention and usage

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::OUTPUT_EXTENSION;
use crate::ports::*;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// A generated video with whatever the probe could tell about it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoEntry {
    pub filename: String,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub size_mb: f64,
    pub created: Option<DateTime<Utc>>,
    pub duration: Option<f64>,
    pub resolution: Option<String>,
    pub fps: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiskUsage {
    pub output_bytes: u64,
    pub temp_bytes: u64,
    pub output_mb: f64,
    pub temp_mb: f64,
    pub total_mb: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LibraryStats {
    pub total_videos: usize,
    pub total_size_mb: f64,
    pub average_size_mb: f64,
    pub newest_video: Option<String>,
    pub oldest_video: Option<String>,
    pub temp_files: usize,
    pub temp_size_mb: f64,
}

/// Megabytes rounded to two decimals
pub fn to_mb(bytes: u64) -> f64 {
    (bytes as f64 / BYTES_PER_MB * 100.0).round() / 100.0
}

/// Delete each entry, counting failures instead of stopping at them
pub(crate) async fn delete_entries(fs: &dyn FsPort, entries: Vec<FileEntry>) -> CleanupReport {
    let mut report = CleanupReport::default();
    for entry in entries {
        match fs.delete_file(&entry.path).await {
            Ok(()) => {
                report.deleted += 1;
                report.freed_bytes += entry.size;
            }
            Err(e) => {
                warn!("Could not delete {}: {}", entry.path.display(), e);
                report.failed += 1;
            }
        }
    }
    report
}

/// Interactor for the output library
pub struct LibraryInteractor {
    probe_port: Arc<dyn ProbePort>,
    fs_port: Arc<dyn FsPort>,
    output_dir: PathBuf,
    scratch_dir: PathBuf,
}

impl LibraryInteractor {
    pub fn new(probe_port: Arc<dyn ProbePort>, fs_port: Arc<dyn FsPort>, config: &AppConfig) -> Self {
        Self {
            probe_port,
            fs_port,
            output_dir: config.output_dir.clone(),
            scratch_dir: config.temp_dir.clone(),
        }
    }

    /// Video files in the output directory, newest first
    async fn video_files(&self) -> Result<Vec<FileEntry>, DomainError> {
        let mut files: Vec<FileEntry> = self
            .fs_port
            .list_files(&self.output_dir)
            .await?
            .into_iter()
            .filter(|entry| {
                entry
                    .path
                    .extension()
                    .map(|ext| ext.eq_ignore_ascii_case(OUTPUT_EXTENSION))
                    .unwrap_or(false)
            })
            .collect();
        files.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| b.path.cmp(&a.path)));
        Ok(files)
    }

    /// Every generated video with probe metadata, newest first
    pub async fn list_videos(&self) -> Result<Vec<VideoEntry>, DomainError> {
        let files = self.video_files().await?;
        let mut videos = Vec::with_capacity(files.len());

        for file in files {
            let mut entry = VideoEntry {
                filename: file.file_name(),
                path: file.path.clone(),
                size_bytes: file.size,
                size_mb: to_mb(file.size),
                created: file.modified.map(DateTime::<Utc>::from),
                duration: None,
                resolution: None,
                fps: None,
                error: None,
            };

            match self.probe_port.probe_media(&file.path).await {
                Ok(info) => {
                    entry.duration = Some((info.duration * 100.0).round() / 100.0);
                    entry.resolution = Some(format!("{}x{}", info.width, info.height));
                    entry.fps = Some(info.frame_rate);
                }
                Err(e) => entry.error = Some(e.to_string()),
            }
            videos.push(entry);
        }

        Ok(videos)
    }

    /// Path of a generated video by file name, if it exists
    pub async fn find_video(&self, name: &str) -> Result<Option<PathBuf>, DomainError> {
        Ok(self
            .video_files()
            .await?
            .into_iter()
            .find(|entry| entry.file_name() == name)
            .map(|entry| entry.path))
    }

    /// Keep the `keep_last_n` newest videos and delete the rest
    pub async fn clean_old_videos(&self, keep_last_n: usize) -> Result<CleanupReport, DomainError> {
        let stale: Vec<FileEntry> = self.video_files().await?.into_iter().skip(keep_last_n).collect();
        let report = delete_entries(self.fs_port.as_ref(), stale).await;
        info!(
            "Retention kept {} newest video(s), deleted {}",
            keep_last_n, report.deleted
        );
        Ok(report)
    }

    /// Delete every generated video and every scratch file
    pub async fn clean_all(&self) -> Result<CleanupReport, DomainError> {
        let videos = delete_entries(self.fs_port.as_ref(), self.video_files().await?).await;
        let scratch = self.clean_scratch().await?;
        Ok(videos.merge(scratch))
    }

    /// Delete every regular file directly in the scratch area
    pub async fn clean_scratch(&self) -> Result<CleanupReport, DomainError> {
        let entries = self.fs_port.list_files(&self.scratch_dir).await?;
        Ok(delete_entries(self.fs_port.as_ref(), entries).await)
    }

    pub async fn disk_usage(&self) -> Result<DiskUsage, DomainError> {
        let output_bytes = self.fs_port.directory_size(&self.output_dir).await?;
        let temp_bytes = self.fs_port.directory_size(&self.scratch_dir).await?;
        Ok(DiskUsage {
            output_bytes,
            temp_bytes,
            output_mb: to_mb(output_bytes),
            temp_mb: to_mb(temp_bytes),
            total_mb: to_mb(output_bytes + temp_bytes),
        })
    }

    pub async fn statistics(&self) -> Result<LibraryStats, DomainError> {
        let videos = self.video_files().await?;
        let scratch = self.fs_port.list_files(&self.scratch_dir).await?;

        let total_bytes: u64 = videos.iter().map(|v| v.size).sum();
        let average = if videos.is_empty() {
            0
        } else {
            total_bytes / videos.len() as u64
        };

        Ok(LibraryStats {
            total_videos: videos.len(),
            total_size_mb: to_mb(total_bytes),
            average_size_mb: to_mb(average),
            newest_video: videos.first().map(FileEntry::file_name),
            oldest_video: videos.last().map(FileEntry::file_name),
            temp_files: scratch.len(),
            temp_size_mb: to_mb(scratch.iter().map(|f| f.size).sum()),
        })
    }
}
