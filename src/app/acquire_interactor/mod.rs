// Acquire interactor - Collects source clips into the scratch area

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::app::library_interactor::delete_entries;
use crate::app::random::SharedRng;
use crate::config::AppConfig;
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::*;
use crate::ports::*;

/// Downloaded sources may report a slightly longer duration than the search
/// index did
const DURATION_TOLERANCE_SECONDS: f64 = 1.0;

/// Interactor for source acquisition
pub struct AcquireInteractor {
    source_port: Arc<dyn SourcePort>,
    probe_port: Arc<dyn ProbePort>,
    fs_port: Arc<dyn FsPort>,
    scratch_dir: PathBuf,
    keywords: Vec<String>,
    keywords_per_batch: usize,
    max_source_duration: f64,
    rng: SharedRng,
}

impl AcquireInteractor {
    pub fn new(
        source_port: Arc<dyn SourcePort>,
        probe_port: Arc<dyn ProbePort>,
        fs_port: Arc<dyn FsPort>,
        config: &AppConfig,
        rng: SharedRng,
    ) -> Self {
        Self {
            source_port,
            probe_port,
            fs_port,
            scratch_dir: config.temp_dir.clone(),
            keywords: config.keywords.clone(),
            keywords_per_batch: config.keywords_per_batch,
            max_source_duration: config.max_source_duration as f64,
            rng,
        }
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    /// Search `keyword` and keep every download that probes as a usable
    /// clip within the duration limit. Per-item failures are skipped.
    pub async fn collect(
        &self,
        keyword: &str,
        max_results: usize,
    ) -> Result<Vec<SourceVideo>, DomainError> {
        self.fs_port.create_directory(&self.scratch_dir).await?;

        let files = match self
            .source_port
            .fetch_search(keyword, max_results, self.max_source_duration, &self.scratch_dir)
            .await
        {
            Ok(files) => files,
            Err(e) => {
                warn!("Source search for '{}' failed: {}", keyword, e);
                return Ok(Vec::new());
            }
        };

        let mut sources = Vec::with_capacity(files.len());
        for file in files {
            if let Some(source) = self.inspect(&file).await {
                sources.push(source);
            }
        }

        info!(
            "Collected {} source video(s) for '{}'",
            sources.len(),
            keyword
        );
        Ok(sources)
    }

    /// Spread `total` downloads over a random subset of the configured
    /// keywords. Shortfalls are not backfilled.
    pub async fn collect_many(&self, total: usize) -> Result<Vec<SourceVideo>, DomainError> {
        let batches = self.rng.with(|rng| {
            KeywordPlanner::plan_batches(rng, &self.keywords, total, self.keywords_per_batch)
        });

        let mut sources = Vec::new();
        for (keyword, count) in batches {
            sources.extend(self.collect(&keyword, count).await?);
        }

        info!("Source library holds {} video(s)", sources.len());
        Ok(sources)
    }

    /// Download one explicit URL into the scratch area
    pub async fn fetch_url(&self, url: &str) -> Result<SourceVideo, DomainError> {
        self.fs_port.create_directory(&self.scratch_dir).await?;
        let file = self.source_port.fetch_url(url, &self.scratch_dir).await?;
        let info = self.probe_port.probe_media(&file).await?;
        SourceVideo::from_media_info(info)
    }

    /// Delete every regular file directly in the scratch area
    pub async fn cleanup_all(&self) -> Result<CleanupReport, DomainError> {
        let entries = self.fs_port.list_files(&self.scratch_dir).await?;
        let report = delete_entries(self.fs_port.as_ref(), entries).await;
        info!(
            "Removed {} scratch file(s), {} failed",
            report.deleted, report.failed
        );
        Ok(report)
    }

    async fn inspect(&self, file: &Path) -> Option<SourceVideo> {
        let source = match self.probe_port.probe_media(file).await {
            Ok(info) => SourceVideo::from_media_info(info),
            Err(e) => Err(e),
        };

        match source {
            Ok(source) if source.duration > self.max_source_duration + DURATION_TOLERANCE_SECONDS => {
                warn!(
                    "Skipping {}: {:.1}s exceeds the {:.0}s limit",
                    file.display(),
                    source.duration,
                    self.max_source_duration
                );
                None
            }
            Ok(source) => Some(source),
            Err(e) => {
                warn!("Skipping {}: {}", file.display(), e);
                None
            }
        }
    }
}
