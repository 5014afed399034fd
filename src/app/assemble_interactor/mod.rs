// Assemble interactor - Builds one mashup from shuffled sources

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use rand::seq::SliceRandom;
use tracing::{debug, error, info, warn};

use crate::app::extract_interactor::ExtractInteractor;
use crate::app::overlay_interactor::OverlayInteractor;
use crate::app::random::SharedRng;
use crate::config::AppConfig;
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::*;
use crate::ports::*;

/// Attempts at finding an unused output name before giving up
const NAME_ATTEMPTS: usize = 16;

/// Interactor for mashup assembly
pub struct AssembleInteractor {
    extractor: Arc<ExtractInteractor>,
    compositor: Arc<OverlayInteractor>,
    render_port: Arc<dyn RenderPort>,
    probe_port: Arc<dyn ProbePort>,
    fs_port: Arc<dyn FsPort>,
    output_dir: PathBuf,
    min_length: f64,
    max_length: f64,
    clips_per_video: usize,
    quotes: Vec<String>,
    encode: EncodeSettings,
    frame_rate: u32,
    resolution: Resolution,
    rng: SharedRng,
}

impl AssembleInteractor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        extractor: Arc<ExtractInteractor>,
        compositor: Arc<OverlayInteractor>,
        render_port: Arc<dyn RenderPort>,
        probe_port: Arc<dyn ProbePort>,
        fs_port: Arc<dyn FsPort>,
        config: &AppConfig,
        rng: SharedRng,
    ) -> Self {
        Self {
            extractor,
            compositor,
            render_port,
            probe_port,
            fs_port,
            output_dir: config.output_dir.clone(),
            min_length: config.min_video_length as f64,
            max_length: config.max_video_length as f64,
            clips_per_video: config.clips_per_video,
            quotes: config.quotes.clone(),
            encode: config.encoder.clone(),
            frame_rate: config.frame_rate,
            resolution: VerticalNormalizer::scaled_size(config.video_resolution),
            rng,
        }
    }

    /// Build one mashup. Returns `None` when no segment could be extracted
    /// or rendering failed; the cause is logged.
    pub async fn assemble(
        &self,
        candidates: &[SourceVideo],
        target_duration: Option<f64>,
    ) -> Option<GeneratedVideo> {
        match self.try_assemble(candidates, target_duration).await {
            Ok(video) => Some(video),
            Err(e) => {
                error!("Mashup failed: {}", e);
                None
            }
        }
    }

    /// Run `assemble` `count` times. Failures are dropped, not retried.
    pub async fn create_multiple(
        &self,
        candidates: &[SourceVideo],
        count: usize,
    ) -> Vec<GeneratedVideo> {
        let mut videos = Vec::with_capacity(count);
        for index in 0..count {
            info!("Creating video {}/{}", index + 1, count);
            if let Some(video) = self.assemble(candidates, None).await {
                videos.push(video);
            }
        }
        info!("Created {} of {} video(s)", videos.len(), count);
        videos
    }

    async fn try_assemble(
        &self,
        candidates: &[SourceVideo],
        target_duration: Option<f64>,
    ) -> Result<GeneratedVideo, DomainError> {
        if candidates.is_empty() {
            return Err(DomainError::NoSources(
                "No candidate videos to assemble".to_string(),
            ));
        }

        let (target, order, overlay) = self.rng.with(|rng| {
            let target = target_duration.unwrap_or_else(|| {
                MashupPlanner::target_duration(rng, self.min_length, self.max_length)
            });
            let mut order: Vec<&SourceVideo> = candidates.iter().collect();
            order.shuffle(rng);
            (target, order, MashupPlanner::pick_overlay(rng, &self.quotes))
        });
        let per_segment = MashupPlanner::segment_duration(target, self.clips_per_video);
        debug!(
            "Target {:.1}s over up to {} segment(s) of {:.1}s",
            target, self.clips_per_video, per_segment
        );

        let mut segments: Vec<Segment> = Vec::new();
        let mut accumulated = 0.0;
        for source in order.into_iter().take(self.clips_per_video) {
            if let Some(segment) = self.extractor.extract(source, Some(per_segment)).await {
                accumulated += segment.duration();
                segments.push(segment);
            }
            if accumulated >= target {
                break;
            }
        }

        if segments.is_empty() {
            return Err(DomainError::NoSources(
                "No segments could be extracted".to_string(),
            ));
        }

        if let (Some(host), Some(text)) =
            (MashupPlanner::overlay_host_index(segments.len()), overlay)
        {
            let segment = segments.remove(host);
            let segment = self.compositor.overlay(segment, text).await;
            segments.insert(host, segment);
        }

        let output = self.unused_output_path().await?;
        let inputs: Vec<PathBuf> = segments.iter().map(|s| s.path().to_path_buf()).collect();

        let encoded = self
            .render_port
            .concat_encode(&inputs, &self.encode, self.frame_rate, &output)
            .await;

        let segment_count = segments.len();
        release_segments(segments);

        if let Err(e) = encoded {
            self.discard_partial(&output).await;
            return Err(e);
        }

        let video = self.describe(&output, accumulated, segment_count).await;
        info!(
            "Created {} ({:.1}s, {} segment(s))",
            video.path.display(),
            video.duration,
            video.segment_count
        );
        Ok(video)
    }

    async fn unused_output_path(&self) -> Result<PathBuf, DomainError> {
        self.fs_port.create_directory(&self.output_dir).await?;
        for _ in 0..NAME_ATTEMPTS {
            let name = self
                .rng
                .with(|rng| OutputNaming::file_name(rng, Utc::now().timestamp_millis()));
            let path = self.output_dir.join(name);
            if !self.fs_port.file_exists(&path).await? {
                return Ok(path);
            }
        }
        Err(DomainError::FsFail(format!(
            "No free output name in {}",
            self.output_dir.display()
        )))
    }

    async fn discard_partial(&self, output: &Path) {
        if let Ok(true) = self.fs_port.file_exists(output).await {
            if let Err(e) = self.fs_port.delete_file(output).await {
                warn!("Could not remove partial output: {}", e);
            }
        }
    }

    /// Metadata of the encoded file, falling back to what was requested when
    /// it cannot be probed
    async fn describe(&self, output: &Path, duration: f64, segment_count: usize) -> GeneratedVideo {
        match self.probe_port.probe_media(output).await {
            Ok(info) if info.duration > 0.0 && info.width > 0 && info.height > 0 => GeneratedVideo {
                path: output.to_path_buf(),
                duration: info.duration,
                resolution: info.resolution().unwrap_or(self.resolution),
                frame_rate: info.frame_rate,
                file_size: info.file_size,
                segment_count,
            },
            _ => GeneratedVideo {
                path: output.to_path_buf(),
                duration,
                resolution: self.resolution,
                frame_rate: self.frame_rate as f64,
                file_size: tokio::fs::metadata(output)
                    .await
                    .map(|m| m.len())
                    .unwrap_or(0),
                segment_count,
            },
        }
    }
}

fn release_segments(segments: Vec<Segment>) {
    for segment in segments {
        let path = segment.path().to_path_buf();
        if let Err(e) = segment.release() {
            warn!("Could not remove segment {}: {}", path.display(), e);
        }
    }
}
