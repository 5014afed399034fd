// Extract interactor - Cuts a random, vertically normalized segment

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::app::random::SharedRng;
use crate::config::AppConfig;
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::*;
use crate::ports::*;

/// Interactor for segment extraction
pub struct ExtractInteractor {
    render_port: Arc<dyn RenderPort>,
    fs_port: Arc<dyn FsPort>,
    scratch_dir: PathBuf,
    target: Resolution,
    frame_rate: u32,
    rng: SharedRng,
}

impl ExtractInteractor {
    pub fn new(
        render_port: Arc<dyn RenderPort>,
        fs_port: Arc<dyn FsPort>,
        config: &AppConfig,
        rng: SharedRng,
    ) -> Self {
        Self {
            render_port,
            fs_port,
            scratch_dir: config.temp_dir.clone(),
            target: config.video_resolution,
            frame_rate: config.frame_rate,
            rng,
        }
    }

    /// Choose the window and crop for one cut of `source`
    pub fn plan(
        &self,
        source: &SourceVideo,
        duration: Option<f64>,
    ) -> Result<SegmentPlan, DomainError> {
        let window = self.rng.with(|rng| {
            let requested = SegmentSelector::requested_duration(rng, duration, source.duration)?;
            Ok::<_, DomainError>(SegmentSelector::choose_window(
                rng,
                source.duration,
                requested,
            ))
        })?;

        Ok(SegmentPlan {
            source: source.path.clone(),
            start: window.start,
            duration: window.duration,
            crop: VerticalNormalizer::crop_window(source.resolution, self.target),
            target: self.target,
            frame_rate: self.frame_rate,
            source_has_audio: source.has_audio,
        })
    }

    /// Render a random segment of `source`. Any failure yields `None` and
    /// leaves no intermediate file behind.
    pub async fn extract(&self, source: &SourceVideo, duration: Option<f64>) -> Option<Segment> {
        match self.try_extract(source, duration).await {
            Ok(segment) => Some(segment),
            Err(e) => {
                warn!("Skipping segment from {}: {}", source.path.display(), e);
                None
            }
        }
    }

    async fn try_extract(
        &self,
        source: &SourceVideo,
        duration: Option<f64>,
    ) -> Result<Segment, DomainError> {
        if !self.fs_port.file_exists(&source.path).await? {
            return Err(DomainError::FsFail(format!(
                "Source is gone: {}",
                source.path.display()
            )));
        }

        let plan = self.plan(source, duration)?;
        let file = self
            .fs_port
            .create_temp_file(&self.scratch_dir, "segment_", ".mp4")
            .await?;

        debug!(
            "Rendering {:.2}s from {} at {:.2}s",
            plan.duration,
            plan.source.display(),
            plan.start
        );
        // on error `file` drops here and the partial render goes with it
        self.render_port.render_segment(&plan, &file).await?;

        Ok(Segment::new(plan, file))
    }
}
