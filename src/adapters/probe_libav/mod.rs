// Probe LibAV adapter - Media file analysis using libav (feature `libav`)

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use ffmpeg_next::media::Type;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

/// LibAV-based media probing adapter
pub struct ProbeLibavAdapter;

impl ProbeLibavAdapter {
    /// Create new LibAV probing adapter
    pub fn new() -> Result<Self, DomainError> {
        ffmpeg_next::init().map_err(|e| DomainError::ProbeFail(e.to_string()))?;
        Ok(Self)
    }

    fn probe_blocking(path: PathBuf, file_size: u64) -> Result<MediaInfo, DomainError> {
        let context = ffmpeg_next::format::input(&path).map_err(|e| {
            DomainError::ProbeFail(format!("Cannot open {}: {}", path.display(), e))
        })?;

        let video = context
            .streams()
            .best(Type::Video)
            .ok_or_else(|| DomainError::ProbeFail(format!("No video stream in {}", path.display())))?;

        let decoder = ffmpeg_next::codec::context::Context::from_parameters(video.parameters())
            .and_then(|ctx| ctx.decoder().video())
            .map_err(|e| DomainError::ProbeFail(format!("Unreadable video stream: {}", e)))?;

        let rate = video.avg_frame_rate();
        let frame_rate = if rate.denominator() != 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            0.0
        };

        let duration = if context.duration() > 0 {
            context.duration() as f64 / ffmpeg_next::ffi::AV_TIME_BASE as f64
        } else {
            0.0
        };

        Ok(MediaInfo {
            has_audio: context.streams().best(Type::Audio).is_some(),
            path,
            duration,
            width: decoder.width(),
            height: decoder.height(),
            frame_rate,
            file_size,
        })
    }
}

#[async_trait]
impl ProbePort for ProbeLibavAdapter {
    async fn probe_media(&self, file_path: &Path) -> Result<MediaInfo, DomainError> {
        let file_size = tokio::fs::metadata(file_path)
            .await
            .map_err(|e| DomainError::FsFail(format!("Cannot read {}: {}", file_path.display(), e)))?
            .len();

        let path = file_path.to_path_buf();
        tokio::task::spawn_blocking(move || Self::probe_blocking(path, file_size))
            .await
            .map_err(|e| DomainError::ProcessingError(format!("Probe task failed: {}", e)))?
    }
}
