// Overlay interactor - Burns quote text into a segment

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::*;
use crate::ports::*;

/// Interactor for text overlay composition
pub struct OverlayInteractor {
    render_port: Arc<dyn RenderPort>,
    fs_port: Arc<dyn FsPort>,
    scratch_dir: PathBuf,
    frame: Resolution,
    style: TextStyle,
}

impl OverlayInteractor {
    pub fn new(render_port: Arc<dyn RenderPort>, fs_port: Arc<dyn FsPort>, config: &AppConfig) -> Self {
        Self {
            render_port,
            fs_port,
            scratch_dir: config.temp_dir.clone(),
            frame: VerticalNormalizer::scaled_size(config.video_resolution),
            style: config.text_style.clone(),
        }
    }

    /// Wrap and position `text` inside the frame
    pub fn layout(&self, text: &OverlayText) -> OverlayLayout {
        let max_chars = TextLayout::max_chars_per_line(&self.style, self.frame);
        let lines = TextLayout::wrap(&text.text, max_chars);
        let line_height = self.style.line_height();
        let block_height = line_height * lines.len() as u32;

        OverlayLayout {
            origin_y: TextLayout::origin_y(text.position, self.frame, block_height),
            lines,
            line_height,
        }
    }

    /// Composite `text` over the whole segment. On failure the segment is
    /// returned unchanged.
    pub async fn overlay(&self, segment: Segment, text: OverlayText) -> Segment {
        match self.render(&segment, &text).await {
            Ok(file) => segment.with_overlay(file, text),
            Err(e) => {
                warn!("Overlay skipped, keeping plain segment: {}", e);
                segment
            }
        }
    }

    async fn render(
        &self,
        segment: &Segment,
        text: &OverlayText,
    ) -> Result<tempfile::TempPath, DomainError> {
        let layout = self.layout(text);
        if layout.lines.is_empty() {
            return Err(DomainError::BadArgs("Overlay text is blank".to_string()));
        }

        let file = self
            .fs_port
            .create_temp_file(&self.scratch_dir, "overlay_", ".mp4")
            .await?;
        debug!(
            "Overlay of {} line(s) at y={} ({})",
            layout.lines.len(),
            layout.origin_y,
            text.position
        );
        self.render_port
            .render_overlay(segment.path(), &layout, &self.style, &file)
            .await?;
        Ok(file)
    }
}
