// Domain rules - Business logic and policies

use std::sync::atomic::{AtomicU64, Ordering};

use rand::seq::SliceRandom;
use rand::Rng;

use crate::domain::errors::*;
use crate::domain::model::*;


/// Bounds for a segment length when the caller does not request one
pub const DEFAULT_SEGMENT_SECONDS: (f64, f64) = (5.0, 15.0);

/// Horizontal space reserved around overlay text
pub const TEXT_MARGIN_PX: u32 = 100;

/// Top edge of a `top` anchored text block
pub const TOP_ANCHOR_Y: u32 = 100;

/// Distance from the frame bottom to a `bottom` anchored text block
pub const BOTTOM_ANCHOR_OFFSET: u32 = 300;

/// Average glyph advance relative to the font size, for bold sans fonts
const GLYPH_WIDTH_FACTOR: f64 = 0.55;

/// File name prefix of every generated mashup
pub const OUTPUT_PREFIX: &str = "motivational_";

/// Container extension of every generated mashup
pub const OUTPUT_EXTENSION: &str = "mp4";

/// Upper bound on videos per control-surface request
pub const MAX_VIDEOS_PER_REQUEST: usize = 10;

static OUTPUT_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Time window chosen inside a source
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentWindow {
    pub start: f64,
    pub duration: f64,
}

/// Rules for picking random windows out of source clips
pub struct SegmentSelector;

impl SegmentSelector {
    /// Resolve the requested segment length. Without a request the length is
    /// drawn from [5, 15] seconds and capped to the source.
    pub fn requested_duration<R: Rng + ?Sized>(
        rng: &mut R,
        requested: Option<f64>,
        source_duration: f64,
    ) -> Result<f64, DomainError> {
        if source_duration <= 0.0 {
            return Err(DomainError::BadArgs(format!(
                "Source duration must be positive, got {}",
                source_duration
            )));
        }

        match requested {
            Some(duration) if duration > 0.0 && duration.is_finite() => Ok(duration),
            Some(duration) => Err(DomainError::BadArgs(format!(
                "Segment duration must be positive, got {}",
                duration
            ))),
            None => {
                let (low, high) = DEFAULT_SEGMENT_SECONDS;
                Ok(rng.gen_range(low..=high).min(source_duration))
            }
        }
    }

    /// Pick a window of `duration` seconds. Sources no longer than the
    /// request are taken whole from offset zero.
    pub fn choose_window<R: Rng + ?Sized>(
        rng: &mut R,
        source_duration: f64,
        duration: f64,
    ) -> SegmentWindow {
        if source_duration <= duration {
            return SegmentWindow {
                start: 0.0,
                duration: source_duration,
            };
        }

        let latest_start = source_duration - duration;
        SegmentWindow {
            start: rng.gen_range(0.0..=latest_start),
            duration,
        }
    }
}

/// Rules for fitting arbitrary sources into the vertical target frame
pub struct VerticalNormalizer;

impl VerticalNormalizer {
    /// Centered crop matching the target aspect. Relatively wider sources
    /// lose width at full height, the rest lose height at full width.
    pub fn crop_window(source: Resolution, target: Resolution) -> CropWindow {
        let (w, h) = (source.width as u64, source.height as u64);
        let (tw, th) = (target.width as u64, target.height as u64);

        // h / w < th / tw, compared without floating point
        if h * tw < th * w {
            let new_w = ((h * tw) / th).clamp(1, w);
            CropWindow {
                x: ((w - new_w) / 2) as u32,
                y: 0,
                width: new_w as u32,
                height: h as u32,
            }
        } else {
            let new_h = ((w * th) / tw).clamp(1, h);
            CropWindow {
                x: 0,
                y: ((h - new_h) / 2) as u32,
                width: w as u32,
                height: new_h as u32,
            }
        }
    }

    /// Size after scaling: target height, width from the target aspect
    pub fn scaled_size(target: Resolution) -> Resolution {
        let height = target.height;
        let width = (height as f64 * target.width as f64 / target.height as f64).round() as u32;
        Resolution {
            width: width.max(1),
            height,
        }
    }
}

/// Rules for laying out overlay text
pub struct TextLayout;

impl TextLayout {
    /// Characters that fit on one line inside the horizontal margin
    pub fn max_chars_per_line(style: &TextStyle, frame: Resolution) -> usize {
        let available = frame.width.saturating_sub(TEXT_MARGIN_PX) as f64;
        let glyph = (style.font_size.max(1) as f64) * GLYPH_WIDTH_FACTOR;
        ((available / glyph).floor() as usize).max(1)
    }

    /// Greedy word wrap. Words longer than a line keep their own line.
    pub fn wrap(text: &str, max_chars: usize) -> Vec<String> {
        let mut lines = Vec::new();
        let mut current = String::new();

        for word in text.split_whitespace() {
            if current.is_empty() {
                current.push_str(word);
            } else if current.chars().count() + 1 + word.chars().count() <= max_chars {
                current.push(' ');
                current.push_str(word);
            } else {
                lines.push(std::mem::take(&mut current));
                current.push_str(word);
            }
        }

        if !current.is_empty() {
            lines.push(current);
        }

        lines
    }

    /// Top edge of the text block for an anchor position
    pub fn origin_y(position: TextPosition, frame: Resolution, block_height: u32) -> u32 {
        let fit = frame.height.saturating_sub(block_height);
        match position {
            TextPosition::Top => TOP_ANCHOR_Y.min(fit),
            TextPosition::Center => fit / 2,
            TextPosition::Bottom => frame.height.saturating_sub(BOTTOM_ANCHOR_OFFSET).min(fit),
        }
    }
}

/// Rules for building one mashup
pub struct MashupPlanner;

impl MashupPlanner {
    /// Target length drawn uniformly from the configured range
    pub fn target_duration<R: Rng + ?Sized>(rng: &mut R, min: f64, max: f64) -> f64 {
        if max <= min {
            return min;
        }
        rng.gen_range(min..=max)
    }

    /// Length of each segment for a target split across `clips` segments
    pub fn segment_duration(target: f64, clips: usize) -> f64 {
        target / clips.max(1) as f64
    }

    /// Index of the segment that carries the quote: the middle one
    pub fn overlay_host_index(segment_count: usize) -> Option<usize> {
        if segment_count == 0 {
            None
        } else {
            Some(segment_count / 2)
        }
    }

    /// Random quote and anchor for the overlay
    pub fn pick_overlay<R: Rng + ?Sized>(rng: &mut R, quotes: &[String]) -> Option<OverlayText> {
        let quote = quotes.choose(rng)?;
        let position = *TextPosition::ALL.choose(rng)?;
        Some(OverlayText::new(quote.clone(), position))
    }
}

/// Rules for spreading a download budget over keywords
pub struct KeywordPlanner;

impl KeywordPlanner {
    /// Pick up to `keyword_count` distinct keywords and give each an even
    /// share (rounded up) of `total`.
    pub fn plan_batches<R: Rng + ?Sized>(
        rng: &mut R,
        keywords: &[String],
        total: usize,
        keyword_count: usize,
    ) -> Vec<(String, usize)> {
        let count = keyword_count.min(keywords.len());
        if count == 0 || total == 0 {
            return Vec::new();
        }

        let per_keyword = total.div_ceil(count);
        keywords
            .choose_multiple(rng, count)
            .map(|keyword| (keyword.clone(), per_keyword))
            .collect()
    }
}

/// Rules for naming output files
pub struct OutputNaming;

impl OutputNaming {
    /// File name for a mashup. The process-wide sequence keeps names distinct
    /// within one process, the random tail across processes.
    pub fn file_name<R: Rng + ?Sized>(rng: &mut R, unix_millis: i64) -> String {
        let sequence = OUTPUT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        format!(
            "{}{}_{:04}{:06}.{}",
            OUTPUT_PREFIX,
            unix_millis,
            sequence % 10_000,
            rng.gen_range(0..1_000_000u32),
            OUTPUT_EXTENSION
        )
    }

    /// Whether a file name belongs to a generated mashup
    pub fn is_output_name(name: &str) -> bool {
        name.starts_with(OUTPUT_PREFIX)
            && name
                .rsplit_once('.')
                .map(|(_, ext)| ext.eq_ignore_ascii_case(OUTPUT_EXTENSION))
                .unwrap_or(false)
    }
}

/// Validate a requested video count from the control surface
pub fn validate_video_count(count: usize) -> Result<usize, DomainError> {
    if (1..=MAX_VIDEOS_PER_REQUEST).contains(&count) {
        Ok(count)
    } else {
        Err(DomainError::BadArgs(format!(
            "num_videos must be between 1 and {}",
            MAX_VIDEOS_PER_REQUEST
        )))
    }
}
