// Domain models - Core types and data structures

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::TempPath;

use crate::domain::errors::DomainError;


/// Frame dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    /// Create a new resolution with validation
    pub fn new(width: u32, height: u32) -> Result<Self, DomainError> {
        if width == 0 || height == 0 {
            return Err(DomainError::BadArgs(format!(
                "Resolution dimensions cannot be zero: {}x{}",
                width, height
            )));
        }
        Ok(Self { width, height })
    }

    /// The 9:16 delivery target for shorts
    pub fn vertical_hd() -> Self {
        Self {
            width: 1080,
            height: 1920,
        }
    }

    /// Parse a resolution string such as `1080x1920`
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        let trimmed = value.trim();
        let (w, h) = trimmed
            .split_once(|c| c == 'x' || c == 'X')
            .ok_or_else(|| {
                DomainError::BadArgs(format!(
                    "Invalid resolution '{}'. Expected WIDTHxHEIGHT, e.g. 1080x1920",
                    value
                ))
            })?;

        let width = w
            .trim()
            .parse::<u32>()
            .map_err(|_| DomainError::BadArgs(format!("Invalid resolution width: {}", w)))?;
        let height = h
            .trim()
            .parse::<u32>()
            .map_err(|_| DomainError::BadArgs(format!("Invalid resolution height: {}", h)))?;

        Self::new(width, height)
    }

    /// Width divided by height
    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl TryFrom<String> for Resolution {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Resolution> for String {
    fn from(value: Resolution) -> Self {
        value.to_string()
    }
}

/// Probe result for a media file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaInfo {
    pub path: PathBuf,
    /// Container duration in seconds
    pub duration: f64,
    pub width: u32,
    pub height: u32,
    pub frame_rate: f64,
    pub has_audio: bool,
    pub file_size: u64,
}

impl MediaInfo {
    /// Frame dimensions of the primary video stream
    pub fn resolution(&self) -> Result<Resolution, DomainError> {
        Resolution::new(self.width, self.height).map_err(|_| {
            DomainError::ProbeFail(format!(
                "No usable video stream in {}",
                self.path.display()
            ))
        })
    }
}

/// A downloaded source clip in the scratch area
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceVideo {
    pub path: PathBuf,
    pub file_size: u64,
    pub duration: f64,
    pub resolution: Resolution,
    pub has_audio: bool,
}

impl SourceVideo {
    /// Build a source video from its probe result
    pub fn from_media_info(info: MediaInfo) -> Result<Self, DomainError> {
        let resolution = info.resolution()?;
        if info.duration <= 0.0 {
            return Err(DomainError::ProbeFail(format!(
                "Source has no measurable duration: {}",
                info.path.display()
            )));
        }

        Ok(Self {
            path: info.path,
            file_size: info.file_size,
            duration: info.duration,
            resolution,
            has_audio: info.has_audio,
        })
    }
}

/// Pixel rectangle cut out of a source frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CropWindow {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Pure description of one cut: where to read and how to normalize
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentPlan {
    pub source: PathBuf,
    /// Start offset in seconds
    pub start: f64,
    /// Length in seconds
    pub duration: f64,
    pub crop: CropWindow,
    pub target: Resolution,
    pub frame_rate: u32,
    pub source_has_audio: bool,
}

impl SegmentPlan {
    /// End offset in seconds
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// A rendered, normalized segment. Owns its intermediate file, which is
/// deleted when the segment is dropped or released.
#[derive(Debug)]
pub struct Segment {
    plan: SegmentPlan,
    file: TempPath,
    overlay: Option<OverlayText>,
}

impl Segment {
    pub fn new(plan: SegmentPlan, file: TempPath) -> Self {
        Self {
            plan,
            file,
            overlay: None,
        }
    }

    pub fn plan(&self) -> &SegmentPlan {
        &self.plan
    }

    /// Path of the rendered intermediate file
    pub fn path(&self) -> &Path {
        &self.file
    }

    pub fn duration(&self) -> f64 {
        self.plan.duration
    }

    /// Overlay burned into this segment, if any
    pub fn overlay(&self) -> Option<&OverlayText> {
        self.overlay.as_ref()
    }

    /// Swap in a composited rendering; the previous file is deleted
    pub fn with_overlay(self, file: TempPath, overlay: OverlayText) -> Self {
        Self {
            plan: self.plan,
            file,
            overlay: Some(overlay),
        }
    }

    /// Delete the intermediate file now instead of at drop
    pub fn release(self) -> std::io::Result<()> {
        self.file.close()
    }
}

/// Vertical anchor for overlay text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextPosition {
    Top,
    Center,
    Bottom,
}

impl TextPosition {
    pub const ALL: [TextPosition; 3] = [TextPosition::Top, TextPosition::Center, TextPosition::Bottom];

    /// Parse position from string
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        match value.trim().to_lowercase().as_str() {
            "top" => Ok(TextPosition::Top),
            "center" | "centre" | "middle" => Ok(TextPosition::Center),
            "bottom" => Ok(TextPosition::Bottom),
            _ => Err(DomainError::BadArgs(format!(
                "Invalid text position: {}. Valid positions: top, center, bottom",
                value
            ))),
        }
    }
}

impl fmt::Display for TextPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextPosition::Top => write!(f, "top"),
            TextPosition::Center => write!(f, "center"),
            TextPosition::Bottom => write!(f, "bottom"),
        }
    }
}

/// Text burned into a segment for its full duration
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayText {
    pub text: String,
    pub position: TextPosition,
}

impl OverlayText {
    pub fn new(text: impl Into<String>, position: TextPosition) -> Self {
        Self {
            text: text.into(),
            position,
        }
    }
}

/// Static styling for overlay text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextStyle {
    /// Font family name or path to a font file
    pub font: String,
    pub font_size: u32,
    pub color: String,
    pub stroke_color: String,
    pub stroke_width: u32,
    pub align: String,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font: "Arial-Bold".to_string(),
            font_size: 70,
            color: "white".to_string(),
            stroke_color: "black".to_string(),
            stroke_width: 3,
            align: "center".to_string(),
        }
    }
}

impl TextStyle {
    /// Whether `font` points at a font file rather than a family name
    pub fn font_is_file(&self) -> bool {
        let lower = self.font.to_lowercase();
        self.font.contains('/')
            || self.font.contains('\\')
            || lower.ends_with(".ttf")
            || lower.ends_with(".otf")
    }

    /// Line advance in pixels for wrapped text
    pub fn line_height(&self) -> u32 {
        (self.font_size as f64 * 1.2).round() as u32
    }
}

/// Final encode parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeSettings {
    pub video_codec: String,
    pub audio_codec: String,
    pub preset: String,
    pub threads: usize,
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self {
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            preset: "medium".to_string(),
            threads: 4,
        }
    }
}

/// An encoded mashup in the output directory
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedVideo {
    pub path: PathBuf,
    pub duration: f64,
    pub resolution: Resolution,
    pub frame_rate: f64,
    pub file_size: u64,
    pub segment_count: usize,
}

impl GeneratedVideo {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// Snapshot of a generation session, as exposed by the status surface
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStatus {
    pub generating: bool,
    pub last_generation: Option<DateTime<Utc>>,
    pub total_generated: u64,
    pub errors: Vec<String>,
    pub source_videos: usize,
}

/// Outcome of a bulk delete
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub deleted: usize,
    pub failed: usize,
    pub freed_bytes: u64,
}

impl CleanupReport {
    /// Combine two reports
    pub fn merge(mut self, other: CleanupReport) -> Self {
        self.deleted += other.deleted;
        self.failed += other.failed;
        self.freed_bytes += other.freed_bytes;
        self
    }
}
