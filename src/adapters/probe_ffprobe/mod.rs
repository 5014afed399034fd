//! FFprobe adapter for media file probing
//!
//! Runs `ffprobe -print_format json` and reads the first video stream, the
//! presence of an audio stream and the container duration.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
    size: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    duration: Option<String>,
}

/// FFprobe-based probe adapter
pub struct FFprobeAdapter {
    binary: String,
}

impl FFprobeAdapter {
    /// Create new FFprobe adapter for the given executable
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

#[async_trait]
impl ProbePort for FFprobeAdapter {
    async fn probe_media(&self, file_path: &Path) -> Result<MediaInfo, DomainError> {
        let metadata = tokio::fs::metadata(file_path).await.map_err(|e| {
            DomainError::FsFail(format!("Cannot read {}: {}", file_path.display(), e))
        })?;

        debug!("Probing {}", file_path.display());
        let output = Command::new(&self.binary)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(file_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| DomainError::ProbeFail(format!("Failed to start {}: {}", self.binary, e)))?;

        if !output.status.success() {
            return Err(DomainError::ProbeFail(format!(
                "ffprobe rejected {}: {}",
                file_path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        parse_probe_output(file_path, &output.stdout, metadata.len())
    }
}

/// Turn ffprobe JSON into `MediaInfo`
fn parse_probe_output(path: &Path, json: &[u8], file_size: u64) -> Result<MediaInfo, DomainError> {
    let probe: FfprobeOutput = serde_json::from_slice(json)
        .map_err(|e| DomainError::ProbeFail(format!("Unreadable ffprobe output: {}", e)))?;

    let video = probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| {
            DomainError::ProbeFail(format!("No video stream in {}", path.display()))
        })?;

    let has_audio = probe
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));

    let duration = probe
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .or(video.duration.as_deref())
        .and_then(|d| d.parse::<f64>().ok())
        .unwrap_or(0.0);

    let size = probe
        .format
        .as_ref()
        .and_then(|f| f.size.as_deref())
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(file_size);

    let frame_rate = video
        .avg_frame_rate
        .as_deref()
        .and_then(parse_frame_rate)
        .or_else(|| video.r_frame_rate.as_deref().and_then(parse_frame_rate))
        .unwrap_or(0.0);

    Ok(MediaInfo {
        path: path.to_path_buf(),
        duration,
        width: video.width.unwrap_or(0),
        height: video.height.unwrap_or(0),
        frame_rate,
        has_audio,
        file_size: size,
    })
}

/// Parse a frame rate such as `30/1`, `30000/1001` or `29.97`
pub fn parse_frame_rate(value: &str) -> Option<f64> {
    let rate = match value.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => value.trim().parse().ok()?,
    };
    (rate > 0.0).then_some(rate)
}
