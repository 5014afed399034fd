//! FFmpeg execution adapter
//!
//! Renders normalized segments, burns overlay text and performs the final
//! concatenate-and-encode step by shelling out to the `ffmpeg` binary.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::{VerticalNormalizer, TEXT_MARGIN_PX};
use crate::ports::*;

/// Encoder preset for intermediate segments, favouring speed
const INTERMEDIATE_PRESET: &str = "veryfast";
/// Quality for intermediate segments; re-encoded once more at the end
const INTERMEDIATE_CRF: &str = "18";
const AUDIO_SAMPLE_RATE: &str = "44100";
const AUDIO_CHANNELS: &str = "2";
/// Trailing stderr lines kept in error messages
const STDERR_TAIL_LINES: usize = 8;

/// Builder for FFmpeg invocations with one or more inputs
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Per-input arguments, each ending with `-i <source>`
    inputs: Vec<Vec<String>>,
    output: PathBuf,
    output_args: Vec<String>,
    overwrite: bool,
    log_level: String,
}

impl FfmpegCommand {
    pub fn new(output: impl AsRef<Path>) -> Self {
        Self {
            inputs: Vec::new(),
            output: output.as_ref().to_path_buf(),
            output_args: Vec::new(),
            overwrite: true,
            log_level: "error".to_string(),
        }
    }

    /// Add a plain file input
    pub fn input(self, source: impl AsRef<Path>) -> Self {
        let source = source.as_ref().to_string_lossy().to_string();
        self.input_with(Vec::<String>::new(), source)
    }

    /// Add an input preceded by input options such as `-ss` or `-f`
    pub fn input_with<I, S>(mut self, args: I, source: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut input: Vec<String> = args.into_iter().map(Into::into).collect();
        input.push("-i".to_string());
        input.push(source.into());
        self.inputs.push(input);
        self
    }

    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn video_filter(self, filter: impl Into<String>) -> Self {
        self.output_arg("-vf").output_arg(filter)
    }

    pub fn map(self, stream: impl Into<String>) -> Self {
        self.output_arg("-map").output_arg(stream)
    }

    pub fn video_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:v").output_arg(codec)
    }

    pub fn audio_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:a").output_arg(codec)
    }

    pub fn preset(self, preset: impl Into<String>) -> Self {
        self.output_arg("-preset").output_arg(preset)
    }

    pub fn crf(self, crf: impl Into<String>) -> Self {
        self.output_arg("-crf").output_arg(crf)
    }

    pub fn frame_rate(self, fps: u32) -> Self {
        self.output_arg("-r").output_arg(fps.to_string())
    }

    pub fn threads(self, threads: usize) -> Self {
        self.output_arg("-threads").output_arg(threads.max(1).to_string())
    }

    /// Limit output duration in seconds
    pub fn duration(self, seconds: f64) -> Self {
        self.output_arg("-t").output_arg(format!("{:.3}", seconds))
    }

    /// Stereo audio at a fixed sample rate, so segments concatenate cleanly
    pub fn normalized_audio(self) -> Self {
        self.output_args(["-ar", AUDIO_SAMPLE_RATE, "-ac", AUDIO_CHANNELS])
    }

    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Build the argument vector
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.overwrite {
            args.push("-y".to_string());
        }
        args.push("-hide_banner".to_string());
        args.push("-v".to_string());
        args.push(self.log_level.clone());

        for input in &self.inputs {
            args.extend(input.iter().cloned());
        }

        args.extend(self.output_args.iter().cloned());
        args.push(self.output.to_string_lossy().to_string());

        args
    }
}

/// FFmpeg-based render adapter
pub struct FFmpegAdapter {
    binary: String,
}

impl FFmpegAdapter {
    /// Create new FFmpeg adapter for the given executable
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Run a built command, mapping failures to `RenderFail`
    async fn run(&self, command: &FfmpegCommand) -> Result<(), DomainError> {
        let args = command.build_args();
        debug!("Running FFmpeg: {} {}", self.binary, args.join(" "));

        let output = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                DomainError::RenderFail(format!("Failed to start {}: {}", self.binary, e))
            })?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(DomainError::RenderFail(format!(
                "ffmpeg exited with {}: {}",
                output.status,
                stderr_tail(&stderr)
            )))
        }
    }

    /// Scratch file next to `output`, removed when the handle drops
    fn sidecar_file(output: &Path, suffix: &str) -> Result<tempfile::NamedTempFile, DomainError> {
        let dir = output
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        tempfile::Builder::new()
            .prefix(".reelmash_")
            .suffix(suffix)
            .tempfile_in(dir)
            .map_err(|e| DomainError::FsFail(format!("Failed to create scratch file: {}", e)))
    }
}

#[async_trait]
impl RenderPort for FFmpegAdapter {
    async fn render_segment(&self, plan: &SegmentPlan, output: &Path) -> Result<(), DomainError> {
        let source = plan.source.to_string_lossy().to_string();
        let mut command = FfmpegCommand::new(output).input_with(
            [
                "-ss".to_string(),
                format!("{:.3}", plan.start),
                "-t".to_string(),
                format!("{:.3}", plan.duration),
            ],
            source,
        );

        let audio_map = if plan.source_has_audio {
            "0:a:0"
        } else {
            command = command.input_with(["-f", "lavfi"], silence_source());
            "1:a:0"
        };

        let command = command
            .video_filter(segment_filter(plan))
            .map("0:v:0")
            .map(audio_map)
            .video_codec("libx264")
            .preset(INTERMEDIATE_PRESET)
            .crf(INTERMEDIATE_CRF)
            .output_args(["-pix_fmt", "yuv420p"])
            .audio_codec("aac")
            .normalized_audio()
            .duration(plan.duration);

        self.run(&command).await
    }

    async fn render_overlay(
        &self,
        input: &Path,
        layout: &OverlayLayout,
        style: &TextStyle,
        output: &Path,
    ) -> Result<(), DomainError> {
        if layout.lines.is_empty() {
            return Err(DomainError::BadArgs("Overlay text is empty".to_string()));
        }

        // drawtext reads each line from a file, which avoids escaping the
        // quote text itself inside the filter graph
        let mut text_files = Vec::with_capacity(layout.lines.len());
        for line in &layout.lines {
            let mut file = Self::sidecar_file(output, ".txt")?;
            std::io::Write::write_all(&mut file, line.as_bytes())
                .map_err(|e| DomainError::FsFail(format!("Failed to write overlay text: {}", e)))?;
            text_files.push(file.into_temp_path());
        }

        let paths: Vec<&Path> = text_files.iter().map(|p| &**p).collect();
        let filter = overlay_filter(layout, style, &paths);

        let command = FfmpegCommand::new(output)
            .input(input)
            .video_filter(filter)
            .video_codec("libx264")
            .preset(INTERMEDIATE_PRESET)
            .crf(INTERMEDIATE_CRF)
            .output_args(["-pix_fmt", "yuv420p"])
            .audio_codec("copy");

        self.run(&command).await
    }

    async fn concat_encode(
        &self,
        inputs: &[PathBuf],
        settings: &EncodeSettings,
        frame_rate: u32,
        output: &Path,
    ) -> Result<(), DomainError> {
        if inputs.is_empty() {
            return Err(DomainError::BadArgs(
                "Nothing to concatenate".to_string(),
            ));
        }

        let mut manifest = Self::sidecar_file(output, ".txt")?;
        std::io::Write::write_all(&mut manifest, concat_manifest(inputs)?.as_bytes())
            .map_err(|e| DomainError::FsFail(format!("Failed to write concat list: {}", e)))?;
        let manifest = manifest.into_temp_path();

        let command = FfmpegCommand::new(output)
            .input_with(
                ["-f", "concat", "-safe", "0"],
                manifest.to_string_lossy().to_string(),
            )
            .video_codec(settings.video_codec.clone())
            .preset(settings.preset.clone())
            .output_args(["-pix_fmt", "yuv420p"])
            .audio_codec(settings.audio_codec.clone())
            .normalized_audio()
            .frame_rate(frame_rate)
            .threads(settings.threads)
            .output_args(["-movflags", "+faststart"]);

        self.run(&command).await
    }
}

/// Lavfi source producing stereo silence
fn silence_source() -> String {
    format!(
        "anullsrc=channel_layout=stereo:sample_rate={}",
        AUDIO_SAMPLE_RATE
    )
}

/// Crop to the target aspect, scale to the target size, re-time
pub fn segment_filter(plan: &SegmentPlan) -> String {
    let scaled = VerticalNormalizer::scaled_size(plan.target);
    format!(
        "crop={}:{}:{}:{},scale={}:{},setsar=1,fps={}",
        plan.crop.width,
        plan.crop.height,
        plan.crop.x,
        plan.crop.y,
        scaled.width,
        scaled.height,
        plan.frame_rate
    )
}

/// One drawtext filter per wrapped line, stacked from `layout.origin_y`
pub fn overlay_filter(layout: &OverlayLayout, style: &TextStyle, text_files: &[&Path]) -> String {
    let font = if style.font_is_file() {
        format!("fontfile='{}'", escape_filter_value(&style.font))
    } else {
        format!("font='{}'", escape_filter_value(&style.font))
    };

    let x = match style.align.to_lowercase().as_str() {
        "left" => format!("{}", TEXT_MARGIN_PX / 2),
        "right" => format!("w-text_w-{}", TEXT_MARGIN_PX / 2),
        _ => "(w-text_w)/2".to_string(),
    };

    text_files
        .iter()
        .enumerate()
        .map(|(i, file)| {
            format!(
                "drawtext={}:textfile='{}':fontsize={}:fontcolor={}:borderw={}:bordercolor={}:x={}:y={}",
                font,
                escape_filter_value(&file.to_string_lossy()),
                style.font_size,
                style.color,
                style.stroke_width,
                style.stroke_color,
                x,
                layout.origin_y + i as u32 * layout.line_height
            )
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Escape a value placed inside single quotes in a filter graph
fn escape_filter_value(value: &str) -> String {
    value
        .replace('\\', "/")
        .replace('\'', "'\\''")
        .replace(':', "\\:")
}

/// Contents of an FFmpeg concat demuxer list. Paths are made absolute since
/// the demuxer resolves them relative to the list file.
pub fn concat_manifest(inputs: &[PathBuf]) -> Result<String, DomainError> {
    let mut manifest = String::new();
    for input in inputs {
        let absolute = std::path::absolute(input).map_err(|e| {
            DomainError::FsFail(format!("Cannot resolve {}: {}", input.display(), e))
        })?;
        let escaped = absolute.to_string_lossy().replace('\'', "'\\''");
        manifest.push_str(&format!("file '{}'\n", escaped));
    }
    Ok(manifest)
}

fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(has_audio: bool) -> SegmentPlan {
        SegmentPlan {
            source: PathBuf::from("/scratch/abc.mp4"),
            start: 2.5,
            duration: 7.25,
            crop: CropWindow {
                x: 656,
                y: 0,
                width: 607,
                height: 1080,
            },
            target: Resolution::vertical_hd(),
            frame_rate: 30,
            source_has_audio: has_audio,
        }
    }

    #[test]
    fn test_command_builder_orders_inputs_and_outputs() {
        let args = FfmpegCommand::new("out.mp4")
            .input_with(["-ss", "1.000"], "in.mp4")
            .input_with(["-f", "lavfi"], silence_source())
            .video_codec("libx264")
            .threads(0)
            .build_args();

        assert_eq!(args[0], "-y");
        let first_input = args.iter().position(|a| a == "in.mp4").unwrap();
        let seek = args.iter().position(|a| a == "-ss").unwrap();
        let lavfi = args.iter().position(|a| a == "lavfi").unwrap();
        let codec = args.iter().position(|a| a == "-c:v").unwrap();
        assert!(seek < first_input);
        assert!(first_input < lavfi);
        assert!(lavfi < codec);
        assert_eq!(args.last().unwrap(), "out.mp4");
        assert!(args.windows(2).any(|w| w[0] == "-threads" && w[1] == "1"));
    }

    #[test]
    fn test_segment_filter() {
        assert_eq!(
            segment_filter(&plan(true)),
            "crop=607:1080:656:0,scale=1080:1920,setsar=1,fps=30"
        );
    }

    #[test]
    fn test_overlay_filter_stacks_lines() {
        let layout = OverlayLayout {
            lines: vec!["Believe you can".to_string(), "and you're halfway".to_string()],
            origin_y: 100,
            line_height: 84,
        };
        let style = TextStyle::default();
        let a = PathBuf::from("/tmp/a.txt");
        let b = PathBuf::from("/tmp/b.txt");
        let filter = overlay_filter(&layout, &style, &[a.as_path(), b.as_path()]);

        let parts: Vec<&str> = filter.split(",drawtext=").collect();
        assert_eq!(parts.len(), 2);
        assert!(filter.starts_with("drawtext=font='Arial-Bold'"));
        assert!(parts[0].contains("y=100"));
        assert!(parts[1].contains("y=184"));
        assert!(filter.contains("fontsize=70"));
        assert!(filter.contains("borderw=3:bordercolor=black"));
        assert!(filter.contains("x=(w-text_w)/2"));
    }

    #[test]
    fn test_overlay_filter_uses_fontfile_for_paths() {
        let layout = OverlayLayout {
            lines: vec!["Stay strong".to_string()],
            origin_y: 0,
            line_height: 84,
        };
        let style = TextStyle {
            font: "C:\\Fonts\\bold.ttf".to_string(),
            align: "left".to_string(),
            ..TextStyle::default()
        };
        let file = PathBuf::from("/tmp/a.txt");
        let filter = overlay_filter(&layout, &style, &[file.as_path()]);
        assert!(filter.contains("fontfile='C\\:/Fonts/bold.ttf'"));
        assert!(filter.contains("x=50"));
    }

    #[test]
    fn test_concat_manifest_is_absolute_and_escaped() {
        let manifest = concat_manifest(&[
            PathBuf::from("/scratch/one.mp4"),
            PathBuf::from("/scratch/it's.mp4"),
        ])
        .unwrap();
        let lines: Vec<&str> = manifest.lines().collect();
        assert_eq!(lines[0], "file '/scratch/one.mp4'");
        assert_eq!(lines[1], "file '/scratch/it'\\''s.mp4'");

        let relative = concat_manifest(&[PathBuf::from("seg.mp4")]).unwrap();
        assert!(relative.starts_with("file '/"));
    }

    #[test]
    fn test_stderr_tail_keeps_last_lines() {
        let stderr: String = (0..20).map(|i| format!("line {}\n", i)).collect();
        let tail = stderr_tail(&stderr);
        assert!(tail.starts_with("line 12"));
        assert!(tail.ends_with("line 19"));
    }

    #[tokio::test]
    async fn test_missing_binary_is_render_failure() {
        let adapter = FFmpegAdapter::new("/nonexistent/ffmpeg-binary");
        let dir = tempfile::tempdir().unwrap();
        let err = adapter
            .render_segment(&plan(false), &dir.path().join("out.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::RenderFail(_)));
    }
}
