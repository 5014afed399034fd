//! Runtime configuration
//!
//! Resolved from built-in defaults, an optional TOML file and environment
//! variables. See `config_initialization` for the precedence rules.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;
use crate::domain::model::{EncodeSettings, Resolution, TextStyle};

pub const DEFAULT_KEYWORDS: &[&str] = &[
    "courage motivation",
    "mental strength",
    "believe in yourself",
    "overcome fear",
    "stay strong motivation",
    "never give up",
    "build confidence",
    "mental toughness",
    "face your fears",
    "self belief motivation",
];

pub const DEFAULT_QUOTES: &[&str] = &[
    "Courage is not the absence of fear, but the triumph over it.",
    "Your mental strength is your greatest asset.",
    "Believe in yourself and magic will happen.",
    "The only limit is the one you set yourself.",
    "Mental toughness is built through small daily wins.",
    "You are stronger than you think.",
    "Fear is temporary, regret is forever.",
    "Push yourself because no one else will do it for you.",
    "Great things never come from comfort zones.",
    "Your mindset determines your success.",
    "Embrace the struggle, it's building you.",
    "Courage isn't having the strength to go on, it's going on when you don't have strength.",
    "Mental strength is the foundation of all achievement.",
    "Believe you can and you're halfway there.",
    "The harder you work for something, the greater you'll feel when you achieve it.",
];

/// Separator for list-valued keyword overrides
pub const KEYWORD_SEPARATOR: char = ',';

/// Separator for list-valued quote overrides (quotes contain commas)
pub const QUOTE_SEPARATOR: char = '|';

/// External executables the pipeline shells out to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolPaths {
    pub ffmpeg: String,
    pub ffprobe: String,
    pub yt_dlp: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
            yt_dlp: "yt-dlp".to_string(),
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Finished mashups
    pub output_dir: PathBuf,
    /// Scratch area for downloaded sources and intermediate segments
    pub temp_dir: PathBuf,
    /// Shortest mashup in seconds
    pub min_video_length: u32,
    /// Longest mashup in seconds
    pub max_video_length: u32,
    pub clips_per_video: usize,
    pub generation_interval_hours: u64,
    pub video_resolution: Resolution,
    pub frame_rate: u32,
    /// Sources collected when a session starts empty
    pub source_batch_size: usize,
    /// Keywords sampled per collection batch
    pub keywords_per_batch: usize,
    /// Longest accepted source clip in seconds
    pub max_source_duration: u32,
    pub keywords: Vec<String>,
    pub quotes: Vec<String>,
    pub text_style: TextStyle,
    pub encoder: EncodeSettings,
    pub tools: ToolPaths,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./output"),
            temp_dir: PathBuf::from("./temp"),
            min_video_length: 15,
            max_video_length: 60,
            clips_per_video: 3,
            generation_interval_hours: 1,
            video_resolution: Resolution::vertical_hd(),
            frame_rate: 30,
            source_batch_size: 20,
            keywords_per_batch: 3,
            max_source_duration: 60,
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            quotes: DEFAULT_QUOTES.iter().map(|q| q.to_string()).collect(),
            text_style: TextStyle::default(),
            encoder: EncodeSettings {
                threads: num_cpus::get().clamp(1, 4),
                ..EncodeSettings::default()
            },
            tools: ToolPaths::default(),
        }
    }
}

impl AppConfig {
    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) -> Result<usize, DomainError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a key lookup. Returns how many keys were applied.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<usize, DomainError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut applied = 0;
        let mut take = |key: &str| {
            let value = lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
            if value.is_some() {
                applied += 1;
            }
            value
        };

        if let Some(v) = take("OUTPUT_DIR") {
            self.output_dir = PathBuf::from(v);
        }
        if let Some(v) = take("TEMP_DIR") {
            self.temp_dir = PathBuf::from(v);
        }
        if let Some(v) = take("MAX_VIDEO_LENGTH") {
            self.max_video_length = parse_number("MAX_VIDEO_LENGTH", &v)?;
        }
        if let Some(v) = take("MIN_VIDEO_LENGTH") {
            self.min_video_length = parse_number("MIN_VIDEO_LENGTH", &v)?;
        }
        if let Some(v) = take("CLIPS_PER_VIDEO") {
            self.clips_per_video = parse_number("CLIPS_PER_VIDEO", &v)?;
        }
        if let Some(v) = take("GENERATION_INTERVAL_HOURS") {
            self.generation_interval_hours = parse_number("GENERATION_INTERVAL_HOURS", &v)?;
        }
        if let Some(v) = take("VIDEO_RESOLUTION") {
            self.video_resolution = Resolution::parse(&v)?;
        }
        if let Some(v) = take("FRAME_RATE") {
            self.frame_rate = parse_number("FRAME_RATE", &v)?;
        }
        if let Some(v) = take("SOURCE_BATCH_SIZE") {
            self.source_batch_size = parse_number("SOURCE_BATCH_SIZE", &v)?;
        }
        if let Some(v) = take("KEYWORDS_PER_BATCH") {
            self.keywords_per_batch = parse_number("KEYWORDS_PER_BATCH", &v)?;
        }
        if let Some(v) = take("MAX_SOURCE_DURATION") {
            self.max_source_duration = parse_number("MAX_SOURCE_DURATION", &v)?;
        }
        if let Some(v) = take("REELMASH_KEYWORDS") {
            self.keywords = split_list(&v, KEYWORD_SEPARATOR);
        }
        if let Some(v) = take("REELMASH_QUOTES") {
            self.quotes = split_list(&v, QUOTE_SEPARATOR);
        }
        if let Some(v) = take("FFMPEG_BIN") {
            self.tools.ffmpeg = v;
        }
        if let Some(v) = take("FFPROBE_BIN") {
            self.tools.ffprobe = v;
        }
        if let Some(v) = take("YTDLP_BIN") {
            self.tools.yt_dlp = v;
        }

        Ok(applied)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.min_video_length == 0 {
            return Err(DomainError::BadArgs(
                "min_video_length must be greater than zero".to_string(),
            ));
        }
        if self.min_video_length > self.max_video_length {
            return Err(DomainError::BadArgs(format!(
                "min_video_length ({}) cannot exceed max_video_length ({})",
                self.min_video_length, self.max_video_length
            )));
        }
        if self.clips_per_video == 0 {
            return Err(DomainError::BadArgs(
                "clips_per_video must be at least 1".to_string(),
            ));
        }
        if self.frame_rate == 0 {
            return Err(DomainError::BadArgs(
                "frame_rate must be greater than zero".to_string(),
            ));
        }
        if self.generation_interval_hours == 0 {
            return Err(DomainError::BadArgs(
                "generation_interval_hours must be at least 1".to_string(),
            ));
        }
        if self.keywords.is_empty() {
            return Err(DomainError::BadArgs("keyword list is empty".to_string()));
        }
        if self.quotes.is_empty() {
            return Err(DomainError::BadArgs("quote list is empty".to_string()));
        }
        if self.max_source_duration == 0 {
            return Err(DomainError::BadArgs(
                "max_source_duration must be greater than zero".to_string(),
            ));
        }
        if self.text_style.font_size == 0 {
            return Err(DomainError::BadArgs(
                "text_style.font_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, DomainError> {
    value
        .parse::<T>()
        .map_err(|_| DomainError::BadArgs(format!("Invalid value for {}: {}", key, value)))
}

fn split_list(value: &str, separator: char) -> Vec<String> {
    value
        .split(separator)
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}
