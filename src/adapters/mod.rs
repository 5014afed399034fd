// Adapters - External system implementations

pub mod exec_ffmpeg;
pub mod fetch_ytdlp;
pub mod fs_local;
pub mod probe_ffprobe;
#[cfg(feature = "libav")]
pub mod probe_libav;
pub mod toml_config;

// Re-export adapters
pub use exec_ffmpeg::FFmpegAdapter;
pub use fetch_ytdlp::YtDlpAdapter;
pub use fs_local::FsLocalAdapter;
pub use probe_ffprobe::FFprobeAdapter;
#[cfg(feature = "libav")]
pub use probe_libav::ProbeLibavAdapter;
pub use toml_config::TomlConfigAdapter;
