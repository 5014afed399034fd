//! yt-dlp source adapter
//!
//! Searches and downloads short clips with the external `yt-dlp` tool. The
//! final location of each finished download is read back from
//! `--print after_move:filepath`.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::domain::errors::*;
use crate::ports::*;

/// Container preference for downloads; vertical sources up to 1920 tall
const FORMAT_SELECTOR: &str = "best[height<=1920][ext=mp4]/best[height<=1920]/best";

/// Output name template inside the scratch directory
const OUTPUT_TEMPLATE: &str = "%(id)s.%(ext)s";

/// yt-dlp based source adapter
pub struct YtDlpAdapter {
    binary: String,
}

impl YtDlpAdapter {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    async fn run(&self, args: &[String]) -> Result<std::process::Output, DomainError> {
        debug!("Running yt-dlp: {} {}", self.binary, args.join(" "));
        Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| DomainError::DownloadFail(format!("Failed to start {}: {}", self.binary, e)))
    }
}

/// Search query: the `shorts` suffix biases results towards vertical clips
pub fn search_query(keyword: &str, max_results: usize) -> String {
    format!("ytsearch{}:{} shorts", max_results, keyword.trim())
}

/// Arguments for a duration-filtered search download
pub fn build_search_args(
    keyword: &str,
    max_results: usize,
    max_duration: f64,
    dest_dir: &Path,
) -> Vec<String> {
    let mut args = common_args(dest_dir);
    args.extend([
        "--match-filter".to_string(),
        format!("duration <= {}", max_duration.floor() as u64),
        "--max-downloads".to_string(),
        max_results.to_string(),
        "--".to_string(),
        search_query(keyword, max_results),
    ]);
    args
}

/// Arguments for a single explicit URL
pub fn build_url_args(url: &str, dest_dir: &Path) -> Vec<String> {
    let mut args = common_args(dest_dir);
    args.extend([
        "--no-playlist".to_string(),
        "--".to_string(),
        url.to_string(),
    ]);
    args
}

fn common_args(dest_dir: &Path) -> Vec<String> {
    vec![
        "-f".to_string(),
        FORMAT_SELECTOR.to_string(),
        "-o".to_string(),
        dest_dir.join(OUTPUT_TEMPLATE).to_string_lossy().to_string(),
        "--restrict-filenames".to_string(),
        "--no-simulate".to_string(),
        "--print".to_string(),
        "after_move:filepath".to_string(),
        "--no-warnings".to_string(),
    ]
}

/// Files reported by `--print after_move:filepath` that exist on disk
pub fn downloaded_files(stdout: &str) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = Vec::new();
    for line in stdout.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let path = PathBuf::from(line);
        if path.is_file() && !files.contains(&path) {
            files.push(path);
        }
    }
    files
}

#[async_trait]
impl SourcePort for YtDlpAdapter {
    async fn fetch_search(
        &self,
        keyword: &str,
        max_results: usize,
        max_duration: f64,
        dest_dir: &Path,
    ) -> Result<Vec<PathBuf>, DomainError> {
        if max_results == 0 {
            return Ok(Vec::new());
        }

        info!("Searching sources for '{}' (max {})", keyword, max_results);
        let args = build_search_args(keyword, max_results, max_duration, dest_dir);
        let output = self.run(&args).await?;
        let files = downloaded_files(&String::from_utf8_lossy(&output.stdout));

        // --max-downloads ends with a non-zero status once the cap is hit, and
        // single item failures do too; whatever reached disk still counts
        if !output.status.success() {
            if files.is_empty() {
                return Err(DomainError::DownloadFail(format!(
                    "yt-dlp search for '{}' failed: {}",
                    keyword,
                    String::from_utf8_lossy(&output.stderr).trim()
                )));
            }
            warn!(
                "yt-dlp exited with {} for '{}', keeping {} downloaded file(s)",
                output.status,
                keyword,
                files.len()
            );
        }

        Ok(files)
    }

    async fn fetch_url(&self, url: &str, dest_dir: &Path) -> Result<PathBuf, DomainError> {
        if url.trim().is_empty() || url.starts_with('-') {
            return Err(DomainError::BadArgs(format!("Invalid URL: '{}'", url)));
        }

        info!("Downloading {}", url);
        let output = self.run(&build_url_args(url, dest_dir)).await?;
        let files = downloaded_files(&String::from_utf8_lossy(&output.stdout));

        match files.into_iter().next() {
            Some(path) => Ok(path),
            None => Err(DomainError::DownloadFail(format!(
                "yt-dlp produced no file for {}: {}",
                url,
                String::from_utf8_lossy(&output.stderr).trim()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_query() {
        assert_eq!(
            search_query(" never give up ", 7),
            "ytsearch7:never give up shorts"
        );
    }

    #[test]
    fn test_search_args_carry_filters() {
        let args = build_search_args("courage", 5, 60.0, Path::new("/scratch"));
        let joined = args.join(" ");
        assert!(joined.contains("--match-filter duration <= 60"));
        assert!(joined.contains("--max-downloads 5"));
        assert!(joined.contains("/scratch/%(id)s.%(ext)s"));
        assert!(joined.contains("after_move:filepath"));
        assert_eq!(args.last().unwrap(), "ytsearch5:courage shorts");
        assert_eq!(args[args.len() - 2], "--");
    }

    #[test]
    fn test_url_args() {
        let args = build_url_args("https://example.com/v/1", Path::new("dl"));
        assert!(args.contains(&"--no-playlist".to_string()));
        assert_eq!(args.last().unwrap(), "https://example.com/v/1");
    }

    #[test]
    fn test_downloaded_files_keeps_existing_unique_paths() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.mp4");
        std::fs::write(&a, b"x").unwrap();
        let missing = dir.path().join("gone.webm");

        let stdout = format!(
            "{}\n\n{}\n{}\n",
            a.display(),
            missing.display(),
            a.display()
        );
        assert_eq!(downloaded_files(&stdout), vec![a]);
    }

    #[tokio::test]
    async fn test_zero_results_skips_process() {
        let adapter = YtDlpAdapter::new("/nonexistent/yt-dlp");
        let files = adapter
            .fetch_search("courage", 0, 60.0, Path::new("."))
            .await
            .unwrap();
        assert!(files.is_empty());
    }

    #[tokio::test]
    async fn test_rejects_option_like_url() {
        let adapter = YtDlpAdapter::new("yt-dlp");
        let err = adapter
            .fetch_url("--exec=rm", Path::new("."))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::BadArgs(_)));
    }
}
