// In-memory ports for interactor tests; no external tools required

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use crate::adapters::FsLocalAdapter;
use crate::app::container::DefaultAppContainer;
use crate::config::AppConfig;
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::OUTPUT_PREFIX;
use crate::ports::*;

/// Probe that reports a fixed 1920x1080 clip unless told otherwise
pub struct FakeProbe {
    pub default_duration: f64,
    durations: Mutex<HashMap<PathBuf, f64>>,
    failing: Mutex<HashSet<PathBuf>>,
}

impl FakeProbe {
    pub fn new(default_duration: f64) -> Self {
        Self {
            default_duration,
            durations: Mutex::new(HashMap::new()),
            failing: Mutex::new(HashSet::new()),
        }
    }

    pub fn set_duration(&self, path: impl Into<PathBuf>, duration: f64) {
        self.durations.lock().unwrap().insert(path.into(), duration);
    }

    pub fn fail_on(&self, path: impl Into<PathBuf>) {
        self.failing.lock().unwrap().insert(path.into());
    }
}

#[async_trait]
impl ProbePort for FakeProbe {
    async fn probe_media(&self, file_path: &Path) -> Result<MediaInfo, DomainError> {
        let is_output = file_path
            .file_name()
            .map(|n| n.to_string_lossy().starts_with(OUTPUT_PREFIX))
            .unwrap_or(false);
        // placeholder encodes are text files, so they cannot be measured
        if is_output || self.failing.lock().unwrap().contains(file_path) {
            return Err(DomainError::ProbeFail(format!(
                "corrupt: {}",
                file_path.display()
            )));
        }
        let metadata = std::fs::metadata(file_path)
            .map_err(|e| DomainError::FsFail(e.to_string()))?;
        let duration = self
            .durations
            .lock()
            .unwrap()
            .get(file_path)
            .copied()
            .unwrap_or(self.default_duration);

        Ok(MediaInfo {
            path: file_path.to_path_buf(),
            duration,
            width: 1920,
            height: 1080,
            frame_rate: 30.0,
            has_audio: true,
            file_size: metadata.len(),
        })
    }
}

/// Source that writes small placeholder files
#[derive(Default)]
pub struct FakeSource {
    pub searches: Mutex<Vec<(String, usize)>>,
    failing_keywords: Mutex<HashSet<String>>,
}

impl FakeSource {
    pub fn fail_keyword(&self, keyword: &str) {
        self.failing_keywords
            .lock()
            .unwrap()
            .insert(keyword.to_string());
    }
}

#[async_trait]
impl SourcePort for FakeSource {
    async fn fetch_search(
        &self,
        keyword: &str,
        max_results: usize,
        _max_duration: f64,
        dest_dir: &Path,
    ) -> Result<Vec<PathBuf>, DomainError> {
        self.searches
            .lock()
            .unwrap()
            .push((keyword.to_string(), max_results));
        if self.failing_keywords.lock().unwrap().contains(keyword) {
            return Err(DomainError::DownloadFail(format!("blocked: {}", keyword)));
        }

        let slug = keyword.replace(' ', "_");
        let mut files = Vec::new();
        for i in 0..max_results {
            let path = dest_dir.join(format!("{}_{}.mp4", slug, i));
            std::fs::write(&path, format!("source {} {}", keyword, i))
                .map_err(|e| DomainError::FsFail(e.to_string()))?;
            files.push(path);
        }
        Ok(files)
    }

    async fn fetch_url(&self, url: &str, dest_dir: &Path) -> Result<PathBuf, DomainError> {
        let name = url.rsplit('/').next().unwrap_or("clip");
        let path = dest_dir.join(format!("{}.mp4", name));
        std::fs::write(&path, url).map_err(|e| DomainError::FsFail(e.to_string()))?;
        Ok(path)
    }
}

/// Renderer that writes text files describing what it was asked to do
#[derive(Default)]
pub struct FakeRender {
    pub segments: Mutex<Vec<SegmentPlan>>,
    pub overlays: Mutex<Vec<OverlayLayout>>,
    pub encodes: Mutex<Vec<Vec<PathBuf>>>,
    pub fail_segments_from: Mutex<HashSet<PathBuf>>,
    pub fail_overlay: Mutex<bool>,
    pub fail_encode: Mutex<bool>,
    pub encode_delay: Mutex<Option<Duration>>,
    pub encode_count: AtomicUsize,
}

impl FakeRender {
    pub fn set_fail_overlay(&self, fail: bool) {
        *self.fail_overlay.lock().unwrap() = fail;
    }

    pub fn set_fail_encode(&self, fail: bool) {
        *self.fail_encode.lock().unwrap() = fail;
    }

    pub fn fail_segments_from(&self, source: impl Into<PathBuf>) {
        self.fail_segments_from.lock().unwrap().insert(source.into());
    }
}

#[async_trait]
impl RenderPort for FakeRender {
    async fn render_segment(&self, plan: &SegmentPlan, output: &Path) -> Result<(), DomainError> {
        self.segments.lock().unwrap().push(plan.clone());
        if self.fail_segments_from.lock().unwrap().contains(&plan.source) {
            return Err(DomainError::RenderFail("decoder error".to_string()));
        }
        std::fs::write(
            output,
            format!("segment {} {:.3} {:.3}\n", plan.source.display(), plan.start, plan.duration),
        )
        .map_err(|e| DomainError::FsFail(e.to_string()))
    }

    async fn render_overlay(
        &self,
        input: &Path,
        layout: &OverlayLayout,
        _style: &TextStyle,
        output: &Path,
    ) -> Result<(), DomainError> {
        self.overlays.lock().unwrap().push(layout.clone());
        if *self.fail_overlay.lock().unwrap() {
            return Err(DomainError::RenderFail("font not found".to_string()));
        }
        let mut content =
            std::fs::read_to_string(input).map_err(|e| DomainError::FsFail(e.to_string()))?;
        content.push_str(&format!("overlay {}\n", layout.lines.join(" ")));
        std::fs::write(output, content).map_err(|e| DomainError::FsFail(e.to_string()))
    }

    async fn concat_encode(
        &self,
        inputs: &[PathBuf],
        _settings: &EncodeSettings,
        _frame_rate: u32,
        output: &Path,
    ) -> Result<(), DomainError> {
        let delay = *self.encode_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.encodes.lock().unwrap().push(inputs.to_vec());
        self.encode_count.fetch_add(1, Ordering::SeqCst);

        let mut content = String::new();
        for input in inputs {
            content.push_str(
                &std::fs::read_to_string(input).map_err(|e| DomainError::FsFail(e.to_string()))?,
            );
        }
        // partial output left behind, as a real encoder would
        std::fs::write(output, &content).map_err(|e| DomainError::FsFail(e.to_string()))?;
        if *self.fail_encode.lock().unwrap() {
            return Err(DomainError::RenderFail("encoder crashed".to_string()));
        }
        Ok(())
    }
}

/// Fully wired container over fake ports and temporary directories
pub struct Harness {
    pub dir: TempDir,
    pub config: AppConfig,
    pub probe: Arc<FakeProbe>,
    pub source: Arc<FakeSource>,
    pub render: Arc<FakeRender>,
    pub container: DefaultAppContainer,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    pub fn with_config(adjust: impl FnOnce(&mut AppConfig)) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig {
            output_dir: dir.path().join("output"),
            temp_dir: dir.path().join("temp"),
            source_batch_size: 6,
            ..AppConfig::default()
        };
        adjust(&mut config);

        let probe = Arc::new(FakeProbe::new(30.0));
        let source = Arc::new(FakeSource::default());
        let render = Arc::new(FakeRender::default());
        let container = DefaultAppContainer::with_ports(
            &config,
            Arc::clone(&probe) as Arc<dyn ProbePort>,
            Arc::clone(&source) as Arc<dyn SourcePort>,
            Arc::clone(&render) as Arc<dyn RenderPort>,
            Arc::new(FsLocalAdapter::new()) as Arc<dyn FsPort>,
            Some(0x5eed),
        );

        Self {
            dir,
            config,
            probe,
            source,
            render,
            container,
        }
    }

    /// Write `count` placeholder sources into the scratch area
    pub fn write_sources(&self, count: usize, duration: f64) -> Vec<SourceVideo> {
        std::fs::create_dir_all(&self.config.temp_dir).unwrap();
        (0..count)
            .map(|i| {
                let path = self.config.temp_dir.join(format!("src_{}.mp4", i));
                std::fs::write(&path, format!("source {}", i)).unwrap();
                self.probe.set_duration(&path, duration);
                SourceVideo {
                    path,
                    file_size: 8,
                    duration,
                    resolution: Resolution::new(1920, 1080).unwrap(),
                    has_audio: true,
                }
            })
            .collect()
    }

    /// Files left in the scratch area
    pub fn scratch_files(&self) -> Vec<PathBuf> {
        list(&self.config.temp_dir)
    }

    /// Files in the output directory
    pub fn output_files(&self) -> Vec<PathBuf> {
        list(&self.config.output_dir)
    }
}

fn list(dir: &Path) -> Vec<PathBuf> {
    match std::fs::read_dir(dir) {
        Ok(entries) => {
            let mut files: Vec<PathBuf> = entries
                .filter_map(Result::ok)
                .map(|e| e.path())
                .filter(|p| p.is_file())
                .collect();
            files.sort();
            files
        }
        Err(_) => Vec::new(),
    }
}
