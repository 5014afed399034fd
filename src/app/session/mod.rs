// Generation session - One guarded generation cycle at a time

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::app::acquire_interactor::AcquireInteractor;
use crate::app::assemble_interactor::AssembleInteractor;
use crate::domain::errors::*;
use crate::domain::model::*;

/// Error messages kept for the status surface
pub const MAX_RECORDED_ERRORS: usize = 50;

/// Holds the in-progress flag for the lifetime of one cycle. Dropping the
/// guard clears the flag, whichever way the cycle ends.
#[derive(Debug)]
pub struct CycleGuard {
    flag: Arc<AtomicBool>,
}

impl CycleGuard {
    /// Take the flag, or report `Busy` if another cycle holds it
    pub fn acquire(flag: &Arc<AtomicBool>) -> Result<Self, DomainError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| {
                DomainError::Busy("A generation cycle is already in progress".to_string())
            })?;
        Ok(Self {
            flag: Arc::clone(flag),
        })
    }
}

impl Drop for CycleGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[derive(Debug, Default)]
struct SessionState {
    sources: Vec<SourceVideo>,
    last_generation: Option<DateTime<Utc>>,
    total_generated: u64,
    errors: VecDeque<String>,
}

/// Coordinates acquisition and assembly across cycles
pub struct GenerationSession {
    acquirer: Arc<AcquireInteractor>,
    assembler: Arc<AssembleInteractor>,
    source_batch_size: usize,
    generating: Arc<AtomicBool>,
    state: Mutex<SessionState>,
}

impl GenerationSession {
    pub fn new(
        acquirer: Arc<AcquireInteractor>,
        assembler: Arc<AssembleInteractor>,
        source_batch_size: usize,
    ) -> Self {
        Self {
            acquirer,
            assembler,
            source_batch_size,
            generating: Arc::new(AtomicBool::new(false)),
            state: Mutex::new(SessionState::default()),
        }
    }

    pub fn is_generating(&self) -> bool {
        self.generating.load(Ordering::Acquire)
    }

    /// Run one cycle producing up to `count` videos. Rejected with `Busy`
    /// while another cycle runs.
    pub async fn generate(&self, count: usize) -> Result<Vec<GeneratedVideo>, DomainError> {
        let guard = CycleGuard::acquire(&self.generating)?;
        self.run_cycle(guard, count).await
    }

    /// Take the guard now and run the cycle on a background task, so that
    /// conflicts are reported to the caller immediately
    pub fn spawn_generate(
        self: &Arc<Self>,
        count: usize,
    ) -> Result<JoinHandle<Result<Vec<GeneratedVideo>, DomainError>>, DomainError> {
        let guard = CycleGuard::acquire(&self.generating)?;
        let session = Arc::clone(self);
        Ok(tokio::spawn(async move { session.run_cycle(guard, count).await }))
    }

    /// Collect a fresh source set if none is loaded
    pub async fn initialize_source_library(&self) -> Result<usize, DomainError> {
        let _guard = CycleGuard::acquire(&self.generating)?;
        self.load_sources().await
    }

    /// Wipe the scratch area and collect a new source set
    pub async fn refresh_source_library(&self) -> Result<usize, DomainError> {
        let _guard = CycleGuard::acquire(&self.generating)?;
        info!("Refreshing source library");
        self.acquirer.cleanup_all().await?;
        self.state().sources.clear();
        self.load_sources().await
    }

    /// Delete scratch files and forget the loaded sources
    pub async fn cleanup(&self) -> Result<CleanupReport, DomainError> {
        let _guard = CycleGuard::acquire(&self.generating)?;
        let report = self.acquirer.cleanup_all().await?;
        self.state().sources.clear();
        Ok(report)
    }

    pub fn status(&self) -> SessionStatus {
        let state = self.state();
        SessionStatus {
            generating: self.is_generating(),
            last_generation: state.last_generation,
            total_generated: state.total_generated,
            errors: state.errors.iter().cloned().collect(),
            source_videos: state.sources.len(),
        }
    }

    async fn run_cycle(
        &self,
        _guard: CycleGuard,
        count: usize,
    ) -> Result<Vec<GeneratedVideo>, DomainError> {
        info!("Generation cycle started: {} video(s) requested", count);

        if let Err(e) = self.load_sources().await {
            error!("Source collection failed: {}", e);
            self.record_error(format!("Source collection failed: {}", e));
            return Err(e);
        }

        let sources = self.state().sources.clone();
        if sources.is_empty() {
            warn!("No source videos available, nothing generated");
            self.record_error("No source videos available".to_string());
            return Ok(Vec::new());
        }

        let videos = self.assembler.create_multiple(&sources, count).await;

        {
            let mut state = self.state();
            if !videos.is_empty() {
                state.total_generated += videos.len() as u64;
                state.last_generation = Some(Utc::now());
            }
        }
        if videos.len() < count {
            self.record_error(format!(
                "Generated {} of {} requested video(s)",
                videos.len(),
                count
            ));
        }

        info!("Generation cycle finished: {} video(s)", videos.len());
        Ok(videos)
    }

    /// Collect sources when none are loaded; caller holds the guard
    async fn load_sources(&self) -> Result<usize, DomainError> {
        let loaded = self.state().sources.len();
        if loaded > 0 {
            return Ok(loaded);
        }

        let sources = self.acquirer.collect_many(self.source_batch_size).await?;
        let count = sources.len();
        self.state().sources = sources;
        Ok(count)
    }

    fn record_error(&self, message: String) {
        let mut state = self.state();
        if state.errors.len() == MAX_RECORDED_ERRORS {
            state.errors.pop_front();
        }
        state.errors.push_back(message);
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::app::testing::Harness;
    use crate::app::AppContainer;

    #[test]
    fn test_guard_is_exclusive_and_released() {
        let flag = Arc::new(AtomicBool::new(false));
        let guard = CycleGuard::acquire(&flag).unwrap();
        assert!(CycleGuard::acquire(&flag).unwrap_err().is_busy());
        drop(guard);
        assert!(!flag.load(Ordering::Acquire));
        assert!(CycleGuard::acquire(&flag).is_ok());
    }

    #[tokio::test]
    async fn test_generate_collects_then_assembles() {
        let h = Harness::new();
        let session = h.container.session();

        let videos = session.generate(2).await.unwrap();
        assert_eq!(videos.len(), 2);

        let status = session.status();
        assert!(!status.generating);
        assert_eq!(status.total_generated, 2);
        assert!(status.last_generation.is_some());
        assert!(status.errors.is_empty());
        assert_eq!(status.source_videos, 6);

        // sources are reused by the next cycle
        session.generate(1).await.unwrap();
        assert_eq!(h.source.searches.lock().unwrap().len(), 3);
        assert_eq!(session.status().total_generated, 3);
    }

    #[tokio::test]
    async fn test_no_sources_is_recorded() {
        let h = Harness::with_config(|c| {
            c.keywords = vec!["blocked".to_string()];
        });
        h.source.fail_keyword("blocked");
        let session = h.container.session();

        let videos = session.generate(1).await.unwrap();
        assert!(videos.is_empty());
        let status = session.status();
        assert!(!status.generating);
        assert_eq!(status.total_generated, 0);
        assert_eq!(status.errors, vec!["No source videos available".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_cycle_clears_flag_and_records() {
        let h = Harness::new();
        h.render.set_fail_encode(true);
        let session = h.container.session();

        let videos = session.generate(2).await.unwrap();
        assert!(videos.is_empty());
        let status = session.status();
        assert!(!status.generating);
        assert_eq!(status.errors.len(), 1);
        assert!(status.errors[0].contains("0 of 2"));
        assert!(status.last_generation.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_generate_is_rejected() {
        let h = Harness::new();
        *h.render.encode_delay.lock().unwrap() = Some(Duration::from_millis(50));
        let session = h.container.session();

        let handle = session.spawn_generate(1).unwrap();
        assert!(session.is_generating());

        let err = session.generate(1).await.unwrap_err();
        assert!(err.is_busy());
        assert!(session.spawn_generate(1).unwrap_err().is_busy());
        assert!(session.cleanup().await.unwrap_err().is_busy());

        let videos = handle.await.unwrap().unwrap();
        assert_eq!(videos.len(), 1);
        assert!(!session.is_generating());
        assert_eq!(session.status().total_generated, 1);
    }

    #[tokio::test]
    async fn test_cleanup_forgets_sources() {
        let h = Harness::new();
        let session = h.container.session();
        assert_eq!(session.initialize_source_library().await.unwrap(), 6);

        let report = session.cleanup().await.unwrap();
        assert_eq!(report.deleted, 6);
        assert_eq!(session.status().source_videos, 0);
        assert!(h.scratch_files().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_replaces_sources() {
        let h = Harness::new();
        let session = h.container.session();
        session.initialize_source_library().await.unwrap();
        assert_eq!(session.refresh_source_library().await.unwrap(), 6);
        assert_eq!(h.source.searches.lock().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_error_list_is_bounded() {
        let h = Harness::with_config(|c| {
            c.keywords = vec!["blocked".to_string()];
        });
        h.source.fail_keyword("blocked");
        let session = h.container.session();

        for _ in 0..MAX_RECORDED_ERRORS + 5 {
            session.generate(1).await.unwrap();
        }
        assert_eq!(session.status().errors.len(), MAX_RECORDED_ERRORS);
    }
}
