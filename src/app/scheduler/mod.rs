// Scheduler - Drives generation cycles once, periodically or continuously

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::app::session::GenerationSession;
use crate::domain::errors::*;
use crate::domain::model::*;

/// Cycles between source library refreshes
pub const REFRESH_EVERY_CYCLES: u64 = 10;

/// Totals of a scheduler run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchedulerReport {
    pub cycles: u64,
    pub videos: u64,
    pub failed_cycles: u64,
}

/// Whether the source library is refreshed before cycle `cycle` (1-based)
pub fn should_refresh(cycle: u64) -> bool {
    cycle > 1 && (cycle - 1) % REFRESH_EVERY_CYCLES == 0
}

pub struct Scheduler {
    session: Arc<GenerationSession>,
    interval: Duration,
}

impl Scheduler {
    /// `interval` is the pause between periodic cycles
    pub fn new(session: Arc<GenerationSession>, interval: Duration) -> Self {
        Self { session, interval }
    }

    /// Single cycle
    pub async fn run_once(&self, count: usize) -> Result<Vec<GeneratedVideo>, DomainError> {
        self.session.generate(count).await
    }

    /// One cycle now, then one per interval until `shutdown` flips to true
    pub async fn run_periodic(
        &self,
        count: usize,
        shutdown: watch::Receiver<bool>,
    ) -> SchedulerReport {
        info!(
            "Periodic generation every {} minute(s)",
            self.interval.as_secs() / 60
        );
        self.run_loop(count, self.interval, shutdown).await
    }

    /// Cycles back to back with `delay` between them until `shutdown` flips
    pub async fn run_continuous(
        &self,
        count: usize,
        delay: Duration,
        shutdown: watch::Receiver<bool>,
    ) -> SchedulerReport {
        info!("Continuous generation, {}s between cycles", delay.as_secs());
        self.run_loop(count, delay, shutdown).await
    }

    /// A running cycle is never interrupted; the stop signal is observed
    /// between cycles and during the pause.
    async fn run_loop(
        &self,
        count: usize,
        pause: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> SchedulerReport {
        let mut report = SchedulerReport::default();

        loop {
            let cycle = report.cycles + 1;
            if should_refresh(cycle) {
                if let Err(e) = self.session.refresh_source_library().await {
                    warn!("Source refresh failed: {}", e);
                }
            }

            info!("Cycle {} starting", cycle);
            match self.session.generate(count).await {
                Ok(videos) => {
                    report.videos += videos.len() as u64;
                    if videos.is_empty() {
                        report.failed_cycles += 1;
                    }
                }
                Err(e) => {
                    error!("Cycle {} failed: {}", cycle, e);
                    report.failed_cycles += 1;
                }
            }
            report.cycles = cycle;

            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                changed = shutdown.changed() => {
                    // sender gone counts as a stop request too
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = tokio::time::sleep(pause) => {}
            }
        }

        self.shutdown(&report).await;
        report
    }

    async fn shutdown(&self, report: &SchedulerReport) {
        info!("Scheduler stopping");
        match self.session.cleanup().await {
            Ok(cleanup) => info!("Removed {} scratch file(s)", cleanup.deleted),
            Err(e) => warn!("Scratch cleanup failed: {}", e),
        }

        let status = self.session.status();
        info!(
            "Final statistics: {} cycle(s), {} video(s) this run, {} total, {} error(s) recorded",
            report.cycles,
            report.videos,
            status.total_generated,
            status.errors.len()
        );
    }
}
