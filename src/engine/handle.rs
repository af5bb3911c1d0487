use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep};

use crate::error::{EngineError, EngineResult};
use crate::metrics::{EndpointMetrics, Report, TrendPoint, build_report};
use crate::profile::LoadProfile;
use crate::shutdown::RunSignal;

const DRAIN_POLL: Duration = Duration::from_millis(10);

/// What a finished run leaves behind.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub report: Report,
    pub trend: Vec<TrendPoint>,
    pub stopped_early: bool,
}

/// Control surface of one run. Dropping the handle does not stop the run.
pub struct RunHandle {
    pub(super) profile: LoadProfile,
    pub(super) signal: RunSignal,
    pub(super) active: Arc<AtomicUsize>,
    pub(super) metrics: Arc<EndpointMetrics>,
    pub(super) trend_tx: broadcast::Sender<TrendPoint>,
    pub(super) trend_history: Arc<Mutex<Vec<TrendPoint>>>,
    pub(super) report_rx: watch::Receiver<Report>,
    pub(super) driver: JoinHandle<RunSummary>,
}

impl RunHandle {
    #[must_use]
    pub const fn profile(&self) -> &LoadProfile {
        &self.profile
    }

    /// Cooperative and idempotent: returns `true` only for the call that
    /// stopped the run. Workers finish their in-flight iteration first.
    pub fn stop(&self) -> bool {
        self.signal.stop()
    }

    /// A clone of the run's signal, for stopping it from another task.
    #[must_use]
    pub fn stopper(&self) -> RunSignal {
        self.signal.clone()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.signal.is_running()
    }

    /// Workers whose loop has not exited yet.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn metrics(&self) -> Arc<EndpointMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Trend points emitted from now on, one per second.
    #[must_use]
    pub fn subscribe_trend(&self) -> broadcast::Receiver<TrendPoint> {
        self.trend_tx.subscribe()
    }

    /// Trend points emitted so far.
    #[must_use]
    pub fn trend(&self) -> Vec<TrendPoint> {
        self.trend_history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Periodic reports (when enabled) and the final report.
    #[must_use]
    pub fn subscribe_reports(&self) -> watch::Receiver<Report> {
        self.report_rx.clone()
    }

    /// Report over everything recorded so far.
    #[must_use]
    pub fn report(&self) -> Report {
        build_report(&self.metrics)
    }

    /// Poll the active count until it reaches zero or `grace` runs out.
    /// Returns whether every worker exited.
    pub async fn drain(&self, grace: Duration) -> bool {
        let started = Instant::now();
        loop {
            if self.active_count() == 0 {
                return true;
            }
            if started.elapsed() >= grace {
                return false;
            }
            sleep(DRAIN_POLL).await;
        }
    }

    /// Wait for the run to end and collect its summary.
    ///
    /// # Errors
    ///
    /// Returns an error when the driver task panicked or was cancelled.
    pub async fn wait(self) -> EngineResult<RunSummary> {
        self.driver
            .await
            .map_err(|source| EngineError::Driver { source })
    }
}
