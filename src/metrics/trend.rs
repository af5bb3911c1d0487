use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use super::endpoint::EndpointMetrics;
use super::percentiles::{p99, sorted_copy};
use super::report::ratio_x100;

/// Trailing window each trend point summarizes.
pub const TREND_WINDOW: Duration = Duration::from_secs(1);

/// One-second aggregate of a running test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
    /// Seconds since the run started; strictly increasing per run.
    pub second: u64,
    pub unix_secs: i64,
    pub active_workers: usize,
    pub avg_response_ms: u64,
    /// Iterations that finished inside the window.
    pub qps: u64,
    pub error_percent_x100: u64,
    pub p99_ms: u64,
}

/// Turns the live timeline into trend points. It only reads the metrics, so
/// sampling never holds up a worker for longer than one short lock.
#[derive(Debug)]
pub struct TrendSampler {
    metrics: Arc<EndpointMetrics>,
    window_ms: u64,
    last_second: Option<u64>,
}

impl TrendSampler {
    #[must_use]
    pub fn new(metrics: Arc<EndpointMetrics>) -> Self {
        Self {
            metrics,
            window_ms: u64::try_from(TREND_WINDOW.as_millis()).unwrap_or(1_000),
            last_second: None,
        }
    }

    /// Sample the window ending now. Returns `None` when a point for the
    /// current second was already emitted.
    pub fn sample(&mut self, active_workers: usize) -> Option<TrendPoint> {
        let now_ms = self.metrics.elapsed_ms();
        self.sample_at(now_ms, active_workers)
    }

    pub(crate) fn sample_at(&mut self, now_ms: u64, active_workers: usize) -> Option<TrendPoint> {
        let second = now_ms.checked_div(1_000).unwrap_or(0);
        if self.last_second.is_some_and(|last| second <= last) {
            return None;
        }
        self.last_second = Some(second);

        let window = self
            .metrics
            .window(now_ms.saturating_sub(self.window_ms), now_ms);
        let avg_response_ms = window
            .cost_sum_ms
            .checked_div(u128::from(window.count))
            .map_or(0, |avg| u64::try_from(avg).unwrap_or(u64::MAX));
        let sorted = sorted_copy(&window.costs);

        Some(TrendPoint {
            second,
            unix_secs: chrono::Utc::now().timestamp(),
            active_workers,
            avg_response_ms,
            qps: window.count,
            error_percent_x100: ratio_x100(window.failed, window.count),
            p99_ms: p99(&sorted),
        })
    }
}
