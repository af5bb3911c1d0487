use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use tokio::time::Instant;

/// How long finished iterations stay on the timeline for window queries.
const TIMELINE_RETENTION_MS: u64 = 5_000;

#[derive(Debug, Clone, Copy)]
struct TimelineEntry {
    end_ms: u64,
    cost_ms: u64,
    success: bool,
}

#[derive(Debug)]
struct EndpointSeries {
    samples: Mutex<Vec<u64>>,
    success: AtomicU64,
    fail: AtomicU64,
    first_start_ms: AtomicU64,
    last_end_ms: AtomicU64,
}

impl EndpointSeries {
    const fn new() -> Self {
        Self {
            samples: Mutex::new(Vec::new()),
            success: AtomicU64::new(0),
            fail: AtomicU64::new(0),
            first_start_ms: AtomicU64::new(u64::MAX),
            last_end_ms: AtomicU64::new(0),
        }
    }
}

/// Read-only copy of one endpoint's accumulated samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointSnapshot {
    pub endpoint: String,
    pub samples: Vec<u64>,
    pub success: u64,
    pub fail: u64,
    pub first_start_ms: Option<u64>,
    pub last_end_ms: u64,
}

impl EndpointSnapshot {
    #[must_use]
    pub fn count(&self) -> u64 {
        u64::try_from(self.samples.len()).unwrap_or(u64::MAX)
    }

    /// Wall-clock span from the earliest start to the latest end.
    #[must_use]
    pub fn span_ms(&self) -> u64 {
        self.first_start_ms
            .map_or(0, |first| self.last_end_ms.saturating_sub(first))
    }
}

/// Iterations that finished inside a time window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowStats {
    pub count: u64,
    pub failed: u64,
    pub cost_sum_ms: u128,
    pub costs: Vec<u64>,
}

/// Concurrent store of per-endpoint cost samples and outcome counters.
///
/// Each endpoint has its own lock, so workers hitting different endpoints
/// never contend. A sample and its counter are written under the same lock,
/// which keeps `success + fail == samples.len()` for every snapshot.
#[derive(Debug)]
pub struct EndpointMetrics {
    started: Instant,
    endpoints: RwLock<BTreeMap<String, Arc<EndpointSeries>>>,
    timeline: Mutex<VecDeque<TimelineEntry>>,
}

impl Default for EndpointMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl EndpointMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    #[must_use]
    pub fn starting_at(started: Instant) -> Self {
        Self {
            started,
            endpoints: RwLock::new(BTreeMap::new()),
            timeline: Mutex::new(VecDeque::new()),
        }
    }

    #[must_use]
    pub fn started(&self) -> Instant {
        self.started
    }

    /// Milliseconds since the metrics clock started.
    #[must_use]
    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    /// Record one finished iteration that ended now.
    pub fn record(&self, endpoint: &str, cost_ms: u64, success: bool) {
        self.record_at(endpoint, self.elapsed_ms(), cost_ms, success);
    }

    /// Record one finished iteration that ended `end_ms` into the run.
    pub fn record_at(&self, endpoint: &str, end_ms: u64, cost_ms: u64, success: bool) {
        let series = self.series(endpoint);
        let start_ms = end_ms.saturating_sub(cost_ms);
        {
            let mut samples = lock(&series.samples);
            samples.push(cost_ms);
            if success {
                series.success.fetch_add(1, Ordering::Relaxed);
            } else {
                series.fail.fetch_add(1, Ordering::Relaxed);
            }
            series.first_start_ms.fetch_min(start_ms, Ordering::Relaxed);
            series.last_end_ms.fetch_max(end_ms, Ordering::Relaxed);
        }

        let mut timeline = lock(&self.timeline);
        timeline.push_back(TimelineEntry {
            end_ms,
            cost_ms,
            success,
        });
        while timeline
            .front()
            .is_some_and(|entry| entry.end_ms.saturating_add(TIMELINE_RETENTION_MS) < end_ms)
        {
            timeline.pop_front();
        }
    }

    /// Defensive copies of every endpoint, ordered by name.
    #[must_use]
    pub fn snapshot(&self) -> Vec<EndpointSnapshot> {
        let series: Vec<(String, Arc<EndpointSeries>)> = {
            let endpoints = self
                .endpoints
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            endpoints
                .iter()
                .map(|(name, series)| (name.clone(), Arc::clone(series)))
                .collect()
        };

        series
            .into_iter()
            .map(|(endpoint, series)| {
                let samples = lock(&series.samples);
                let first_start_ms = series.first_start_ms.load(Ordering::Relaxed);
                EndpointSnapshot {
                    endpoint,
                    samples: samples.clone(),
                    success: series.success.load(Ordering::Relaxed),
                    fail: series.fail.load(Ordering::Relaxed),
                    first_start_ms: (first_start_ms != u64::MAX).then_some(first_start_ms),
                    last_end_ms: series.last_end_ms.load(Ordering::Relaxed),
                }
            })
            .collect()
    }

    /// Total iterations recorded across all endpoints.
    #[must_use]
    pub fn total_recorded(&self) -> u64 {
        let endpoints = self
            .endpoints
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        endpoints
            .values()
            .map(|series| {
                series
                    .success
                    .load(Ordering::Relaxed)
                    .saturating_add(series.fail.load(Ordering::Relaxed))
            })
            .fold(0u64, u64::saturating_add)
    }

    /// Iterations whose end falls in `[from_ms, to_ms]`.
    #[must_use]
    pub fn window(&self, from_ms: u64, to_ms: u64) -> WindowStats {
        let timeline = lock(&self.timeline);
        let mut stats = WindowStats::default();
        for entry in timeline
            .iter()
            .filter(|entry| entry.end_ms >= from_ms && entry.end_ms <= to_ms)
        {
            stats.count = stats.count.saturating_add(1);
            if !entry.success {
                stats.failed = stats.failed.saturating_add(1);
            }
            stats.cost_sum_ms = stats.cost_sum_ms.saturating_add(u128::from(entry.cost_ms));
            stats.costs.push(entry.cost_ms);
        }
        stats
    }

    fn series(&self, endpoint: &str) -> Arc<EndpointSeries> {
        {
            let endpoints = self
                .endpoints
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            if let Some(series) = endpoints.get(endpoint) {
                return Arc::clone(series);
            }
        }
        let mut endpoints = self
            .endpoints
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            endpoints
                .entry(endpoint.to_owned())
                .or_insert_with(|| Arc::new(EndpointSeries::new())),
        )
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
