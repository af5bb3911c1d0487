use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures_util::future::join_all;
use tokio::sync::{broadcast, watch};
use tokio::time::{Instant, MissedTickBehavior, interval, sleep_until};
use tracing::{debug, info, warn};

use super::handle::RunSummary;
use super::worker::{RunShared, WorkerHandle, WorkerSlot, spawn_worker};
use crate::metrics::{Report, TrendPoint, TrendSampler, build_report};
use crate::pipeline::RequestExecutor;
use crate::profile::LoadProfile;

const TICK: Duration = Duration::from_secs(1);

/// Moves the worker population along the profile curve once per second,
/// samples the trend and, after the run, drains the workers.
pub(super) struct Scheduler {
    pub(super) shared: Arc<RunShared>,
    pub(super) profile: LoadProfile,
    pub(super) executor: Arc<dyn RequestExecutor>,
    pub(super) sampler: TrendSampler,
    pub(super) trend_tx: broadcast::Sender<TrendPoint>,
    pub(super) trend_history: Arc<Mutex<Vec<TrendPoint>>>,
    pub(super) report_tx: watch::Sender<Report>,
    pub(super) report_every_secs: Option<u64>,
    pub(super) drain_grace: Duration,
    pub(super) workers: Vec<WorkerHandle>,
    pub(super) next_id: usize,
}

impl Scheduler {
    pub(super) async fn drive(mut self) -> RunSummary {
        let initial = self.profile.target_at(0);
        self.spawn(initial);
        info!(
            "Run started: {} with {} initial workers",
            self.profile, initial
        );

        let mut ticker = interval(TICK);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker.tick().await;

        let fixed = !self.profile.respawns();
        let shared = Arc::clone(&self.shared);
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                () = shared.signal.stopped() => break,
                () = shared.drained.notified(), if fixed => {
                    if self.active() == 0 {
                        break;
                    }
                    continue;
                }
            }

            let now_ms = self.shared.metrics.elapsed_ms();
            if self.shared.deadline_passed(now_ms) {
                debug!("Run deadline reached at {}ms", now_ms);
                break;
            }
            let elapsed_secs = now_ms.checked_div(1_000).unwrap_or(0);
            self.workers.retain(|worker| !worker.slot.is_finished());
            self.adjust(elapsed_secs, now_ms);
            self.sample();
            self.publish_periodic_report(elapsed_secs);

            if fixed && self.active() == 0 {
                break;
            }
        }

        let stopped_early = !self.shared.signal.is_running();
        self.shared.signal.stop();
        self.drain().await;

        self.executor.restore_pool();
        let report = build_report(&self.shared.metrics);
        self.report_tx.send_replace(report.clone());
        let trend = self
            .trend_history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        info!(
            "Run finished: {} iterations recorded{}",
            self.shared.metrics.total_recorded(),
            if stopped_early { " (stopped early)" } else { "" }
        );

        RunSummary {
            report,
            trend,
            stopped_early,
        }
    }

    fn active(&self) -> usize {
        self.shared.active.load(Ordering::Acquire)
    }

    fn spawn(&mut self, count: usize) {
        for _ in 0..count {
            let worker = spawn_worker(&self.shared, self.next_id);
            self.next_id = self.next_id.saturating_add(1);
            self.workers.push(worker);
        }
    }

    fn adjust(&mut self, elapsed_secs: u64, now_ms: u64) {
        let target = self.profile.target_at(elapsed_secs);

        if let Some(horizon) = self.profile.shrink_horizon(elapsed_secs) {
            // Spread exits evenly over what is left of the falling segment.
            let committed = self.committed();
            let excess = committed.len().saturating_sub(horizon.floor);
            if excess == 0 {
                return;
            }
            let remaining_ms = horizon.remaining_secs.saturating_mul(1_000);
            let excess_u64 = u64::try_from(excess).unwrap_or(u64::MAX);
            for (rank, slot) in committed.iter().rev().take(excess).enumerate() {
                let rank = u64::try_from(rank).unwrap_or(u64::MAX).saturating_add(1);
                let offset = remaining_ms
                    .saturating_mul(rank)
                    .checked_div(excess_u64)
                    .unwrap_or(remaining_ms);
                slot.retire(now_ms.saturating_add(offset));
            }
            debug!(
                "Retiring {} workers over {}s toward {}",
                excess, horizon.remaining_secs, horizon.floor
            );
            return;
        }

        let live = self
            .workers
            .iter()
            .filter(|worker| worker.slot.is_live(now_ms))
            .count();
        if live < target && self.profile.respawns() {
            let missing = target.saturating_sub(live);
            debug!("Spawning {} workers toward {}", missing, target);
            self.spawn(missing);
            return;
        }

        let committed = self.committed();
        let excess = committed.len().saturating_sub(target);
        for slot in committed.iter().rev().take(excess) {
            slot.retire(now_ms);
        }
    }

    fn committed(&self) -> Vec<Arc<WorkerSlot>> {
        self.workers
            .iter()
            .filter(|worker| worker.slot.is_committed())
            .map(|worker| Arc::clone(&worker.slot))
            .collect()
    }

    fn sample(&mut self) {
        let Some(point) = self.sampler.sample(self.active()) else {
            return;
        };
        self.trend_history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(point);
        // No subscribers is fine.
        drop(self.trend_tx.send(point));
    }

    fn publish_periodic_report(&self, elapsed_secs: u64) {
        let Some(every) = self.report_every_secs else {
            return;
        };
        if elapsed_secs > 0 && elapsed_secs.checked_rem(every) == Some(0) {
            self.report_tx
                .send_replace(build_report(&self.shared.metrics));
        }
    }

    /// Wait for in-flight iterations. The run is no longer active here, so
    /// no trend points are sampled.
    async fn drain(&mut self) {
        let now = Instant::now();
        let grace_deadline = now.checked_add(self.drain_grace).unwrap_or(now);
        let shared = Arc::clone(&self.shared);
        while self.active() > 0 {
            tokio::select! {
                () = shared.drained.notified() => {}
                () = sleep_until(grace_deadline) => {
                    warn!(
                        "{} workers still busy after {}ms; aborting them",
                        self.active(),
                        self.drain_grace.as_millis()
                    );
                    for worker in &self.workers {
                        worker.task.abort();
                    }
                    break;
                }
            }
        }

        let tasks = self.workers.drain(..).map(|worker| worker.task);
        for result in join_all(tasks).await {
            if let Err(err) = result
                && !err.is_cancelled()
            {
                warn!("Worker task failed: {}", err);
            }
        }
    }
}
