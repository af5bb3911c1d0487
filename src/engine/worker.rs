use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::metrics::EndpointMetrics;
use crate::pipeline::{IterationContext, RequestPipeline, TestPlan, iteration_vars};
use crate::shutdown::RunSignal;

/// Expiry of a worker that has not been retired.
pub(super) const NEVER: u64 = u64::MAX;

/// The scheduler's view of one worker.
#[derive(Debug)]
pub(super) struct WorkerSlot {
    expires_at_ms: AtomicU64,
    finished: AtomicBool,
}

impl WorkerSlot {
    const fn new() -> Self {
        Self {
            expires_at_ms: AtomicU64::new(NEVER),
            finished: AtomicBool::new(false),
        }
    }

    pub(super) fn expires_at_ms(&self) -> u64 {
        self.expires_at_ms.load(Ordering::Acquire)
    }

    /// Ask the worker to leave at its first iteration boundary after
    /// `at_ms`. An earlier expiry is never pushed back.
    pub(super) fn retire(&self, at_ms: u64) {
        self.expires_at_ms.fetch_min(at_ms, Ordering::AcqRel);
    }

    pub(super) fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    /// Still running with no expiry.
    pub(super) fn is_committed(&self) -> bool {
        !self.is_finished() && self.expires_at_ms() == NEVER
    }

    /// Still running and not yet past its expiry.
    pub(super) fn is_live(&self, now_ms: u64) -> bool {
        !self.is_finished() && now_ms < self.expires_at_ms()
    }
}

/// State every worker of a run reads.
pub(super) struct RunShared {
    pub(super) pipeline: RequestPipeline,
    pub(super) plan: Arc<TestPlan>,
    pub(super) signal: RunSignal,
    pub(super) metrics: Arc<EndpointMetrics>,
    pub(super) deadline_ms: Option<u64>,
    pub(super) loops: Option<u64>,
    pub(super) active: Arc<AtomicUsize>,
    pub(super) drained: Notify,
}

impl RunShared {
    pub(super) fn deadline_passed(&self, now_ms: u64) -> bool {
        self.deadline_ms.is_some_and(|deadline| now_ms >= deadline)
    }

    fn may_continue(&self, slot: &WorkerSlot) -> bool {
        let now_ms = self.metrics.elapsed_ms();
        self.signal.is_running() && !self.deadline_passed(now_ms) && now_ms < slot.expires_at_ms()
    }
}

pub(super) struct WorkerHandle {
    pub(super) slot: Arc<WorkerSlot>,
    pub(super) task: JoinHandle<()>,
}

/// Decrements the active count and marks the slot finished however the
/// worker exits, aborts included. Created at spawn, so a task aborted
/// before its first poll still releases its count.
struct ActiveGuard {
    shared: Arc<RunShared>,
    slot: Arc<WorkerSlot>,
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.slot.finished.store(true, Ordering::Release);
        let previous = self
            .shared
            .active
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                current.checked_sub(1)
            });
        if previous == Ok(1) {
            self.shared.drained.notify_one();
        }
    }
}

/// Count the worker as active and start its loop.
pub(super) fn spawn_worker(shared: &Arc<RunShared>, id: usize) -> WorkerHandle {
    let slot = Arc::new(WorkerSlot::new());
    shared.active.fetch_add(1, Ordering::AcqRel);
    let guard = ActiveGuard {
        shared: Arc::clone(shared),
        slot: Arc::clone(&slot),
    };
    let task = tokio::spawn(async move {
        run_worker(&guard.shared, id, &guard.slot).await;
        drop(guard);
    });
    WorkerHandle { slot, task }
}

async fn run_worker(shared: &RunShared, id: usize, slot: &WorkerSlot) {
    let mut seq: u64 = 0;

    'passes: loop {
        if shared.loops.is_some_and(|loops| seq >= loops) {
            break;
        }
        for (index, step) in shared.plan.steps.iter().enumerate() {
            if !shared.may_continue(slot) {
                break 'passes;
            }
            let vars = iteration_vars(&shared.plan.vars, id, seq, index);
            let context = IterationContext {
                worker: id,
                seq,
                vars: &vars,
            };
            if shared.pipeline.run(step, context).await.is_interrupted() {
                debug!("Worker {} interrupted while pausing", id);
                break 'passes;
            }
        }
        seq = seq.saturating_add(1);
    }

    debug!("Worker {} exiting after {} passes", id, seq);
}
