//! Run orchestration: turns a load profile and a test plan into a population
//! of workers and hands back a [`RunHandle`].
mod handle;
mod scheduler;
mod worker;


use std::sync::atomic::AtomicUsize;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::{Notify, broadcast, watch};
use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::http::JsonPathExtractor;
use crate::metrics::{EndpointMetrics, Report, TrendSampler};
use crate::pipeline::{HookRunner, PathExtractor, RequestExecutor, RequestPipeline, TestPlan};
use crate::profile::LoadProfile;
use crate::shutdown::RunSignal;
use crate::sinks::{NullSink, ResultSink};

pub use handle::{RunHandle, RunSummary};

use scheduler::Scheduler;
use worker::RunShared;

/// Trend points buffered per subscriber before it starts lagging.
const TREND_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Budget for a single request.
    pub request_timeout: Duration,
    /// How long to wait for workers after the run ends before aborting them.
    pub drain_grace: Duration,
    /// Publish a mid-run report this often.
    pub report_interval: Option<Duration>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            drain_grace: Duration::from_secs(10),
            report_interval: None,
        }
    }
}

/// Runs test plans against a fixed set of collaborators. One engine can
/// start any number of independent runs.
pub struct Engine {
    executor: Arc<dyn RequestExecutor>,
    hooks: Option<Arc<dyn HookRunner>>,
    extractor: Arc<dyn PathExtractor>,
    sink: Arc<dyn ResultSink>,
    options: RunOptions,
}

pub struct EngineBuilder {
    executor: Arc<dyn RequestExecutor>,
    hooks: Option<Arc<dyn HookRunner>>,
    extractor: Option<Arc<dyn PathExtractor>>,
    sink: Option<Arc<dyn ResultSink>>,
    options: RunOptions,
}

impl EngineBuilder {
    #[must_use]
    pub fn hooks(mut self, hooks: Arc<dyn HookRunner>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    #[must_use]
    pub fn extractor(mut self, extractor: Arc<dyn PathExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    #[must_use]
    pub fn sink(mut self, sink: Arc<dyn ResultSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    #[must_use]
    pub const fn options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn build(self) -> Engine {
        Engine {
            executor: self.executor,
            hooks: self.hooks,
            extractor: self
                .extractor
                .unwrap_or_else(|| Arc::new(JsonPathExtractor)),
            sink: self.sink.unwrap_or_else(|| Arc::new(NullSink)),
            options: self.options,
        }
    }
}

impl Engine {
    #[must_use]
    pub fn builder(executor: Arc<dyn RequestExecutor>) -> EngineBuilder {
        EngineBuilder {
            executor,
            hooks: None,
            extractor: None,
            sink: None,
            options: RunOptions::default(),
        }
    }

    #[must_use]
    pub const fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Start a run on the current tokio runtime and return immediately.
    ///
    /// # Errors
    ///
    /// Returns an error when called outside a tokio runtime, when the plan
    /// has no steps, when a step has an empty name, or when a step declares
    /// hooks without a hook runner.
    pub fn start(&self, profile: LoadProfile, plan: TestPlan) -> EngineResult<RunHandle> {
        let runtime = Handle::try_current().map_err(|_err| EngineError::NoRuntime)?;
        validate_plan(&plan, self.hooks.is_some())?;

        self.executor.prepare_pool(profile.peak_concurrency());

        let signal = RunSignal::new();
        let metrics = Arc::new(EndpointMetrics::new());
        let active = Arc::new(AtomicUsize::new(0));
        let pipeline = RequestPipeline::new(
            Arc::clone(&self.executor),
            self.hooks.clone(),
            Arc::clone(&self.extractor),
            Arc::clone(&metrics),
            Arc::clone(&self.sink),
            plan.base_url.clone(),
            self.options.request_timeout,
            signal.clone(),
        );
        let deadline_ms = profile
            .total_duration()
            .map(|duration| u64::try_from(duration.as_millis()).unwrap_or(u64::MAX));
        let shared = Arc::new(RunShared {
            pipeline,
            plan: Arc::new(plan),
            signal: signal.clone(),
            metrics: Arc::clone(&metrics),
            deadline_ms,
            loops: profile.loops_per_worker(),
            active: Arc::clone(&active),
            drained: Notify::new(),
        });

        let (trend_tx, _trend_rx) = broadcast::channel(TREND_CHANNEL_CAPACITY);
        let (report_tx, report_rx) = watch::channel(Report::default());
        let trend_history = Arc::new(Mutex::new(Vec::new()));
        let report_every_secs = self
            .options
            .report_interval
            .map(|interval| interval.as_secs().max(1));

        let scheduler = Scheduler {
            shared,
            profile,
            executor: Arc::clone(&self.executor),
            sampler: TrendSampler::new(Arc::clone(&metrics)),
            trend_tx: trend_tx.clone(),
            trend_history: Arc::clone(&trend_history),
            report_tx,
            report_every_secs,
            drain_grace: self.options.drain_grace,
            workers: Vec::with_capacity(profile.peak_concurrency()),
            next_id: 0,
        };
        debug!("Starting run: {}", profile);
        let driver = runtime.spawn(scheduler.drive());

        Ok(RunHandle {
            profile,
            signal,
            active,
            metrics,
            trend_tx,
            trend_history,
            report_rx,
            driver,
        })
    }
}

fn validate_plan(plan: &TestPlan, has_hooks: bool) -> EngineResult<()> {
    if plan.steps.is_empty() {
        return Err(EngineError::EmptyPlan);
    }
    for (index, step) in plan.steps.iter().enumerate() {
        if step.name.trim().is_empty() {
            return Err(EngineError::EmptyEndpointName { index });
        }
        if step.has_hooks() && !has_hooks {
            return Err(EngineError::HooksWithoutRunner { index });
        }
    }
    Ok(())
}
