//! One iteration of a plan step: pre-hook, request, assertions, post-hook.
mod assertions;
mod collaborators;
mod template;
mod types;

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::{HookStage, HttpError, IterationFailure};
use crate::metrics::EndpointMetrics;
use crate::shutdown::RunSignal;
use crate::sinks::ResultSink;

pub use assertions::{Assertion, Comparator};
pub use collaborators::{HookBindings, HookReport, HookRunner, PathExtractor, RequestExecutor};
pub use template::{iteration_vars, materialize, render_template};
pub use types::{
    AssertionOutcome, HttpMethod, IterationOutcome, IterationResult, PlanStep, RequestSpec,
    RequestTemplate, Response, TestPlan,
};

/// Where an iteration sits inside a run.
#[derive(Debug, Clone, Copy)]
pub struct IterationContext<'a> {
    pub worker: usize,
    pub seq: u64,
    pub vars: &'a BTreeMap<String, String>,
}

/// Executes iterations and records them. Shared by every worker of a run.
pub struct RequestPipeline {
    executor: Arc<dyn RequestExecutor>,
    hooks: Option<Arc<dyn HookRunner>>,
    extractor: Arc<dyn PathExtractor>,
    metrics: Arc<EndpointMetrics>,
    sink: Arc<dyn ResultSink>,
    base_url: Option<String>,
    request_timeout: Duration,
    signal: RunSignal,
}

impl RequestPipeline {
    #[expect(clippy::too_many_arguments, reason = "one field per run collaborator")]
    #[must_use]
    pub fn new(
        executor: Arc<dyn RequestExecutor>,
        hooks: Option<Arc<dyn HookRunner>>,
        extractor: Arc<dyn PathExtractor>,
        metrics: Arc<EndpointMetrics>,
        sink: Arc<dyn ResultSink>,
        base_url: Option<String>,
        request_timeout: Duration,
        signal: RunSignal,
    ) -> Self {
        Self {
            executor,
            hooks,
            extractor,
            metrics,
            sink,
            base_url,
            request_timeout,
            signal,
        }
    }

    /// Run `step` once. A completed iteration is recorded into the metrics
    /// and forwarded to the sink before it is returned.
    pub async fn run(&self, step: &PlanStep, context: IterationContext<'_>) -> IterationOutcome {
        let started = Instant::now();
        let mut result = IterationResult::begin(&step.name, context.worker, context.seq);

        let outcome = self.execute(step, context, &mut result).await;

        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let (measured_ms, interrupted) = match outcome {
            Flow::Responded {
                cost_ms,
                interrupted,
            } => (cost_ms, interrupted),
            Flow::Aborted => (None, false),
        };
        result.cost_ms = measured_ms.unwrap_or(elapsed_ms);

        self.metrics
            .record(&result.endpoint, result.cost_ms, result.success);
        self.sink.accept(&result);
        if interrupted {
            IterationOutcome::Interrupted(result)
        } else {
            IterationOutcome::Completed(result)
        }
    }

    async fn execute(
        &self,
        step: &PlanStep,
        context: IterationContext<'_>,
        result: &mut IterationResult,
    ) -> Flow {
        let request = match materialize(&step.request, self.base_url.as_deref(), context.vars) {
            Ok(request) => request,
            Err(err) => {
                result.fail(IterationFailure::request(err.to_string()));
                return Flow::Aborted;
            }
        };

        if let Some(script) = step.pre_hook.as_deref() {
            let report = self
                .run_hook(script, HookStage::Pre, step, context, &request, None)
                .await;
            let failure = report.failure();
            result.assertions.extend(report.tests);
            if let Some(message) = failure {
                result.fail(IterationFailure::hook(HookStage::Pre, message));
                return Flow::Aborted;
            }
        }

        let response = match self.send(&request).await {
            Ok(response) => Some(response),
            Err(err) => {
                result.fail(IterationFailure::request(err.to_string()));
                None
            }
        };

        let mut interrupted = false;
        if let Some(response) = response.as_ref() {
            result.status = Some(response.status);
            for assertion in &step.assertions {
                if let Assertion::Pause { duration } = assertion {
                    // Stop during a pause skips the remaining assertions only.
                    if !self.pause(*duration).await {
                        interrupted = true;
                        break;
                    }
                    continue;
                }
                let Some(outcome) =
                    assertion.evaluate(response, self.extractor.as_ref(), context.vars)
                else {
                    continue;
                };
                if !outcome.passed {
                    let message = outcome.message.clone().unwrap_or_default();
                    result.fail(IterationFailure::assertion(outcome.name.clone(), message));
                }
                result.assertions.push(outcome);
            }
        }

        if let Some(script) = step.post_hook.as_deref() {
            let report = self
                .run_hook(
                    script,
                    HookStage::Post,
                    step,
                    context,
                    &request,
                    response.as_ref(),
                )
                .await;
            let failure = report.failure();
            result.assertions.extend(report.tests);
            if let Some(message) = failure {
                result.fail(IterationFailure::hook(HookStage::Post, message));
            }
        }

        Flow::Responded {
            cost_ms: response.and_then(|response| response.cost_ms),
            interrupted,
        }
    }

    async fn send(&self, request: &RequestSpec) -> Result<Response, HttpError> {
        let timeout_ms = u64::try_from(self.request_timeout.as_millis()).unwrap_or(u64::MAX);
        match tokio::time::timeout(
            self.request_timeout,
            self.executor.execute(request, self.request_timeout),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(HttpError::Timeout { timeout_ms }),
        }
    }

    async fn run_hook(
        &self,
        script: &str,
        stage: HookStage,
        step: &PlanStep,
        context: IterationContext<'_>,
        request: &RequestSpec,
        response: Option<&Response>,
    ) -> HookReport {
        let Some(hooks) = self.hooks.as_ref() else {
            return HookReport {
                tests: Vec::new(),
                error: Some("no hook runner is configured".to_owned()),
            };
        };
        let bindings = HookBindings {
            stage,
            endpoint: &step.name,
            vars: context.vars,
            request,
            response,
        };
        hooks.run(script, bindings).await
    }

    /// Returns `false` when the run stopped before the pause elapsed.
    async fn pause(&self, duration: Duration) -> bool {
        if !self.signal.is_running() {
            return false;
        }
        tokio::select! {
            () = tokio::time::sleep(duration) => true,
            () = self.signal.stopped() => false,
        }
    }
}

enum Flow {
    /// Reached the post-hook stage. `cost_ms` is the executor-measured cost,
    /// if any; `interrupted` is set when the run stopped during a pause.
    Responded {
        cost_ms: Option<u64>,
        interrupted: bool,
    },
    /// Stopped before the request was sent.
    Aborted,
}
