//! In-memory collaborators shared by unit tests.
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::HttpError;
use crate::pipeline::{HookBindings, HookReport, HookRunner, RequestExecutor, RequestSpec, Response};

/// Answers every request with the same response after `delay`.
#[derive(Debug)]
pub(crate) struct FakeExecutor {
    delay: Duration,
    status: u16,
    body: String,
    cost_ms: Option<u64>,
    error: Option<String>,
    calls: AtomicU64,
    prepared: AtomicUsize,
    restored: AtomicU64,
}

impl FakeExecutor {
    pub(crate) fn new(delay: Duration) -> Self {
        Self {
            delay,
            status: 200,
            body: String::from("ok"),
            cost_ms: None,
            error: None,
            calls: AtomicU64::new(0),
            prepared: AtomicUsize::new(0),
            restored: AtomicU64::new(0),
        }
    }

    pub(crate) fn with_response(mut self, status: u16, body: &str) -> Self {
        self.status = status;
        self.body = body.to_owned();
        self
    }

    pub(crate) fn with_cost(mut self, cost_ms: u64) -> Self {
        self.cost_ms = Some(cost_ms);
        self
    }

    pub(crate) fn failing(mut self, message: &str) -> Self {
        self.error = Some(message.to_owned());
        self
    }

    pub(crate) fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn prepared_for(&self) -> usize {
        self.prepared.load(Ordering::SeqCst)
    }

    pub(crate) fn restored(&self) -> u64 {
        self.restored.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RequestExecutor for FakeExecutor {
    async fn execute(
        &self,
        _request: &RequestSpec,
        _timeout: Duration,
    ) -> Result<Response, HttpError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if let Some(message) = self.error.as_ref() {
            return Err(HttpError::Transport {
                message: message.clone(),
            });
        }
        Ok(Response {
            status: self.status,
            headers: Vec::new(),
            body: self.body.clone(),
            cost_ms: self.cost_ms,
        })
    }

    fn prepare_pool(&self, max_concurrency: usize) {
        self.prepared.store(max_concurrency, Ordering::SeqCst);
    }

    fn restore_pool(&self) {
        self.restored.fetch_add(1, Ordering::SeqCst);
    }
}

/// Returns a canned report per script and remembers what it was shown.
#[derive(Debug, Default)]
pub(crate) struct FakeHooks {
    reports: BTreeMap<String, HookReport>,
    seen: Mutex<Vec<(String, Option<u16>)>>,
}

impl FakeHooks {
    pub(crate) fn with(mut self, script: &str, report: HookReport) -> Self {
        self.reports.insert(script.to_owned(), report);
        self
    }

    /// `(script, response status)` per call.
    pub(crate) fn seen(&self) -> Vec<(String, Option<u16>)> {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl HookRunner for FakeHooks {
    async fn run(&self, script: &str, bindings: HookBindings<'_>) -> HookReport {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((
                script.to_owned(),
                bindings.response.map(|response| response.status),
            ));
        self.reports.get(script).cloned().unwrap_or_default()
    }
}
