use std::collections::BTreeMap;
use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use url::Url;

use super::assertions::Assertion;
use crate::error::IterationFailure;

#[derive(Debug, Clone, Copy, Default, ValueEnum, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrendered request; every string may hold `{{var}}` placeholders.
/// Exactly one of `url` (absolute) or `path` (joined onto the plan base URL)
/// is expected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestTemplate {
    pub method: HttpMethod,
    pub url: Option<String>,
    pub path: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

/// One endpoint of a test plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanStep {
    /// Endpoint name metrics are keyed by.
    pub name: String,
    pub request: RequestTemplate,
    pub pre_hook: Option<String>,
    pub post_hook: Option<String>,
    pub assertions: Vec<Assertion>,
}

impl PlanStep {
    #[must_use]
    pub fn new(name: impl Into<String>, request: RequestTemplate) -> Self {
        Self {
            name: name.into(),
            request,
            pre_hook: None,
            post_hook: None,
            assertions: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_assertion(mut self, assertion: Assertion) -> Self {
        self.assertions.push(assertion);
        self
    }

    #[must_use]
    pub fn with_pre_hook(mut self, script: impl Into<String>) -> Self {
        self.pre_hook = Some(script.into());
        self
    }

    #[must_use]
    pub fn with_post_hook(mut self, script: impl Into<String>) -> Self {
        self.post_hook = Some(script.into());
        self
    }

    pub(crate) fn has_hooks(&self) -> bool {
        self.pre_hook.is_some() || self.post_hook.is_some()
    }
}

/// Ordered steps a worker runs once per pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestPlan {
    pub base_url: Option<String>,
    pub vars: BTreeMap<String, String>,
    pub steps: Vec<PlanStep>,
}

impl TestPlan {
    #[must_use]
    pub fn single(step: PlanStep) -> Self {
        Self {
            base_url: None,
            vars: BTreeMap::new(),
            steps: vec![step],
        }
    }
}

/// Fully rendered request handed to the executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    pub method: HttpMethod,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
    /// Cost measured by the executor itself, when it has one.
    pub cost_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssertionOutcome {
    pub name: String,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AssertionOutcome {
    #[must_use]
    pub fn pass(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: true,
            message: None,
        }
    }

    #[must_use]
    pub fn fail(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: false,
            message: Some(message.into()),
        }
    }
}

/// Everything known about one executed iteration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IterationResult {
    pub endpoint: String,
    pub worker: usize,
    pub seq: u64,
    /// Unix milliseconds at which the iteration began.
    pub started_at_ms: i64,
    pub cost_ms: u64,
    pub success: bool,
    /// Most recent failure; earlier ones remain in `failures`.
    pub message: Option<String>,
    pub status: Option<u16>,
    pub assertions: Vec<AssertionOutcome>,
    pub failures: Vec<IterationFailure>,
}

impl IterationResult {
    pub(crate) fn begin(endpoint: &str, worker: usize, seq: u64) -> Self {
        Self {
            endpoint: endpoint.to_owned(),
            worker,
            seq,
            started_at_ms: chrono::Utc::now().timestamp_millis(),
            cost_ms: 0,
            success: true,
            message: None,
            status: None,
            assertions: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub(crate) fn fail(&mut self, failure: IterationFailure) {
        self.success = false;
        self.message = Some(failure.to_string());
        self.failures.push(failure);
    }
}

/// What the pipeline hands back to the worker loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IterationOutcome {
    Completed(IterationResult),
    /// The run stopped during a pacing pause. The iteration was still
    /// recorded (assertions after the pause skipped, post-hook run); the
    /// worker should exit.
    Interrupted(IterationResult),
}

impl IterationOutcome {
    #[must_use]
    pub const fn result(&self) -> &IterationResult {
        match self {
            IterationOutcome::Completed(result) | IterationOutcome::Interrupted(result) => result,
        }
    }

    #[must_use]
    pub const fn is_interrupted(&self) -> bool {
        matches!(self, IterationOutcome::Interrupted(_))
    }
}
