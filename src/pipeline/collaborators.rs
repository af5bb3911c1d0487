use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;

use super::types::{AssertionOutcome, RequestSpec, Response};
use crate::error::{HookStage, HttpError};

/// Sends one rendered request.
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    /// # Errors
    ///
    /// Returns an error when no response could be obtained.
    async fn execute(&self, request: &RequestSpec, timeout: Duration)
    -> Result<Response, HttpError>;

    /// Size shared connection resources for a run. Called once before the
    /// first worker starts.
    fn prepare_pool(&self, _max_concurrency: usize) {}

    /// Undo `prepare_pool`. Called once after the last worker exits.
    fn restore_pool(&self) {}
}

/// Pulls a value out of a response body; `None` when the path is absent.
pub trait PathExtractor: Send + Sync {
    fn extract(&self, body: &str, path: &str) -> Option<String>;
}

/// What a hook sees.
#[derive(Debug, Clone, Copy)]
pub struct HookBindings<'a> {
    pub stage: HookStage,
    pub endpoint: &'a str,
    pub vars: &'a BTreeMap<String, String>,
    pub request: &'a RequestSpec,
    /// Only set for post hooks that follow a received response.
    pub response: Option<&'a Response>,
}

/// Result of running one hook script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HookReport {
    pub tests: Vec<AssertionOutcome>,
    /// Set when the script itself failed to run to completion.
    pub error: Option<String>,
}

impl HookReport {
    /// First reason this hook counts as failed.
    #[must_use]
    pub fn failure(&self) -> Option<String> {
        if let Some(error) = self.error.as_ref() {
            return Some(error.clone());
        }
        self.tests
            .iter()
            .find(|test| !test.passed)
            .map(|test| match test.message.as_deref() {
                Some(message) => format!("test '{}' failed: {}", test.name, message),
                None => format!("test '{}' failed", test.name),
            })
    }
}

/// Runs pre/post hook scripts. Implementations that block must move the
/// work onto `tokio::task::spawn_blocking`.
#[async_trait]
pub trait HookRunner: Send + Sync {
    async fn run(&self, script: &str, bindings: HookBindings<'_>) -> HookReport;
}
