use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::ResultSink;
use crate::pipeline::IterationResult;

/// Keeps iteration results for later inspection. In efficient mode only
/// failed iterations are retained; successes are just counted.
#[derive(Debug, Default)]
pub struct ResultTree {
    efficient: bool,
    accepted: AtomicU64,
    results: Mutex<Vec<IterationResult>>,
}

impl ResultTree {
    #[must_use]
    pub fn new(efficient: bool) -> Self {
        Self {
            efficient,
            accepted: AtomicU64::new(0),
            results: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub const fn is_efficient(&self) -> bool {
        self.efficient
    }

    /// Results seen, retained or not.
    #[must_use]
    pub fn accepted(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn results(&self) -> Vec<IterationResult> {
        self.lock().clone()
    }

    #[must_use]
    pub fn failures(&self) -> Vec<IterationResult> {
        self.lock()
            .iter()
            .filter(|result| !result.success)
            .cloned()
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<IterationResult>> {
        self.results.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ResultSink for ResultTree {
    fn accept(&self, result: &IterationResult) {
        self.accepted.fetch_add(1, Ordering::Relaxed);
        if self.efficient && result.success {
            return;
        }
        self.lock().push(result.clone());
    }
}
