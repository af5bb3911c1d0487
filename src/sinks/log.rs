use tracing::{debug, warn};

use super::ResultSink;
use crate::pipeline::IterationResult;

/// Logs failed iterations at `warn` and successful ones at `debug`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ResultSink for TracingSink {
    fn accept(&self, result: &IterationResult) {
        if result.success {
            debug!(
                "{} worker={} seq={} ok in {}ms",
                result.endpoint, result.worker, result.seq, result.cost_ms
            );
        } else {
            warn!(
                "{} worker={} seq={} failed in {}ms: {}",
                result.endpoint,
                result.worker,
                result.seq,
                result.cost_ms,
                result.message.as_deref().unwrap_or("unknown failure")
            );
        }
    }
}
