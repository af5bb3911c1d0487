//! Destinations for individual iteration results.
mod log;
mod tree;


use std::sync::Arc;

use crate::pipeline::IterationResult;

pub use log::TracingSink;
pub use tree::ResultTree;

/// Receives every recorded iteration. Called from worker tasks, so it must
/// stay cheap and must not block.
pub trait ResultSink: Send + Sync {
    fn accept(&self, result: &IterationResult);
}

/// Drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ResultSink for NullSink {
    fn accept(&self, _result: &IterationResult) {}
}

/// Forwards each result to several sinks in order.
#[derive(Default, Clone)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn ResultSink>>,
}

impl FanoutSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, sink: Arc<dyn ResultSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl ResultSink for FanoutSink {
    fn accept(&self, result: &IterationResult) {
        for sink in &self.sinks {
            sink.accept(result);
        }
    }
}
