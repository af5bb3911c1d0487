use thiserror::Error;

/// Faults that prevent a run from starting. Failures inside a running
/// iteration never surface here.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Engine must be started from within a tokio runtime.")]
    NoRuntime,
    #[error("Test plan must include at least one step.")]
    EmptyPlan,
    #[error("Test plan step {index} has an empty endpoint name.")]
    EmptyEndpointName { index: usize },
    #[error("Test plan step {index} declares hooks but no hook runner is configured.")]
    HooksWithoutRunner { index: usize },
    #[error("Run driver task failed: {source}")]
    Driver {
        #[source]
        source: tokio::task::JoinError,
    },
}

pub type EngineResult<T> = Result<T, EngineError>;
