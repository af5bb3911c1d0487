use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HookStage {
    #[error("pre")]
    Pre,
    #[error("post")]
    Post,
}

/// Why a single iteration did not succeed.
///
/// These never leave the pipeline as errors; they are folded into the
/// iteration result so the worker keeps going.
#[derive(Debug, Error, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IterationFailure {
    #[error("{stage}-request hook failed: {message}")]
    Hook { stage: HookStage, message: String },
    #[error("{message}")]
    Request { message: String },
    #[error("{message}")]
    Assertion { name: String, message: String },
}

impl IterationFailure {
    #[must_use]
    pub fn hook(stage: HookStage, message: impl Into<String>) -> Self {
        IterationFailure::Hook {
            stage,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn request(message: impl Into<String>) -> Self {
        IterationFailure::Request {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn assertion(name: impl Into<String>, message: impl Into<String>) -> Self {
        IterationFailure::Assertion {
            name: name.into(),
            message: message.into(),
        }
    }
}
