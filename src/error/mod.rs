mod app;
mod config;
mod engine;
mod http;
mod iteration;
mod validation;

pub use app::{AppError, AppResult};
pub use config::ConfigError;
pub use engine::{EngineError, EngineResult};
pub use http::HttpError;
pub use iteration::{HookStage, IterationFailure};
pub use validation::ValidationError;
