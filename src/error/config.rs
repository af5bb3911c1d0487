use super::ValidationError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config '{path}': {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML config '{path}': {source}")]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to parse JSON config '{path}': {source}")]
    ParseJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Unsupported config extension '{ext}'. Use .toml or .json.")]
    UnsupportedExtension { ext: String },
    #[error("Config file must have .toml or .json extension.")]
    MissingExtension,
    #[error("Config is missing a [profile] section.")]
    MissingProfile,
    #[error("Invalid load profile: {source}")]
    InvalidProfile {
        #[source]
        source: ValidationError,
    },
    #[error("Config must include at least one [[steps]] entry.")]
    NoSteps,
    #[error("Step {index} must define url/path or set base_url.")]
    StepMissingUrlOrPath { index: usize },
    #[error("Step {index} cannot set both url and path.")]
    StepUrlAndPath { index: usize },
    #[error("Step {index} has an invalid header: {source}")]
    InvalidHeader {
        index: usize,
        #[source]
        source: ValidationError,
    },
    #[error("Step {index} assertion {assertion} is invalid: {source}")]
    InvalidAssertion {
        index: usize,
        assertion: usize,
        #[source]
        source: ValidationError,
    },
    #[error("Invalid duration for '{field}': {source}")]
    InvalidDuration {
        field: &'static str,
        #[source]
        source: ValidationError,
    },
    #[error("Config '{field}' must be >= 1: {source}")]
    FieldMustBePositive {
        field: &'static str,
        #[source]
        source: ValidationError,
    },
    #[error("Either --config or --url must be provided (or a volley.toml/volley.json in the working directory).")]
    NothingToRun,
}
