use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("Failed to build HTTP client: {source}")]
    BuildClient {
        #[source]
        source: reqwest::Error,
    },
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Step base_url is required for relative paths.")]
    BaseUrlRequired,
    #[error("Step must define url or path.")]
    MissingUrlOrPath,
    #[error("Invalid header '{name}'.")]
    InvalidHeader { name: String },
    #[error("Request failed: {source}")]
    Request {
        #[source]
        source: reqwest::Error,
    },
    #[error("Failed to read response body: {source}")]
    ReadBody {
        #[source]
        source: reqwest::Error,
    },
    #[error("Request timed out after {timeout_ms}ms.")]
    Timeout { timeout_ms: u64 },
    #[error("{message}")]
    Transport { message: String },
}

impl HttpError {
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, HttpError::Timeout { .. })
    }
}
