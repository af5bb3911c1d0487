use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, redirect};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::HttpError;
use crate::pipeline::{HttpMethod, RequestExecutor, RequestSpec, Response};

const DEFAULT_USER_AGENT: &str = concat!("volley/", env!("CARGO_PKG_VERSION"));

/// Client-wide settings; per-request timeouts come from the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub connect_timeout: Duration,
    pub redirect_limit: u32,
    pub user_agent: Option<String>,
    pub insecure: bool,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            redirect_limit: 10,
            user_agent: Some(DEFAULT_USER_AGENT.to_owned()),
            insecure: false,
        }
    }
}

/// `RequestExecutor` on top of a shared reqwest client. While a run is
/// active the client is swapped for one whose idle pool fits the run's
/// peak concurrency.
#[derive(Debug)]
pub struct ReqwestExecutor {
    settings: ClientSettings,
    default_client: Client,
    client: RwLock<Client>,
}

impl ReqwestExecutor {
    /// # Errors
    ///
    /// Returns an error when the HTTP client cannot be built.
    pub fn new(settings: ClientSettings) -> Result<Self, HttpError> {
        let default_client = build_client(&settings, None)?;
        Ok(Self {
            settings,
            client: RwLock::new(default_client.clone()),
            default_client,
        })
    }

    fn current(&self) -> Client {
        self.client
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn swap(&self, client: Client) {
        *self
            .client
            .write()
            .unwrap_or_else(PoisonError::into_inner) = client;
    }
}

#[async_trait]
impl RequestExecutor for ReqwestExecutor {
    async fn execute(
        &self,
        request: &RequestSpec,
        timeout: Duration,
    ) -> Result<Response, HttpError> {
        let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        let mut builder = self
            .current()
            .request(to_method(request.method), request.url.clone())
            .timeout(timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body.as_ref() {
            builder = builder.body(body.clone());
        }

        let started = Instant::now();
        let response = builder.send().await.map_err(|source| {
            if source.is_timeout() {
                HttpError::Timeout { timeout_ms }
            } else {
                HttpError::Request { source }
            }
        })?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_owned(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response.text().await.map_err(|source| {
            if source.is_timeout() {
                HttpError::Timeout { timeout_ms }
            } else {
                HttpError::ReadBody { source }
            }
        })?;

        Ok(Response {
            status,
            headers,
            body,
            cost_ms: Some(u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)),
        })
    }

    fn prepare_pool(&self, max_concurrency: usize) {
        match build_client(&self.settings, Some(max_concurrency)) {
            Ok(client) => {
                debug!("HTTP pool sized for {} workers", max_concurrency);
                self.swap(client);
            }
            Err(err) => warn!("Keeping default HTTP client: {}", err),
        }
    }

    fn restore_pool(&self) {
        self.swap(self.default_client.clone());
    }
}

fn build_client(settings: &ClientSettings, pool_size: Option<usize>) -> Result<Client, HttpError> {
    let mut builder = Client::builder().connect_timeout(settings.connect_timeout);

    if let Some(user_agent) = settings.user_agent.as_ref() {
        builder = builder.user_agent(user_agent.as_str());
    }

    builder = if settings.redirect_limit == 0 {
        builder.redirect(redirect::Policy::none())
    } else {
        builder.redirect(redirect::Policy::limited(
            usize::try_from(settings.redirect_limit).unwrap_or(10),
        ))
    };

    if let Some(pool_size) = pool_size {
        builder = builder.pool_max_idle_per_host(pool_size.max(1));
    }

    if settings.insecure {
        builder = builder.danger_accept_invalid_certs(true);
    }

    builder
        .build()
        .map_err(|source| HttpError::BuildClient { source })
}

fn to_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
        HttpMethod::Head => Method::HEAD,
        HttpMethod::Options => Method::OPTIONS,
    }
}
