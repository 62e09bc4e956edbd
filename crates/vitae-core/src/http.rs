//! Shared HTTP client for the remote APIs.
//!
//! Uses async reqwest on a small shared tokio runtime but presents a sync
//! interface: the pipelines issue one request at a time and never fan out
//! against third-party rate limits.

use std::sync::{LazyLock, OnceLock};
use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::error::FetchError;
use crate::retry::retry_with_backoff;

/// User-Agent sent when the configuration doesn't override it
pub const DEFAULT_USER_AGENT: &str =
    concat!("vitae/", env!("CARGO_PKG_VERSION"), " (academic portfolio data)");

/// Client-wide request settings.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub user_agent: String,
    /// TCP/TLS connect timeout
    pub connect_timeout: Duration,
    /// Upper bound for a whole request including the body
    pub request_timeout: Duration,
    /// Retries after the first attempt for retryable failures
    pub max_retries: u32,
    /// Base delay for exponential backoff
    pub backoff_base: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            connect_timeout: Duration::from_secs(15),
            request_timeout: Duration::from_secs(60),
            max_retries: 3,
            backoff_base: Duration::from_secs(1),
        }
    }
}

static HTTP_CONFIG: OnceLock<HttpConfig> = OnceLock::new();

/// Install the HTTP settings. Must run before the first request.
pub fn set_http_config(config: HttpConfig) {
    if HTTP_CONFIG.set(config).is_err() {
        log::warn!("HTTP config already initialized, keeping the first one");
    }
}

/// Current HTTP settings (defaults if never set).
pub fn http_config() -> &'static HttpConfig {
    HTTP_CONFIG.get_or_init(HttpConfig::default)
}

static SHARED_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    let config = http_config();
    reqwest::Client::builder()
        .user_agent(config.user_agent.clone())
        .connect_timeout(config.connect_timeout)
        .timeout(config.request_timeout)
        .build()
        .expect("failed to build HTTP client")
});

/// Get shared HTTP client.
pub fn http_client() -> &'static reqwest::Client {
    &SHARED_CLIENT
}

/// Shared tokio runtime for HTTP operations.
pub static SHARED_RUNTIME: LazyLock<tokio::runtime::Runtime> = LazyLock::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
});

/// One GET, no retry. Non-2xx statuses become [`FetchError::Http`].
pub fn get_text(url: &str, query: &[(&str, String)], accept: &str) -> Result<String, FetchError> {
    SHARED_RUNTIME.handle().block_on(async {
        let response = http_client()
            .get(url)
            .query(query)
            .header(reqwest::header::ACCEPT, accept)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| FetchError::from_reqwest(&e))?;
        response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(&e))
    })
}

/// GET a JSON document with retry, decoding it into `T`.
///
/// `label` names the call in log lines instead of the full URL.
pub fn get_json<T: DeserializeOwned>(
    label: &str,
    url: &str,
    query: &[(&str, String)],
) -> Result<T, FetchError> {
    let config = http_config();
    let body = retry_with_backoff(label, config.max_retries, config.backoff_base, || {
        get_text(url, query, "application/json")
    })?;
    log::trace!("{label}: {} bytes", body.len());
    serde_json::from_str(&body).map_err(|e| FetchError::Decode(format!("{label}: {e}")))
}
