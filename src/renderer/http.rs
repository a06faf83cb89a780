//! HTTP renderer
//!
//! Fetches the page with a single GET. No scripts run, so this only suits
//! sites that serve their content in the initial HTML.

use crate::renderer::{RenderError, Renderer};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Browser-like user agent used when the configuration does not set one
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Builds an HTTP client for page rendering
///
/// Per-request timeouts are applied by [`HttpRenderer::render`]; the client
/// only bounds connection setup.
///
/// # Example
///
/// ```
/// use page_harvest::renderer::{build_http_client, DEFAULT_USER_AGENT};
///
/// let client = build_http_client(DEFAULT_USER_AGENT).unwrap();
/// ```
pub fn build_http_client(user_agent: &str) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Renderer backed by a plain HTTP GET
#[derive(Debug, Clone)]
pub struct HttpRenderer {
    client: Client,
}

impl HttpRenderer {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Renderer for HttpRenderer {
    /// Fetches `url`
    ///
    /// # Error Mapping
    ///
    /// | Condition | Error |
    /// |-----------|-------|
    /// | Request exceeds `timeout` | `Timeout` |
    /// | Non-2xx status | `Status` (with the body, if readable) |
    /// | Connection/TLS/body failure | `Network` |
    async fn render(&self, url: &Url, timeout: Duration) -> Result<String, RenderError> {
        let network_error = |e: reqwest::Error| {
            if e.is_timeout() {
                RenderError::Timeout {
                    url: url.to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                }
            } else {
                RenderError::Network {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        };

        let response = self
            .client
            .get(url.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(RenderError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body: response.text().await.ok(),
            });
        }

        response.text().await.map_err(network_error)
    }
}
