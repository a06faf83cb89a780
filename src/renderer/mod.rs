//! Page renderer module
//!
//! A renderer turns a URL into the final HTML of the page. The batch engine
//! only depends on the [`Renderer`] trait; concrete renderers are picked by
//! name from the configuration:
//!
//! - `http` - plain GET with reqwest, no script execution
//! - `chrome` - headless Chromium via chromiumoxide (cargo feature `chrome`)

#[cfg(feature = "chrome")]
mod chrome;
mod http;

#[cfg(feature = "chrome")]
pub use chrome::ChromeRenderer;
pub use http::{build_http_client, HttpRenderer, DEFAULT_USER_AGENT};

use crate::config::{RendererConfig, RendererKind};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors raised while rendering a page
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Render timed out after {timeout_ms}ms for {url}")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("HTTP {status} from {url}")]
    Status {
        url: String,
        status: u16,
        /// Response body, when one could be read
        body: Option<String>,
    },

    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("Render engine error: {0}")]
    Engine(String),

    #[error("Renderer unavailable: {0}")]
    Unsupported(String),
}

/// Capability to render a URL into its final HTML
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Renders `url`, giving up after `timeout`
    async fn render(&self, url: &Url, timeout: Duration) -> Result<String, RenderError>;
}

/// Builds the renderer selected by the configuration
///
/// # Returns
///
/// * `Ok(Arc<dyn Renderer>)` - Ready-to-use renderer
/// * `Err(RenderError)` - The renderer could not be created (HTTP client
///   build failure, browser launch failure, or a renderer compiled out)
pub async fn build_renderer(config: &RendererConfig) -> Result<Arc<dyn Renderer>, RenderError> {
    match config.kind {
        RendererKind::Http => {
            let user_agent = config.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT);
            let client = build_http_client(user_agent)
                .map_err(|e| RenderError::Engine(format!("Failed to build HTTP client: {}", e)))?;
            Ok(Arc::new(HttpRenderer::new(client)))
        }
        #[cfg(feature = "chrome")]
        RendererKind::Chrome => Ok(Arc::new(ChromeRenderer::launch(config).await?)),
        #[cfg(not(feature = "chrome"))]
        RendererKind::Chrome => Err(RenderError::Unsupported(
            "built without the `chrome` feature".to_string(),
        )),
    }
}
