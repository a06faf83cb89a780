//! Headless Chromium renderer
//!
//! Each render opens a fresh tab, navigates, dismisses a cookie-consent
//! button if one is present, scrolls to the bottom and back to trigger lazy
//! loading, waits for scripts to settle, and returns the serialized DOM.

use crate::config::RendererConfig;
use crate::renderer::{RenderError, Renderer};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use url::Url;

/// Consent button labels, tried in order
const CONSENT_LABELS: &[&str] = &["Accept all", "Accept", "Accept cookies", "OK", "Agree"];

const SCROLL_TO_BOTTOM: &str = "window.scrollTo(0, document.body.scrollHeight)";
const SCROLL_TO_TOP: &str = "window.scrollTo(0, 0)";

/// Renderer backed by a shared headless Chromium instance
pub struct ChromeRenderer {
    browser: Browser,
    handler: JoinHandle<()>,
    user_agent: Option<String>,
    settle_time: Duration,
}

impl ChromeRenderer {
    /// Launches Chromium with the given configuration
    pub async fn launch(config: &RendererConfig) -> Result<Self, RenderError> {
        let mut builder = BrowserConfig::builder()
            .arg("--no-sandbox")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .window_size(1920, 1080);

        if !config.headless {
            builder = builder.with_head();
        }

        let browser_config = builder
            .build()
            .map_err(|e| RenderError::Engine(format!("Failed to build browser config: {}", e)))?;

        let (browser, mut handler) = Browser::launch(browser_config).await.map_err(|e| {
            RenderError::Engine(format!(
                "Failed to launch browser: {}. Is Chrome or Chromium installed and in PATH?",
                e
            ))
        })?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("Browser handler error: {}", e);
                }
            }
        });

        Ok(Self {
            browser,
            handler,
            user_agent: config.user_agent.clone(),
            settle_time: Duration::from_millis(config.settle_time),
        })
    }

    async fn render_page(&self, url: &Url) -> Result<String, RenderError> {
        let engine = |e: chromiumoxide::error::CdpError| RenderError::Engine(e.to_string());

        let page = self.browser.new_page("about:blank").await.map_err(engine)?;

        let result = async {
            if let Some(ua) = &self.user_agent {
                page.set_user_agent(ua.as_str()).await.map_err(engine)?;
            }

            page.goto(url.as_str()).await.map_err(|e| RenderError::Network {
                url: url.to_string(),
                message: e.to_string(),
            })?;
            page.wait_for_navigation().await.map_err(engine)?;

            if dismiss_consent(&page).await {
                tokio::time::sleep(Duration::from_millis(500)).await;
            }

            page.evaluate(SCROLL_TO_BOTTOM).await.map_err(engine)?;
            tokio::time::sleep(Duration::from_millis(1000)).await;
            page.evaluate(SCROLL_TO_TOP).await.map_err(engine)?;
            tokio::time::sleep(Duration::from_millis(300)).await;

            tokio::time::sleep(self.settle_time).await;

            page.content().await.map_err(engine)
        }
        .await;

        if let Err(e) = page.close().await {
            tracing::debug!("Failed to close tab for {}: {}", url, e);
        }

        result
    }
}

/// Clicks the first visible consent button, returning true if one was found
async fn dismiss_consent(page: &Page) -> bool {
    let labels = match serde_json::to_string(CONSENT_LABELS) {
        Ok(labels) => labels,
        Err(_) => return false,
    };
    let script = format!(
        r#"(() => {{
            const labels = {};
            const buttons = Array.from(document.querySelectorAll('button'));
            for (const label of labels) {{
                const button = buttons.find(b => b.innerText && b.innerText.trim().includes(label));
                if (button) {{ button.click(); return true; }}
            }}
            return false;
        }})()"#,
        labels
    );

    match page.evaluate(script).await {
        Ok(result) => result.into_value::<bool>().unwrap_or(false),
        Err(e) => {
            tracing::debug!("Consent dismissal script failed: {}", e);
            false
        }
    }
}

#[async_trait]
impl Renderer for ChromeRenderer {
    async fn render(&self, url: &Url, timeout: Duration) -> Result<String, RenderError> {
        tokio::time::timeout(timeout, self.render_page(url))
            .await
            .map_err(|_| RenderError::Timeout {
                url: url.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            })?
    }
}

impl Drop for ChromeRenderer {
    fn drop(&mut self) {
        self.handler.abort();
    }
}
