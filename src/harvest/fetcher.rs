//! Single-item fetch
//!
//! One attempt for one ID: build the URL, render it, classify the HTML and
//! persist recognised pages. Every failure is folded into a [`FetchOutcome`]
//! so the orchestrator only has to decide whether to retry.

use crate::classify::{classify, Classification};
use crate::item::{InputError, ItemId, UrlTemplate};
use crate::profile::SiteProfile;
use crate::renderer::{RenderError, Renderer};
use crate::state::FetchOutcome;
use crate::storage::ArtifactStore;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Extra time granted on top of the render timeout before a render is abandoned
pub const RENDER_TIMEOUT_SLACK: Duration = Duration::from_secs(5);

/// Message for pages that matched neither removal nor presence indicators
const NOT_RECOGNIZED: &str = "structure not recognized";

/// Fetches, classifies and stores single items
pub struct ItemFetcher {
    renderer: Arc<dyn Renderer>,
    store: Arc<dyn ArtifactStore>,
    profile: Option<Arc<SiteProfile>>,
    render_timeout: Duration,
}

impl ItemFetcher {
    /// Creates a new fetcher
    ///
    /// # Arguments
    ///
    /// * `renderer` - Renderer used for every attempt
    /// * `store` - Destination for recognised pages
    /// * `profile` - Site profile for classification, if any
    /// * `render_timeout` - Time allowed for a single render
    pub fn new(
        renderer: Arc<dyn Renderer>,
        store: Arc<dyn ArtifactStore>,
        profile: Option<Arc<SiteProfile>>,
        render_timeout: Duration,
    ) -> Self {
        Self {
            renderer,
            store,
            profile,
            render_timeout,
        }
    }

    pub fn store(&self) -> &Arc<dyn ArtifactStore> {
        &self.store
    }

    pub fn profile(&self) -> Option<&SiteProfile> {
        self.profile.as_deref()
    }

    /// Runs one fetch attempt for `id`
    ///
    /// # Returns
    ///
    /// * `Ok(FetchOutcome)` - Outcome of the attempt
    /// * `Err(InputError)` - The ID does not produce a valid URL; nothing was
    ///   rendered
    pub async fn fetch(
        &self,
        id: &ItemId,
        template: &UrlTemplate,
    ) -> Result<FetchOutcome, InputError> {
        let url = template.resolve(id)?;
        Ok(self.fetch_url(id, &url).await)
    }

    /// Runs one fetch attempt against an already resolved URL
    pub(crate) async fn fetch_url(&self, id: &ItemId, url: &Url) -> FetchOutcome {
        tracing::debug!("Rendering {} ({})", id, url);

        let rendered = tokio::time::timeout(
            self.render_timeout + RENDER_TIMEOUT_SLACK,
            self.renderer.render(url, self.render_timeout),
        )
        .await;

        let html = match rendered {
            Ok(Ok(html)) => html,
            Ok(Err(e)) => return self.render_failure(id, e),
            Err(_) => {
                tracing::warn!("Renderer did not return for {} within its timeout", id);
                return FetchOutcome::retryable(format!(
                    "render timed out after {}ms",
                    self.render_timeout.as_millis()
                ));
            }
        };

        match classify(&html, self.profile()) {
            Classification::Removed { pattern } => {
                tracing::info!("{} removed (matched '{}')", id, pattern);
                FetchOutcome::Removed { reason: pattern }
            }
            Classification::Inconclusive => {
                tracing::debug!("{} rendered but not recognized", id);
                FetchOutcome::retryable(NOT_RECOGNIZED)
            }
            Classification::Success => match self.store.put(id, &html) {
                Ok(()) => {
                    tracing::debug!("Stored {} ({} bytes)", id, html.len());
                    FetchOutcome::Success {
                        bytes_written: html.len(),
                    }
                }
                Err(e) => {
                    tracing::error!("Failed to store {}: {}", id, e);
                    FetchOutcome::fatal(format!("storage failure: {}", e))
                }
            },
        }
    }

    /// Maps a renderer error onto an outcome
    ///
    /// Error pages carrying a body are checked against the removal patterns
    /// first, so a 404 page with a recognised "not found" message is
    /// reported as removed instead of being retried.
    fn render_failure(&self, id: &ItemId, error: RenderError) -> FetchOutcome {
        if let (RenderError::Status { body: Some(body), .. }, Some(profile)) =
            (&error, self.profile())
        {
            if let Classification::Removed { pattern } = classify(body, Some(profile)) {
                tracing::info!("{} removed ({}, matched '{}')", id, error, pattern);
                return FetchOutcome::Removed { reason: pattern };
            }
        }

        tracing::warn!("Render failed for {}: {}", id, error);
        FetchOutcome::retryable(error.to_string())
    }
}
