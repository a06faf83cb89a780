//! Page-Harvest: a polite batch page fetcher
//!
//! This crate turns a list of item IDs into rendered, classified and stored
//! HTML pages. Fetches run on a bounded worker pool with per-worker pacing,
//! retry with exponential backoff, and dedup against the artifact store.

pub mod classify;
pub mod config;
pub mod harvest;
pub mod item;
pub mod output;
pub mod profile;
pub mod renderer;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for Page-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Site profile error: {0}")]
    Profile(#[from] profile::ProfileError),

    #[error("Invalid input: {0}")]
    InvalidInput(#[from] item::InputError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Render error: {0}")]
    Render(#[from] renderer::RenderError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Page-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use classify::{classify, Classification};
pub use config::Config;
pub use harvest::{BatchOptions, ItemFetcher, Orchestrator};
pub use item::{ItemId, UrlTemplate};
pub use profile::{load_site_profile, SiteProfile};
pub use renderer::Renderer;
pub use state::{FetchOutcome, ItemResult, ItemStatus};
pub use storage::ArtifactStore;
