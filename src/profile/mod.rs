//! Site profile module
//!
//! A site profile describes how to recognise a successfully loaded content
//! page and a removed item for one site, plus extraction hints that are
//! passed through untouched for downstream parsing.
//!
//! Profiles are JSON documents produced by an external analysis step. The
//! file is optional: a missing file means "no profile" and classification
//! falls back to accepting any non-empty page.
//!
//! # Example
//!
//! ```no_run
//! use page_harvest::profile::load_site_profile;
//! use std::path::Path;
//!
//! match load_site_profile(Path::new("site-profile.json")).unwrap() {
//!     Some(profile) => println!("Using site profile for: {}", profile.domain()),
//!     None => println!("No site profile found"),
//! }
//! ```

mod loader;
mod types;

pub use loader::{load_site_profile, DEFAULT_PROFILE_PATH};
pub use types::{
    BoilerplateSpec, ContentSpec, FieldKind, FieldSpec, ProfileDocument, ScopeMode, SiteProfile,
};

use thiserror::Error;

/// Errors raised while loading a site profile
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Failed to read site profile: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse site profile JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid removal pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },

    #[error("Validation error: {0}")]
    Validation(String),
}
