//! Item identifiers and URL templates
//!
//! An item ID names one content unit. It is substituted into a URL template
//! to build the fetch URL and doubles as the artifact storage key, so both
//! types validate their input up front.

mod id;
mod template;

pub use id::{dedup_ids, ItemId};
pub use template::{UrlTemplate, PLACEHOLDER};

use thiserror::Error;

/// Errors for malformed batch input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("Item ID cannot be empty")]
    EmptyId,

    #[error("Item ID '{0}' contains forbidden characters")]
    UnsafeId(String),

    #[error("URL template '{0}' must contain exactly one {{id}} placeholder")]
    MissingPlaceholder(String),

    #[error("URL template '{template}' contains {count} {{id}} placeholders, expected one")]
    MultiplePlaceholders { template: String, count: usize },

    #[error("URL template produced an invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}
