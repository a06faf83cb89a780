//! Final item status definitions
//!
//! Every requested item ends a batch run in exactly one of these states.
use serde::Serialize;
use std::fmt;

/// Represents the final status of an item after a batch run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    /// Page was fetched, recognised and stored (or was already stored)
    Success,

    /// Page reports the item as removed or unavailable
    Removed,

    /// Fetch failed, was not recognised, or was cancelled
    Error,
}

impl ItemStatus {
    /// Converts the status to its string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Removed => "removed",
            Self::Error => "error",
        }
    }

    /// Returns all possible statuses
    pub fn all() -> [Self; 3] {
        [Self::Success, Self::Removed, Self::Error]
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
