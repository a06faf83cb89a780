use crate::item::ItemId;
use crate::state::ItemStatus;
use serde::Serialize;

/// Message reported for items left unfinished by a cancelled run
pub const CANCELLED_MESSAGE: &str = "cancelled";

/// Result of a single fetch attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Page was recognised and persisted
    Success {
        /// Length of the stored HTML in bytes
        bytes_written: usize,
    },

    /// Page matched a removal indicator
    Removed {
        /// The removal pattern that matched
        reason: String,
    },

    /// Attempt failed
    Error {
        /// Error description
        message: String,
        /// Whether another attempt may produce a different outcome
        retryable: bool,
    },
}

impl FetchOutcome {
    pub fn retryable(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
            retryable: true,
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
            retryable: false,
        }
    }

    /// Returns true if the batch may schedule another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Error { retryable: true, .. })
    }

    /// Maps the outcome onto the reported item status
    pub fn status(&self) -> ItemStatus {
        match self {
            Self::Success { .. } => ItemStatus::Success,
            Self::Removed { .. } => ItemStatus::Removed,
            Self::Error { .. } => ItemStatus::Error,
        }
    }
}

/// Final per-item record of a batch run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemResult {
    pub id: ItemId,
    pub status: ItemStatus,
    /// Failure message for errors, removal reason for removed items
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Size of the stored artifact for successful items
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<usize>,
    /// Number of renderer invocations made for this item in this run
    pub attempts: u32,
    /// True when the result comes from an artifact stored by an earlier run
    pub skipped: bool,
}

impl ItemResult {
    /// Builds the final record from the last attempt's outcome
    pub fn from_outcome(id: ItemId, outcome: FetchOutcome, attempts: u32) -> Self {
        let status = outcome.status();
        let (error_message, bytes) = match outcome {
            FetchOutcome::Success { bytes_written } => (None, Some(bytes_written)),
            FetchOutcome::Removed { reason } => (Some(reason), None),
            FetchOutcome::Error { message, .. } => (Some(message), None),
        };

        Self {
            id,
            status,
            error_message,
            bytes,
            attempts,
            skipped: false,
        }
    }

    /// Record for an item whose artifact already exists
    pub fn already_saved(id: ItemId, bytes: Option<usize>) -> Self {
        Self {
            id,
            status: ItemStatus::Success,
            error_message: None,
            bytes,
            attempts: 0,
            skipped: true,
        }
    }

    /// Record for an item that did not finish before cancellation
    pub fn cancelled(id: ItemId, attempts: u32) -> Self {
        Self::from_outcome(id, FetchOutcome::fatal(CANCELLED_MESSAGE), attempts)
    }

    pub fn is_success(&self) -> bool {
        self.status == ItemStatus::Success
    }
}
