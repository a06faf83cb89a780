//! State module for tracking fetch progress
//!
//! This module provides the outcome types produced while fetching items.
//!
//! # Components
//!
//! - `FetchOutcome`: The result of a single fetch attempt
//! - `ItemStatus`: The final status reported for an item
//! - `ItemResult`: The per-item record returned from a batch run

mod item_status;
mod outcome;

// Re-export main types
pub use item_status::ItemStatus;
pub use outcome::{FetchOutcome, ItemResult, CANCELLED_MESSAGE};
