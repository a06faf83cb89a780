//! Batch harvesting
//!
//! This module contains the core fetch logic, including:
//! - Single-item fetch: render, classify, persist
//! - The retry queue with per-item backoff
//! - The worker pool that drives a whole batch

mod fetcher;
mod options;
mod orchestrator;
mod scheduler;

pub use fetcher::{ItemFetcher, RENDER_TIMEOUT_SLACK};
pub use options::BatchOptions;
pub use orchestrator::Orchestrator;
