//! Storage traits and error types
//!
//! This module defines the trait interface for artifact store backends and
//! associated error types.

use crate::item::ItemId;
use std::collections::BTreeSet;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Store lock poisoned: {0}")]
    Lock(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for artifact store implementations
///
/// An artifact store maps item IDs to the raw HTML fetched for them.
/// Implementations must be safe to share between fetch workers operating on
/// different IDs, and a `put` must never be partially visible to `get` or
/// `exists`. Writes to the same ID replace the previous artifact.
pub trait ArtifactStore: Send + Sync {
    /// Returns true if an artifact is stored for `id`
    fn exists(&self, id: &ItemId) -> StorageResult<bool>;

    /// Stores the HTML for `id`, replacing any previous artifact
    fn put(&self, id: &ItemId, html: &str) -> StorageResult<()>;

    /// Loads the stored HTML for `id`
    fn get(&self, id: &ItemId) -> StorageResult<Option<String>>;

    /// Lists the IDs of all stored artifacts
    fn list_keys(&self) -> StorageResult<BTreeSet<ItemId>>;

    /// Returns the stored artifact's length in bytes
    fn size(&self, id: &ItemId) -> StorageResult<Option<usize>> {
        Ok(self.get(id)?.map(|html| html.len()))
    }
}
