//! Storage module for persisting fetched artifacts
//!
//! This module holds the raw HTML of successfully fetched items, keyed by
//! item ID. It provides:
//! - The `ArtifactStore` trait used by the fetcher and orchestrator
//! - A filesystem backend (`<id>.html` files written atomically)
//! - A SQLite backend (single `artifacts` table)
//! - An in-memory backend for tests and embedding

mod fs;
mod memory;
mod schema;
mod sqlite;
mod traits;

pub use fs::FsArtifactStore;
pub use memory::MemoryArtifactStore;
pub use sqlite::SqliteArtifactStore;
pub use traits::{ArtifactStore, StorageError, StorageResult};

use crate::config::{ArtifactBackend, OutputConfig};
use std::path::Path;
use std::sync::Arc;

/// Opens the artifact store selected by the output configuration
///
/// # Arguments
///
/// * `config` - The output configuration
///
/// # Returns
///
/// * `Ok(Arc<dyn ArtifactStore>)` - Successfully opened store
/// * `Err(StorageError)` - Failed to create the directory or open the database
pub fn open_artifact_store(config: &OutputConfig) -> StorageResult<Arc<dyn ArtifactStore>> {
    match config.backend {
        ArtifactBackend::Filesystem => {
            let store = FsArtifactStore::new(Path::new(&config.artifact_dir))?;
            Ok(Arc::new(store))
        }
        ArtifactBackend::Sqlite => {
            let store = SqliteArtifactStore::new(Path::new(&config.database_path))?;
            Ok(Arc::new(store))
        }
    }
}

/// Opens the configured store only if it is already on disk
///
/// Used by read-only modes that must not create the artifact directory or
/// database as a side effect.
pub fn open_existing_artifact_store(
    config: &OutputConfig,
) -> StorageResult<Option<Arc<dyn ArtifactStore>>> {
    let location = match config.backend {
        ArtifactBackend::Filesystem => &config.artifact_dir,
        ArtifactBackend::Sqlite => &config.database_path,
    };

    if !Path::new(location).try_exists()? {
        return Ok(None);
    }
    open_artifact_store(config).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemId;

    #[test]
    fn test_open_filesystem_store() {
        let dir = tempfile::tempdir().unwrap();
        let config = OutputConfig {
            backend: ArtifactBackend::Filesystem,
            artifact_dir: dir.path().join("output").display().to_string(),
            database_path: String::new(),
        };

        let store = open_artifact_store(&config).unwrap();
        let id = ItemId::new("item-1").unwrap();
        store.put(&id, "<html></html>").unwrap();

        assert!(dir.path().join("output").join("item-1.html").exists());
    }

    #[test]
    fn test_open_sqlite_store() {
        let dir = tempfile::tempdir().unwrap();
        let config = OutputConfig {
            backend: ArtifactBackend::Sqlite,
            artifact_dir: String::new(),
            database_path: dir.path().join("artifacts.db").display().to_string(),
        };

        let store = open_artifact_store(&config).unwrap();
        let id = ItemId::new("item-1").unwrap();
        store.put(&id, "<html></html>").unwrap();

        assert!(store.exists(&id).unwrap());
    }

    #[test]
    fn test_open_existing_leaves_missing_store_alone() {
        let dir = tempfile::tempdir().unwrap();
        let config = OutputConfig {
            backend: ArtifactBackend::Filesystem,
            artifact_dir: dir.path().join("output").display().to_string(),
            database_path: dir.path().join("artifacts.db").display().to_string(),
        };

        assert!(open_existing_artifact_store(&config).unwrap().is_none());
        assert!(!dir.path().join("output").exists());

        let sqlite = OutputConfig {
            backend: ArtifactBackend::Sqlite,
            ..config.clone()
        };
        assert!(open_existing_artifact_store(&sqlite).unwrap().is_none());
        assert!(!dir.path().join("artifacts.db").exists());

        open_artifact_store(&config).unwrap();
        assert!(open_existing_artifact_store(&config).unwrap().is_some());
    }
}
