//! SQLite artifact store
//!
//! This module provides a SQLite-based implementation of the ArtifactStore
//! trait. Each `put` is a single upsert statement, so readers never observe
//! a half-written artifact.

use crate::item::ItemId;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{ArtifactStore, StorageError, StorageResult};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// SQLite artifact backend
pub struct SqliteArtifactStore {
    conn: Mutex<Connection>,
}

impl SqliteArtifactStore {
    /// Creates a new SqliteArtifactStore instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteArtifactStore)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StorageError::Lock(e.to_string()))
    }
}

impl ArtifactStore for SqliteArtifactStore {
    fn exists(&self, id: &ItemId) -> StorageResult<bool> {
        let found: Option<i64> = self
            .conn()?
            .query_row(
                "SELECT 1 FROM artifacts WHERE id = ?1",
                params![id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn put(&self, id: &ItemId, html: &str) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn()?.execute(
            "INSERT INTO artifacts (id, html, bytes, fetched_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET
                html = excluded.html,
                bytes = excluded.bytes,
                fetched_at = excluded.fetched_at",
            params![id.as_str(), html, html.len() as i64, now],
        )?;
        Ok(())
    }

    fn get(&self, id: &ItemId) -> StorageResult<Option<String>> {
        let html = self
            .conn()?
            .query_row(
                "SELECT html FROM artifacts WHERE id = ?1",
                params![id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(html)
    }

    fn list_keys(&self) -> StorageResult<BTreeSet<ItemId>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT id FROM artifacts")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut keys = BTreeSet::new();
        for raw in rows {
            let raw = raw?;
            match ItemId::new(raw.as_str()) {
                Ok(id) => {
                    keys.insert(id);
                }
                Err(e) => tracing::debug!("Skipping stored key '{}': {}", raw, e),
            }
        }

        Ok(keys)
    }

    fn size(&self, id: &ItemId) -> StorageResult<Option<usize>> {
        let bytes: Option<i64> = self
            .conn()?
            .query_row(
                "SELECT bytes FROM artifacts WHERE id = ?1",
                params![id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(bytes.map(|b| b as usize))
    }
}
