use crate::item::ItemId;
use crate::storage::traits::{ArtifactStore, StorageError, StorageResult};
use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;

/// In-process artifact store
#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    artifacts: RwLock<HashMap<ItemId, String>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.artifacts.read().map(|a| a.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Lock(e.to_string())
}

impl ArtifactStore for MemoryArtifactStore {
    fn exists(&self, id: &ItemId) -> StorageResult<bool> {
        Ok(self.artifacts.read().map_err(poisoned)?.contains_key(id))
    }

    fn put(&self, id: &ItemId, html: &str) -> StorageResult<()> {
        self.artifacts
            .write()
            .map_err(poisoned)?
            .insert(id.clone(), html.to_string());
        Ok(())
    }

    fn get(&self, id: &ItemId) -> StorageResult<Option<String>> {
        Ok(self.artifacts.read().map_err(poisoned)?.get(id).cloned())
    }

    fn list_keys(&self) -> StorageResult<BTreeSet<ItemId>> {
        Ok(self
            .artifacts
            .read()
            .map_err(poisoned)?
            .keys()
            .cloned()
            .collect())
    }
}
