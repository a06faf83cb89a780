//! Filesystem artifact store
//!
//! Each artifact is a `<id>.html` file in one directory. Writes land in a
//! hidden temp file in the same directory and are renamed into place, so a
//! reader sees either the old artifact or the new one, never a prefix.

use crate::item::ItemId;
use crate::storage::traits::{ArtifactStore, StorageResult};
use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};

const EXTENSION: &str = "html";

/// Directory-backed artifact store
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    dir: PathBuf,
}

impl FsArtifactStore {
    /// Opens a store rooted at `dir`, creating the directory if needed
    pub fn new(dir: &Path) -> StorageResult<Self> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    /// Path of the artifact file for `id`
    pub fn artifact_path(&self, id: &ItemId) -> PathBuf {
        self.dir.join(format!("{}.{}", id, EXTENSION))
    }
}

impl ArtifactStore for FsArtifactStore {
    fn exists(&self, id: &ItemId) -> StorageResult<bool> {
        match std::fs::metadata(self.artifact_path(id)) {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, id: &ItemId, html: &str) -> StorageResult<()> {
        let mut temp = tempfile::Builder::new()
            .prefix(".")
            .suffix(".partial")
            .tempfile_in(&self.dir)?;

        temp.write_all(html.as_bytes())?;
        temp.as_file().sync_all()?;
        temp.persist(self.artifact_path(id))
            .map_err(|e| e.error)?;

        tracing::trace!("Wrote {} bytes to {}", html.len(), self.artifact_path(id).display());
        Ok(())
    }

    fn get(&self, id: &ItemId) -> StorageResult<Option<String>> {
        match std::fs::read_to_string(self.artifact_path(id)) {
            Ok(html) => Ok(Some(html)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn list_keys(&self) -> StorageResult<BTreeSet<ItemId>> {
        let mut keys = BTreeSet::new();

        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();

            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }

            // Temp files are dot-prefixed and never end in .html, but a
            // stray file with an unusable name is skipped rather than fatal.
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match ItemId::new(stem) {
                Ok(id) => {
                    keys.insert(id);
                }
                Err(e) => tracing::debug!("Skipping {}: {}", path.display(), e),
            }
        }

        Ok(keys)
    }

    fn size(&self, id: &ItemId) -> StorageResult<Option<usize>> {
        match std::fs::metadata(self.artifact_path(id)) {
            Ok(meta) => Ok(Some(meta.len() as usize)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
