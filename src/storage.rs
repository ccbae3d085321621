use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Keys of the persisted state.
pub mod keys {
    pub const TASKS: &str = "tasks";
    pub const SHOW_SIDEBAR: &str = "showSideBar";
    pub const ACTIVE_BOARD: &str = "activeBoard";
    pub const LIGHT_THEME: &str = "light-theme";
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("storage quota exceeded writing {key:?} (limit {limit} bytes)")]
    QuotaExceeded { key: String, limit: usize },
}

/// Synchronous string key-value store. A failed write leaves the previous
/// value in place.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// Store backed by a single JSON object file. Every write rewrites the file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl JsonFileStore {
    #[tracing::instrument]
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let entries = if path.exists() {
            let data = fs::read_to_string(path)?;
            if data.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&data)?
            }
        } else {
            BTreeMap::new()
        };
        info!(path = %path.display(), keys = entries.len(), "opened store");
        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    fn write(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        debug!(file = %self.path.display(), keys = entries.len(), "saving store atomically");
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let mut temp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut temp, entries)?;
        temp.flush()?;
        temp.persist(&self.path).map_err(|err| StorageError::Io(err.error))?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError> {
        let mut next = self.entries.clone();
        next.insert(key.to_string(), value);
        self.write(&next)?;
        self.entries = next;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        if !self.entries.contains_key(key) {
            return Ok(());
        }
        let mut next = self.entries.clone();
        next.remove(key);
        self.write(&next)?;
        self.entries = next;
        Ok(())
    }
}

/// In-process store. With a quota, writes that would push the total stored
/// size (keys plus values) past it fail with `QuotaExceeded`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn with_quota(limit: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            quota: Some(limit),
        }
    }

    fn used_without(&self, key: &str) -> usize {
        self.entries
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError> {
        if let Some(limit) = self.quota {
            if self.used_without(key) + key.len() + value.len() > limit {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    limit,
                });
            }
        }
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}
