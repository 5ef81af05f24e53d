//! Local filesystem cache store.
//!
//! One JSON file per key, written atomically (temp file, then rename), so a
//! reader never sees a partial entry. Mutations (`set` and the delete half of
//! `sweep`) are serialized by a store-wide lock, and `sweep` re-reads an entry
//! under that lock before deleting it.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! ├── air_quality_37.41_127.09.json
//! └── air_quality_35.18_129.08.json
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::models::AirQualityResult;
use crate::storage::{CacheEntry, CacheStore, storage_name};

/// Local filesystem cache backend.
#[derive(Debug)]
pub struct LocalCacheStore {
    root_dir: PathBuf,
    write_lock: Mutex<()>,
}

/// What a file on disk turned out to contain.
enum Slot {
    Missing,
    Corrupt,
    Entry(CacheEntry),
}

impl LocalCacheStore {
    /// Create a new LocalCacheStore rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Get the full path for a cache key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(storage_name(key))
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.root_dir).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, path).await
    }

    async fn read_slot(&self, path: &Path) -> Result<Slot> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Slot::Missing),
            Err(e) => return Err(AppError::storage(format!("{}: {}", path.display(), e))),
        };

        match serde_json::from_slice::<CacheEntry>(&bytes) {
            Ok(entry) => Ok(Slot::Entry(entry)),
            Err(e) => {
                log::warn!("Unreadable cache file {}: {}", path.display(), e);
                Ok(Slot::Corrupt)
            }
        }
    }

    async fn remove(&self, path: &Path) -> Result<bool> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(AppError::storage(format!("{}: {}", path.display(), e))),
        }
    }

    /// Delete a file if it is still expired or corrupt, checked under the write lock.
    async fn remove_if_stale(&self, path: &Path) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        match self.read_slot(path).await? {
            Slot::Missing => Ok(false),
            Slot::Corrupt => self.remove(path).await,
            Slot::Entry(entry) if entry.is_expired(Utc::now()) => self.remove(path).await,
            Slot::Entry(_) => Ok(false),
        }
    }
}

#[async_trait]
impl CacheStore for LocalCacheStore {
    async fn get(&self, key: &str) -> Result<Option<AirQualityResult>> {
        match self.read_slot(&self.path(key)).await? {
            Slot::Entry(entry) if entry.key == key && !entry.is_expired(Utc::now()) => {
                Ok(Some(entry.value))
            }
            _ => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &AirQualityResult, ttl: Duration) -> Result<()> {
        let entry = CacheEntry::new(key, value, ttl);
        let bytes = serde_json::to_vec_pretty(&entry)?;
        let path = self.path(key);

        let _guard = self.write_lock.lock().await;
        self.write_bytes(&path, &bytes)
            .await
            .map_err(|e| AppError::storage(format!("{}: {}", path.display(), e)))
    }

    async fn sweep(&self) -> Result<usize> {
        let mut dir = match tokio::fs::read_dir(&self.root_dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(AppError::storage(e)),
        };

        let now = Utc::now();
        let mut candidates = Vec::new();
        while let Some(item) = dir.next_entry().await.map_err(AppError::storage)? {
            let path = item.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            match self.read_slot(&path).await? {
                Slot::Entry(entry) if !entry.is_expired(now) => {}
                Slot::Missing => {}
                _ => candidates.push(path),
            }
        }

        let mut removed = 0;
        for path in candidates {
            if self.remove_if_stale(&path).await? {
                log::debug!("Cleared expired cache: {}", path.display());
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn backend_name(&self) -> &'static str {
        "local"
    }
}
