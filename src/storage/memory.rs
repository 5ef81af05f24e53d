//! In-process cache store.
//!
//! Uses `DashMap` so lookups on different keys do not contend. Expiry uses
//! tokio's clock, which tests can pause and advance.

use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;

use crate::error::Result;
use crate::models::AirQualityResult;
use crate::storage::CacheStore;

/// Expiry used when `now + ttl` overflows the clock.
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

#[derive(Debug, Clone)]
struct MemoryEntry {
    value: AirQualityResult,
    expires_at: Instant,
}

impl MemoryEntry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Cache store backed by a concurrent map.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: DashMap<String, MemoryEntry>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<AirQualityResult>> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            if entry.is_live(now) {
                return Ok(Some(entry.value.clone()));
            }
        }

        // The read guard is released above; removing under it would deadlock the shard.
        self.entries.remove_if(key, |_, entry| !entry.is_live(now));
        Ok(None)
    }

    async fn set(&self, key: &str, value: &AirQualityResult, ttl: Duration) -> Result<()> {
        let now = Instant::now();
        let entry = MemoryEntry {
            value: value.clone(),
            expires_at: now.checked_add(ttl).unwrap_or(now + FAR_FUTURE),
        };
        self.entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn sweep(&self) -> Result<usize> {
        let now = Instant::now();
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| !entry.is_live(now))
            .map(|entry| entry.key().clone())
            .collect();

        let mut removed = 0;
        for key in expired {
            // remove_if checks under the shard lock, so a fresh set() survives.
            if self
                .entries
                .remove_if(&key, |_, entry| !entry.is_live(Instant::now()))
                .is_some()
            {
                log::debug!("Cleared expired cache: {}", key);
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_support::sample_result;

    #[tokio::test]
    async fn test_set_then_get() {
        let store = MemoryCacheStore::new();
        let value = sample_result(25.0, 10.0);

        store.set("k", &value, Duration::from_secs(900)).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(value));
    }

    #[tokio::test]
    async fn test_missing_key() {
        let store = MemoryCacheStore::new();
        assert_eq!(store.get("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let store = MemoryCacheStore::new();
        store
            .set("k", &sample_result(25.0, 10.0), Duration::from_secs(60))
            .await
            .unwrap();
        let newer = sample_result(120.0, 20.0);
        store.set("k", &newer, Duration::from_secs(60)).await.unwrap();

        assert_eq!(store.get("k").await.unwrap(), Some(newer));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let store = MemoryCacheStore::new();
        store
            .set("k", &sample_result(25.0, 10.0), Duration::from_secs(1))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(2)).await;

        assert_eq!(store.get("k").await.unwrap(), None);
        // Lazy expiry also drops the entry.
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_removes_only_expired() {
        let store = MemoryCacheStore::new();
        let value = sample_result(25.0, 10.0);
        store.set("short", &value, Duration::from_secs(1)).await.unwrap();
        store.set("long", &value, Duration::from_secs(900)).await.unwrap();

        tokio::time::advance(Duration::from_secs(5)).await;

        assert_eq!(store.sweep().await.unwrap(), 1);
        assert_eq!(store.len(), 1);
        assert!(store.get("long").await.unwrap().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_keeps_refreshed_entry() {
        let store = MemoryCacheStore::new();
        let value = sample_result(25.0, 10.0);
        store.set("k", &value, Duration::from_secs(1)).await.unwrap();

        tokio::time::advance(Duration::from_secs(2)).await;
        store.set("k", &value, Duration::from_secs(60)).await.unwrap();

        assert_eq!(store.sweep().await.unwrap(), 0);
        assert_eq!(store.get("k").await.unwrap(), Some(value));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_set_and_sweep() {
        let store = std::sync::Arc::new(MemoryCacheStore::new());
        let value = sample_result(25.0, 10.0);

        let mut handles = Vec::new();
        for i in 0..32 {
            let store = std::sync::Arc::clone(&store);
            let value = value.clone();
            handles.push(tokio::spawn(async move {
                let key = format!("k{}", i % 4);
                store.set(&key, &value, Duration::from_secs(60)).await.unwrap();
                store.sweep().await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        for i in 0..4 {
            assert!(store.get(&format!("k{i}")).await.unwrap().is_some());
        }
    }
}
