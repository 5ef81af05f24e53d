//! Cache storage for air-quality results.
//!
//! Results are keyed by coordinates rounded to two decimal places, so every
//! request inside the same ~1.1 km grid cell shares one entry.
//!
//! ## Backends
//!
//! ```text
//! memory  DashMap in the process (default)
//! local   {dir}/air_quality_37.41_127.09.json
//! s3      s3://{bucket}/{prefix}/cache/air_quality_37.41_127.09.json
//! ```
//!
//! Every backend expires lazily on `get` and also supports `sweep`, which
//! removes expired entries in the background. A store is correct even if
//! `sweep` never runs.

pub mod local;
pub mod memory;
#[cfg(feature = "s3")]
pub mod s3;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
#[cfg(not(feature = "s3"))]
use crate::error::AppError;
use crate::models::{AirQualityResult, CacheBackend, CacheConfig};

// Re-export for convenience
pub use local::LocalCacheStore;
pub use memory::MemoryCacheStore;
#[cfg(feature = "s3")]
pub use s3::S3CacheStore;

/// Trait for cache storage backends.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Cached value, or `None` when absent or expired.
    async fn get(&self, key: &str) -> Result<Option<AirQualityResult>>;

    /// Store a value that expires `ttl` from now, replacing any previous entry.
    async fn set(&self, key: &str, value: &AirQualityResult, ttl: Duration) -> Result<()>;

    /// Delete expired entries and return how many were removed.
    ///
    /// Expiry is re-checked at deletion time, so an entry refreshed by a
    /// concurrent `set` is never removed.
    async fn sweep(&self) -> Result<usize>;

    /// Short backend name for logs.
    fn backend_name(&self) -> &'static str;
}

/// Persisted form of a cached result, used by the file and object backends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub value: AirQualityResult,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(key: &str, value: &AirQualityResult, ttl: Duration) -> Self {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        let expires_at = Utc::now()
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self {
            key: key.to_string(),
            value: value.clone(),
            expires_at,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Round a coordinate to two decimal places.
pub fn round_coordinate(value: f64) -> f64 {
    // Ties round toward positive infinity. Adding 0.0 turns -0.0 into 0.0.
    (value * 100.0 + 0.5).floor() / 100.0 + 0.0
}

/// Cache key for a location: `"<prefix><roundedLat>:<roundedLon>"`.
pub fn cache_key(prefix: &str, latitude: f64, longitude: f64) -> String {
    format!(
        "{}{}:{}",
        prefix,
        round_coordinate(latitude),
        round_coordinate(longitude)
    )
}

/// File or object name for a key; characters outside `[A-Za-z0-9._-]` become `_`.
pub fn storage_name(key: &str) -> String {
    let stem: String = key
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{stem}.json")
}

/// Open the backend selected by the configuration.
pub async fn open(config: &CacheConfig) -> Result<Arc<dyn CacheStore>> {
    let store: Arc<dyn CacheStore> = match config.backend {
        CacheBackend::Memory => Arc::new(MemoryCacheStore::new()),
        CacheBackend::Local => Arc::new(LocalCacheStore::new(&config.dir)),
        #[cfg(feature = "s3")]
        CacheBackend::S3 => Arc::new(S3CacheStore::from_config(config).await),
        #[cfg(not(feature = "s3"))]
        CacheBackend::S3 => {
            return Err(AppError::config(
                "cache.backend = \"s3\" requires the `s3` feature",
            ));
        }
    };
    log::info!("Using {} cache store", store.backend_name());
    Ok(store)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearby_coordinates_share_key() {
        assert_eq!(
            cache_key("air_quality:", 37.4119, 127.0925),
            cache_key("air_quality:", 37.4123, 127.0928)
        );
        assert_eq!(
            cache_key("air_quality:", 37.4119, 127.0925),
            "air_quality:37.41:127.09"
        );
    }

    #[test]
    fn test_key_formatting() {
        assert_eq!(cache_key("p:", 37.0, 127.1), "p:37:127.1");
        assert_eq!(cache_key("p:", -0.001, 0.004), "p:0:0");
        assert_eq!(cache_key("p:", -33.8688, 151.2093), "p:-33.87:151.21");
    }

    #[test]
    fn test_round_coordinate_ties_go_up() {
        assert_eq!(round_coordinate(0.125), 0.13);
        assert_eq!(round_coordinate(-0.125), -0.12);
        assert_eq!(round_coordinate(-0.005), 0.0);
        assert!(round_coordinate(-0.005).is_sign_positive());
    }

    #[test]
    fn test_storage_name() {
        assert_eq!(
            storage_name("air_quality:37.41:127.09"),
            "air_quality_37.41_127.09.json"
        );
        assert_eq!(storage_name("a/b:-1"), "a_b_-1.json");
    }

    #[test]
    fn test_entry_expiry() {
        let value = test_support::sample_result(10.0, 5.0);
        let entry = CacheEntry::new("k", &value, Duration::from_secs(60));
        assert!(!entry.is_expired(Utc::now()));
        assert!(entry.is_expired(entry.expires_at));

        let immediate = CacheEntry::new("k", &value, Duration::ZERO);
        assert!(immediate.is_expired(Utc::now()));
    }

    #[tokio::test]
    async fn test_open_memory_backend() {
        let store = open(&CacheConfig::default()).await.unwrap();
        assert_eq!(store.backend_name(), "memory");
    }
}
