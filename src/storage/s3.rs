//! AWS S3 cache store.
//!
//! Lets several Lambda instances share one cache. Each key is an object under
//! `{prefix}/cache/` holding a serialized `CacheEntry`; expiry is the
//! `expires_at` inside the body, checked on every read.
//!
//! Deletes made by `sweep` re-read the object first and are serialized with
//! this instance's writes. Writes from other instances can still land between
//! that re-read and the delete; the next `get` then misses and refetches.

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::models::{AirQualityResult, CacheConfig};
use crate::storage::{CacheEntry, CacheStore, storage_name};

/// S3-based cache storage.
pub struct S3CacheStore {
    client: Client,
    bucket: String,
    prefix: String,
    write_lock: Mutex<()>,
}

impl S3CacheStore {
    /// Create a new S3 cache store.
    pub fn new(client: Client, bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            prefix: prefix.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Create the store from cache settings and the ambient AWS configuration.
    pub async fn from_config(config: &CacheConfig) -> Self {
        let aws = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(Client::new(&aws), &config.s3_bucket, &config.s3_prefix)
    }

    fn cache_prefix(&self) -> String {
        let trimmed = self.prefix.trim_matches('/');
        if trimmed.is_empty() {
            "cache/".to_string()
        } else {
            format!("{trimmed}/cache/")
        }
    }

    fn object_key(&self, key: &str) -> String {
        format!("{}{}", self.cache_prefix(), storage_name(key))
    }

    /// Read an entry; `Ok(None)` when the object does not exist or is unreadable.
    async fn read_entry(&self, object_key: &str) -> Result<Option<CacheEntry>> {
        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(object_key)
            .send()
            .await;

        let output = match result {
            Ok(output) => output,
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_no_such_key() {
                    return Ok(None);
                }
                return Err(AppError::storage(format!(
                    "s3://{}/{}: {}",
                    self.bucket, object_key, service_err
                )));
            }
        };

        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| AppError::storage(format!("s3://{}/{}: {}", self.bucket, object_key, e)))?
            .into_bytes();

        match serde_json::from_slice::<CacheEntry>(&bytes) {
            Ok(entry) => Ok(Some(entry)),
            Err(e) => {
                log::warn!("Unreadable cache object s3://{}/{}: {}", self.bucket, object_key, e);
                Ok(None)
            }
        }
    }

    async fn delete_object(&self, object_key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(object_key)
            .send()
            .await
            .map_err(|e| AppError::storage(format!("s3://{}/{}: {}", self.bucket, object_key, e)))?;
        Ok(())
    }

    /// All object keys under the cache prefix.
    async fn list_keys(&self) -> Result<Vec<String>> {
        let prefix = self.cache_prefix();
        let mut keys = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let output = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(&prefix)
                .set_continuation_token(continuation.take())
                .send()
                .await
                .map_err(|e| AppError::storage(format!("s3://{}/{}: {}", self.bucket, prefix, e)))?;

            keys.extend(
                output
                    .contents()
                    .iter()
                    .filter_map(|object| object.key())
                    .filter(|key| key.ends_with(".json"))
                    .map(str::to_string),
            );

            match output.next_continuation_token() {
                Some(token) if output.is_truncated().unwrap_or(false) => {
                    continuation = Some(token.to_string());
                }
                _ => break,
            }
        }
        Ok(keys)
    }
}

#[async_trait]
impl CacheStore for S3CacheStore {
    async fn get(&self, key: &str) -> Result<Option<AirQualityResult>> {
        let entry = self.read_entry(&self.object_key(key)).await?;
        Ok(entry
            .filter(|entry| entry.key == key && !entry.is_expired(Utc::now()))
            .map(|entry| entry.value))
    }

    async fn set(&self, key: &str, value: &AirQualityResult, ttl: Duration) -> Result<()> {
        let entry = CacheEntry::new(key, value, ttl);
        let body = ByteStream::from(serde_json::to_vec(&entry)?);
        let object_key = self.object_key(key);

        let _guard = self.write_lock.lock().await;
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&object_key)
            .body(body)
            .content_type("application/json")
            .send()
            .await
            .map_err(|e| AppError::storage(format!("s3://{}/{}: {}", self.bucket, object_key, e)))?;
        Ok(())
    }

    async fn sweep(&self) -> Result<usize> {
        let mut removed = 0;
        for object_key in self.list_keys().await? {
            let now = Utc::now();
            let stale = match self.read_entry(&object_key).await? {
                Some(entry) => entry.is_expired(now),
                None => true,
            };
            if !stale {
                continue;
            }

            let _guard = self.write_lock.lock().await;
            let still_stale = match self.read_entry(&object_key).await? {
                Some(entry) => entry.is_expired(Utc::now()),
                None => true,
            };
            if still_stale {
                self.delete_object(&object_key).await?;
                log::debug!("Cleared expired cache: s3://{}/{}", self.bucket, object_key);
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn backend_name(&self) -> &'static str {
        "s3"
    }
}
