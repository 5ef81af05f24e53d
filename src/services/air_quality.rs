// src/services/air_quality.rs

//! Cached air-quality lookups.
//!
//! ```text
//! coords -> validate -> cache.get ─hit─> result
//!                          │
//!                         miss
//!                          v
//!                  source.fetch -> classify x2 -> worse_of -> cache.set -> result
//! ```

use std::sync::Arc;
use std::time::Duration;

use crate::error::{AppError, Result};
use crate::models::{AirQualityResult, CacheConfig, Config, Coordinates, Pollutant, PollutantReading};
use crate::services::classifier::{classify, worse_of};
use crate::services::naver::NaverAirSource;
use crate::services::source::{AirQualitySource, RawAirData};
use crate::storage::{self, CacheStore};

/// Read-through cache in front of an air-quality source.
#[derive(Clone)]
pub struct AirQualityService {
    store: Arc<dyn CacheStore>,
    source: Arc<dyn AirQualitySource>,
    ttl: Duration,
    key_prefix: String,
}

impl AirQualityService {
    pub fn new(
        store: Arc<dyn CacheStore>,
        source: Arc<dyn AirQualitySource>,
        cache: &CacheConfig,
    ) -> Self {
        Self {
            store,
            source,
            ttl: cache.ttl(),
            key_prefix: cache.key_prefix.clone(),
        }
    }

    /// Build the configured store and the page scraper.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let store = storage::open(&config.cache).await?;
        let source: Arc<dyn AirQualitySource> = Arc::new(NaverAirSource::new(&config.fetcher)?);
        Ok(Self::new(store, source, &config.cache))
    }

    /// The backing store, shared with the sweeper.
    pub fn store(&self) -> Arc<dyn CacheStore> {
        Arc::clone(&self.store)
    }

    pub fn cache_key(&self, coords: Coordinates) -> String {
        storage::cache_key(&self.key_prefix, coords.latitude, coords.longitude)
    }

    /// Air quality for a location, served from cache when fresh.
    ///
    /// Cache failures never fail the request: a failed read counts as a miss
    /// and a failed write is logged. Upstream failures are not cached.
    pub async fn get_air_quality(&self, latitude: f64, longitude: f64) -> Result<AirQualityResult> {
        let coords = Coordinates::new(latitude, longitude)?;
        let key = self.cache_key(coords);

        match self.store.get(&key).await {
            Ok(Some(cached)) => {
                log::debug!("Cache hit for {}", key);
                return Ok(cached);
            }
            Ok(None) => log::debug!("Cache miss for {}", key),
            Err(e) => log::warn!("Cache read failed for {}, fetching: {}", key, e),
        }

        let raw = self.source.fetch(coords).await.map_err(|e| match e {
            AppError::UpstreamUnavailable(_) => e,
            other => AppError::upstream(other),
        })?;
        let result = build_result(raw);

        if let Err(e) = self.store.set(&key, &result, self.ttl).await {
            log::warn!("Cache write failed for {}: {}", key, e);
        }
        Ok(result)
    }
}

/// Classify raw readings into a full result.
pub fn build_result(raw: RawAirData) -> AirQualityResult {
    let pm10_status = classify(Pollutant::Pm10, raw.pm10);
    let pm25_status = classify(Pollutant::Pm25, raw.pm25);
    let worst = worse_of(&pm10_status, &pm25_status).clone();

    AirQualityResult {
        pm10: PollutantReading::new(Pollutant::Pm10, pm10_status.value),
        pm25: PollutantReading::new(Pollutant::Pm25, pm25_status.value),
        pm10_status,
        pm25_status,
        worst,
        station: raw.station,
        timestamp: raw.timestamp,
        weather: raw.weather,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::models::SeverityLevel;
    use crate::storage::MemoryCacheStore;

    /// Source returning queued readings and counting calls.
    struct MockSource {
        calls: AtomicUsize,
        responses: Mutex<Vec<Result<RawAirData>>>,
    }

    impl MockSource {
        fn new(responses: Vec<Result<RawAirData>>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                responses: Mutex::new(responses),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AirQualitySource for MockSource {
        async fn fetch(&self, _coords: Coordinates) -> Result<RawAirData> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                return Err(AppError::upstream("no more responses"));
            }
            responses.remove(0)
        }
    }

    /// Store whose every operation fails.
    struct BrokenStore;

    #[async_trait]
    impl CacheStore for BrokenStore {
        async fn get(&self, _key: &str) -> Result<Option<AirQualityResult>> {
            Err(AppError::storage("connection refused"))
        }

        async fn set(&self, _key: &str, _value: &AirQualityResult, _ttl: Duration) -> Result<()> {
            Err(AppError::storage("connection refused"))
        }

        async fn sweep(&self) -> Result<usize> {
            Err(AppError::storage("connection refused"))
        }

        fn backend_name(&self) -> &'static str {
            "broken"
        }
    }

    fn raw(pm10: f64, pm25: f64) -> RawAirData {
        RawAirData {
            pm10,
            pm25,
            station: "중구".to_string(),
            timestamp: "2026-10-18 14:00".to_string(),
            weather: None,
        }
    }

    fn service(store: Arc<dyn CacheStore>, source: Arc<MockSource>) -> AirQualityService {
        AirQualityService::new(store, source, &CacheConfig::default())
    }

    #[tokio::test]
    async fn test_miss_fetches_and_caches() {
        let store = Arc::new(MemoryCacheStore::new());
        let source = MockSource::new(vec![Ok(raw(45.0, 12.0))]);
        let service = service(store.clone(), source.clone());

        let result = service.get_air_quality(37.4119, 127.0925).await.unwrap();

        assert_eq!(result.pm10_status.level, SeverityLevel::Moderate);
        assert_eq!(result.pm25_status.level, SeverityLevel::Good);
        assert_eq!(result.worst.pollutant, Pollutant::Pm10);
        assert_eq!(result.station, "중구");
        assert_eq!(source.calls(), 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_nearby_request_hits_cache() {
        let store = Arc::new(MemoryCacheStore::new());
        let source = MockSource::new(vec![Ok(raw(45.0, 12.0))]);
        let service = service(store, source.clone());

        let first = service.get_air_quality(37.4119, 127.0925).await.unwrap();
        let second = service.get_air_quality(37.4123, 127.0928).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_is_refetched() {
        let store = Arc::new(MemoryCacheStore::new());
        let source = MockSource::new(vec![Ok(raw(45.0, 12.0)), Ok(raw(160.0, 80.0))]);
        let service = service(store, source.clone());

        service.get_air_quality(37.41, 127.09).await.unwrap();
        tokio::time::advance(CacheConfig::default().ttl() + Duration::from_secs(1)).await;
        let refreshed = service.get_air_quality(37.41, 127.09).await.unwrap();

        assert_eq!(source.calls(), 2);
        assert_eq!(refreshed.pm10_status.level, SeverityLevel::VeryBad);
        assert_eq!(refreshed.pm25_status.level, SeverityLevel::VeryBad);
        // Equal levels resolve to PM2.5.
        assert_eq!(refreshed.worst.pollutant, Pollutant::Pm25);
    }

    #[tokio::test]
    async fn test_upstream_failure_is_not_cached() {
        let store = Arc::new(MemoryCacheStore::new());
        let source = MockSource::new(vec![
            Err(AppError::validation("page changed")),
            Ok(raw(10.0, 5.0)),
        ]);
        let service = service(store.clone(), source.clone());

        let err = service.get_air_quality(37.41, 127.09).await.unwrap_err();
        assert!(matches!(err, AppError::UpstreamUnavailable(_)));
        assert!(store.is_empty());

        let result = service.get_air_quality(37.41, 127.09).await.unwrap();
        assert_eq!(result.worst.level, SeverityLevel::Good);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_invalid_coordinates_skip_fetch() {
        let source = MockSource::new(vec![Ok(raw(10.0, 5.0))]);
        let service = service(Arc::new(MemoryCacheStore::new()), source.clone());

        for (lat, lon) in [(91.0, 0.0), (0.0, -180.5), (f64::NAN, 0.0)] {
            let err = service.get_air_quality(lat, lon).await.unwrap_err();
            assert!(matches!(err, AppError::InvalidInput(_)));
        }
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_storage_failures_are_absorbed() {
        let source = MockSource::new(vec![Ok(raw(10.0, 5.0)), Ok(raw(10.0, 5.0))]);
        let service = service(Arc::new(BrokenStore), source.clone());

        assert!(service.get_air_quality(37.41, 127.09).await.is_ok());
        assert!(service.get_air_quality(37.41, 127.09).await.is_ok());
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_low_readings_are_good() {
        let source = MockSource::new(vec![Ok(raw(25.0, 10.0))]);
        let service = service(Arc::new(MemoryCacheStore::new()), source);

        let result = service.get_air_quality(37.4119, 127.0925).await.unwrap();

        assert_eq!(result.pm10_status.level, SeverityLevel::Good);
        assert_eq!(result.pm25_status.level, SeverityLevel::Good);
        assert_eq!(result.worst.level, SeverityLevel::Good);
        assert_eq!(result.worst.pollutant, Pollutant::Pm25);
    }

    #[tokio::test]
    async fn test_pm10_sensitive_groups_reading() {
        let source = MockSource::new(vec![Ok(raw(100.0, 20.0))]);
        let service = service(Arc::new(MemoryCacheStore::new()), source);

        let result = service.get_air_quality(37.4119, 127.0925).await.unwrap();

        assert_eq!(result.pm10_status.level, SeverityLevel::SensitiveGroupsAffected);
        assert_eq!(result.worst.pollutant, Pollutant::Pm10);
        assert_eq!(result.worst.level, SeverityLevel::SensitiveGroupsAffected);
    }

    #[tokio::test]
    async fn test_pm10_dominates_worst_level() {
        let source = MockSource::new(vec![Ok(raw(120.0, 20.0))]);
        let service = service(Arc::new(MemoryCacheStore::new()), source);

        let result = service.get_air_quality(37.4119, 127.0925).await.unwrap();

        // 120 is above the PM10 sensitive-groups bound of 100.
        assert_eq!(result.pm10_status.level, SeverityLevel::Bad);
        assert_eq!(result.pm25_status.level, SeverityLevel::Moderate);
        assert_eq!(result.worst.pollutant, Pollutant::Pm10);
        assert_eq!(result.worst.level, SeverityLevel::Bad);
        assert_eq!(result.worst.value, 120.0);
    }

    #[test]
    fn test_build_result_clamps_values() {
        let result = build_result(raw(-5.0, f64::NAN));
        assert_eq!(result.pm10.concentration, 0.0);
        assert_eq!(result.pm25.concentration, 0.0);
        assert_eq!(result.worst.level, SeverityLevel::Good);
    }
}
