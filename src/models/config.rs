//! Application configuration structures.

use std::fs;
use std::path::Path;
use std::time::Duration;

use scraper::Selector;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::AirPageSelectors;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Cache store and sweep settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Upstream page scraping settings
    #[serde(default)]
    pub fetcher: FetcherConfig,

    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return defaults if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {}: {}. Using defaults.",
                path.as_ref().display(),
                e
            );
            Self::default()
        })
    }

    /// Override values from process environment variables.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|name| std::env::var(name).ok());
    }

    /// Override values from an arbitrary variable lookup.
    ///
    /// Unparseable numeric values are ignored with a warning.
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(ttl) = parse_env(&lookup, "CACHE_TTL") {
            self.cache.ttl_secs = ttl;
        }
        if let Some(interval) = parse_env(&lookup, "CACHE_SWEEP_INTERVAL_SECS") {
            self.cache.sweep_interval_secs = interval;
        }
        if let Some(backend) = lookup("CACHE_BACKEND") {
            match backend.parse() {
                Ok(backend) => self.cache.backend = backend,
                Err(e) => log::warn!("Ignoring CACHE_BACKEND: {}", e),
            }
        }
        if let Some(dir) = lookup("CACHE_DIR") {
            self.cache.dir = dir;
        }
        if let Some(bucket) = lookup("S3_BUCKET") {
            self.cache.s3_bucket = bucket;
        }
        if let Some(prefix) = lookup("S3_PREFIX") {
            self.cache.s3_prefix = prefix;
        }
        if let Some(url) = lookup("FETCH_BASE_URL") {
            self.fetcher.base_url = url;
        }
        if let Some(timeout) = parse_env(&lookup, "FETCH_TIMEOUT_SECS") {
            self.fetcher.timeout_secs = timeout;
        }
        if let Some(retries) = parse_env(&lookup, "FETCH_MAX_RETRIES") {
            self.fetcher.max_retries = retries;
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.cache.ttl_secs == 0 {
            return Err(AppError::validation("cache.ttl_secs must be > 0"));
        }
        if self.cache.sweep_interval_secs == 0 {
            return Err(AppError::validation(
                "cache.sweep_interval_secs must be > 0",
            ));
        }
        if self.cache.key_prefix.trim().is_empty() {
            return Err(AppError::validation("cache.key_prefix is empty"));
        }
        if self.cache.backend == CacheBackend::Local && self.cache.dir.trim().is_empty() {
            return Err(AppError::validation("cache.dir is empty"));
        }
        if self.cache.backend == CacheBackend::S3 && self.cache.s3_bucket.trim().is_empty() {
            return Err(AppError::validation("cache.s3_bucket is empty"));
        }
        if self.fetcher.user_agent.trim().is_empty() {
            return Err(AppError::validation("fetcher.user_agent is empty"));
        }
        if self.fetcher.timeout_secs == 0 {
            return Err(AppError::validation("fetcher.timeout_secs must be > 0"));
        }
        let base = url::Url::parse(&self.fetcher.base_url)?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(AppError::validation(format!(
                "fetcher.base_url must be http(s), got {}",
                base.scheme()
            )));
        }
        for selector in self.fetcher.selectors.all() {
            Selector::parse(selector).map_err(|e| AppError::selector(selector, format!("{e:?}")))?;
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Option<T> {
    let raw = lookup(name)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("Ignoring {}: not a valid number ({:?})", name, raw);
            None
        }
    }
}

/// Where cached results live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// Process-local map
    #[default]
    Memory,
    /// JSON files under `cache.dir`
    Local,
    /// Objects under `cache.s3_prefix` in `cache.s3_bucket`
    S3,
}

impl CacheBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Local => "local",
            Self::S3 => "s3",
        }
    }
}

impl std::fmt::Display for CacheBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CacheBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "local" => Ok(Self::Local),
            "s3" => Ok(Self::S3),
            other => Err(AppError::config(format!("unknown cache backend: {other}"))),
        }
    }
}

/// Cache store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub backend: CacheBackend,

    /// Lifetime of a cached result in seconds
    #[serde(default = "defaults::ttl")]
    pub ttl_secs: u64,

    /// Interval between expired-entry sweeps in seconds
    #[serde(default = "defaults::sweep_interval")]
    pub sweep_interval_secs: u64,

    /// Prefix of every cache key
    #[serde(default = "defaults::key_prefix")]
    pub key_prefix: String,

    /// Directory for the local backend
    #[serde(default = "defaults::cache_dir")]
    pub dir: String,

    /// Bucket for the S3 backend
    #[serde(default = "defaults::s3_bucket")]
    pub s3_bucket: String,

    /// Key prefix inside the bucket
    #[serde(default = "defaults::s3_prefix")]
    pub s3_prefix: String,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            ttl_secs: defaults::ttl(),
            sweep_interval_secs: defaults::sweep_interval(),
            key_prefix: defaults::key_prefix(),
            dir: defaults::cache_dir(),
            s3_bucket: defaults::s3_bucket(),
            s3_prefix: defaults::s3_prefix(),
        }
    }
}

/// HTTP fetch and scraping settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// Page URL; coordinates are appended as `/<lat>,<lon>`
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// User-Agent header; the page only renders for mobile agents
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Retries after the first attempt
    #[serde(default = "defaults::max_retries")]
    pub max_retries: u32,

    /// First backoff delay, doubled per attempt
    #[serde(default = "defaults::retry_initial_delay")]
    pub retry_initial_delay_ms: u64,

    /// Upper bound for a single backoff delay
    #[serde(default = "defaults::retry_max_delay")]
    pub retry_max_delay_ms: u64,

    #[serde(default)]
    pub selectors: AirPageSelectors,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            max_retries: defaults::max_retries(),
            retry_initial_delay_ms: defaults::retry_initial_delay(),
            retry_max_delay_ms: defaults::retry_max_delay(),
            selectors: AirPageSelectors::default(),
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    // Cache defaults
    pub fn ttl() -> u64 {
        900
    }
    pub fn sweep_interval() -> u64 {
        900
    }
    pub fn key_prefix() -> String {
        "air_quality:".into()
    }
    pub fn cache_dir() -> String {
        "storage/cache".into()
    }
    pub fn s3_bucket() -> String {
        "air-quality-cache".into()
    }
    pub fn s3_prefix() -> String {
        "airquality".into()
    }

    // Fetcher defaults
    pub fn base_url() -> String {
        "https://m.weather.naver.com/air".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (iPhone; CPU iPhone OS 13_2_3 like Mac OS X) AppleWebKit/605.1.15 \
         (KHTML, like Gecko) Version/13.0.3 Mobile/15E148 Safari/604.1"
            .into()
    }
    pub fn timeout() -> u64 {
        10
    }
    pub fn max_retries() -> u32 {
        2
    }
    pub fn retry_initial_delay() -> u64 {
        200
    }
    pub fn retry_max_delay() -> u64 {
        2000
    }

    pub fn log_level() -> String {
        "info".into()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn default_ttl_is_fifteen_minutes() {
        let config = Config::default();
        assert_eq!(config.cache.ttl(), Duration::from_secs(900));
        assert_eq!(config.cache.key_prefix, "air_quality:");
        assert_eq!(config.cache.backend, CacheBackend::Memory);
    }

    #[test]
    fn validate_rejects_zero_ttl() {
        let mut config = Config::default();
        config.cache.ttl_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_selector() {
        let mut config = Config::default();
        config.fetcher.selectors.value_selector = "[[invalid".to_string();
        assert!(matches!(config.validate(), Err(AppError::Selector { .. })));
    }

    #[test]
    fn validate_rejects_non_http_base_url() {
        let mut config = Config::default();
        config.fetcher.base_url = "ftp://example.com/air".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_requires_bucket_for_s3() {
        let mut config = Config::default();
        config.cache.backend = CacheBackend::S3;
        config.cache.s3_bucket = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_partial_toml() {
        let toml = r#"
            [cache]
            backend = "local"
            ttl_secs = 60

            [fetcher.selectors]
            temperature_selector = ".current .temperature"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.cache.backend, CacheBackend::Local);
        assert_eq!(config.cache.ttl_secs, 60);
        assert_eq!(config.cache.sweep_interval_secs, 900);
        assert_eq!(config.fetcher.selectors.value_selector, ".air_info .value");
        assert!(config.fetcher.selectors.has_weather());
    }

    #[test]
    fn load_or_default_falls_back_on_missing_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = Config::load_or_default(tmp.path().join("missing.toml"));
        assert_eq!(config.cache.ttl_secs, 900);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn load_or_default_reads_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[cache]\nttl_secs = 30\n\n[logging]\nlevel = \"warn\"\n").unwrap();

        let config = Config::load_or_default(&path);
        assert_eq!(config.cache.ttl_secs, 30);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn env_overrides_apply() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("CACHE_TTL", "120"),
            ("CACHE_BACKEND", "S3"),
            ("S3_BUCKET", "bucket"),
            ("FETCH_TIMEOUT_SECS", "not-a-number"),
        ]);
        let mut config = Config::default();
        config.apply_env_with(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.cache.ttl_secs, 120);
        assert_eq!(config.cache.backend, CacheBackend::S3);
        assert_eq!(config.cache.s3_bucket, "bucket");
        assert_eq!(config.fetcher.timeout_secs, 10);
    }
}
