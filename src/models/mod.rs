// src/models/mod.rs

//! Domain models for the air-quality service.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod air_quality;
pub mod config;
mod coordinates;
mod response;
mod selectors;

// Re-export all public types
pub use air_quality::{
    AirQualityResult, AirQualityStatus, Pollutant, PollutantReading, SeverityLevel,
    WeatherSummary,
};
pub use config::{CacheBackend, CacheConfig, Config, FetcherConfig, LoggingConfig};
pub use coordinates::Coordinates;
pub use response::{AirQualityResponse, ErrorResponse};
pub use selectors::AirPageSelectors;
