//! Service layer for the air-quality backend.
//!
//! - Classification of pollutant readings (`classifier`)
//! - The data source boundary (`AirQualitySource`)
//! - Mobile weather page scraping (`NaverAirSource`)
//! - Cached lookups (`AirQualityService`)

mod air_quality;
pub mod classifier;
mod naver;
mod source;

pub use air_quality::{AirQualityService, build_result};
pub use naver::{NaverAirSource, UNKNOWN_STATION};
pub use source::{AirQualitySource, RawAirData};
