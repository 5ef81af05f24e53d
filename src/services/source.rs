//! Data source boundary.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{Coordinates, WeatherSummary};

/// Unclassified readings for one location.
///
/// Sources default unparseable pollutant values to 0 instead of failing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawAirData {
    pub pm10: f64,
    pub pm25: f64,
    pub station: String,
    pub timestamp: String,
    #[serde(default)]
    pub weather: Option<WeatherSummary>,
}

/// Anything that can produce raw readings for a location.
///
/// Implementations apply their own retry policy; any `Err` they return is
/// reported to callers as upstream unavailability.
#[async_trait]
pub trait AirQualitySource: Send + Sync {
    async fn fetch(&self, coords: Coordinates) -> Result<RawAirData>;
}
