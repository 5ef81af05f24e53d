//! Geographic coordinates as received from clients.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// A validated latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Validate a raw pair. Rejects non-finite and out-of-range values.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(AppError::invalid_input(format!(
                "latitude must be within [-90, 90], got {latitude}"
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(AppError::invalid_input(format!(
                "longitude must be within [-180, 180], got {longitude}"
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Parse query-string values.
    pub fn parse(latitude: &str, longitude: &str) -> Result<Self> {
        let lat = latitude
            .trim()
            .parse::<f64>()
            .map_err(|_| AppError::invalid_input(format!("latitude is not a number: {latitude:?}")))?;
        let lon = longitude.trim().parse::<f64>().map_err(|_| {
            AppError::invalid_input(format!("longitude is not a number: {longitude:?}"))
        })?;
        Self::new(lat, lon)
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}
