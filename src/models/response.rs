//! JSON bodies returned over HTTP.

use serde::{Deserialize, Serialize};

use crate::models::AirQualityResult;
use crate::services::classifier::level_info;

/// Success body for `GET /air-quality`, in the shape the mobile client reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AirQualityResponse {
    pub station_name: String,
    pub location: String,
    pub pm10_value: f64,
    pub pm25_value: f64,
    pub pm10_grade: String,
    pub pm25_grade: String,

    /// Label of the worse of the two grades
    pub grade: String,
    pub data_time: String,
    pub timestamp: String,
    pub grade_emoji: String,
    pub warning_message: String,
    pub background_color: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feels_like: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather_icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather_description: Option<String>,
}

impl From<&AirQualityResult> for AirQualityResponse {
    fn from(result: &AirQualityResult) -> Self {
        let info = level_info(result.worst.level);
        let weather = result.weather.clone().unwrap_or_default();

        Self {
            station_name: result.station.clone(),
            location: result.station.clone(),
            pm10_value: result.pm10.concentration,
            pm25_value: result.pm25.concentration,
            pm10_grade: result.pm10_status.message.clone(),
            pm25_grade: result.pm25_status.message.clone(),
            grade: result.worst.message.clone(),
            data_time: result.timestamp.clone(),
            timestamp: result.timestamp.clone(),
            grade_emoji: info.emoji.to_string(),
            warning_message: info.warning.to_string(),
            background_color: result.worst.color.clone(),
            temperature: weather.temperature,
            feels_like: weather.feels_like,
            weather_icon: weather.icon,
            weather_description: weather.description,
        }
    }
}

/// Error body: status code, reason phrase and a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub status_code: u16,
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(status_code: u16, error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status_code,
            error: error.into(),
            message: message.into(),
        }
    }
}
