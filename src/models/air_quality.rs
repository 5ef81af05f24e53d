//! Air-quality domain types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A particulate pollutant reported by the data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pollutant {
    Pm10,
    Pm25,
}

impl Pollutant {
    /// Display label used in status cards.
    pub fn label(&self) -> &'static str {
        match self {
            Pollutant::Pm10 => "PM10",
            Pollutant::Pm25 => "PM2.5",
        }
    }
}

impl fmt::Display for Pollutant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Six ordered air-quality grades.
///
/// Variant order is the severity order, so `Ord` compares severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityLevel {
    Good,
    Moderate,
    SensitiveGroupsAffected,
    Bad,
    VeryBad,
    Hazardous,
}

impl SeverityLevel {
    /// All levels from least to most severe.
    pub const ALL: [SeverityLevel; 6] = [
        SeverityLevel::Good,
        SeverityLevel::Moderate,
        SeverityLevel::SensitiveGroupsAffected,
        SeverityLevel::Bad,
        SeverityLevel::VeryBad,
        SeverityLevel::Hazardous,
    ];
}

/// A single pollutant concentration in µg/m³.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PollutantReading {
    pub pollutant: Pollutant,
    pub concentration: f64,
}

impl PollutantReading {
    pub fn new(pollutant: Pollutant, concentration: f64) -> Self {
        Self {
            pollutant,
            concentration,
        }
    }
}

/// Classified reading with its display metadata.
///
/// `message` and `color` always come from the level table, never from the value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirQualityStatus {
    pub pollutant: Pollutant,
    pub level: SeverityLevel,
    pub value: f64,
    pub message: String,
    pub color: String,
}

/// Weather fields scraped alongside the pollutant values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feels_like: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl WeatherSummary {
    pub fn is_empty(&self) -> bool {
        self.temperature.is_none()
            && self.feels_like.is_none()
            && self.description.is_none()
            && self.icon.is_none()
    }
}

/// Aggregate returned for one location and cached by rounded coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirQualityResult {
    pub pm10: PollutantReading,
    pub pm25: PollutantReading,
    pub pm10_status: AirQualityStatus,
    pub pm25_status: AirQualityStatus,

    /// The more severe of the two statuses; PM2.5 on ties
    pub worst: AirQualityStatus,

    /// Measuring station or location label
    pub station: String,

    /// Measurement time as reported by the source
    pub timestamp: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather: Option<WeatherSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_total_order() {
        for pair in SeverityLevel::ALL.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        assert_eq!(SeverityLevel::ALL.iter().max(), Some(&SeverityLevel::Hazardous));
    }

    #[test]
    fn test_level_serialization() {
        let json = serde_json::to_string(&SeverityLevel::SensitiveGroupsAffected).unwrap();
        assert_eq!(json, "\"sensitive_groups_affected\"");
    }

    #[test]
    fn test_empty_weather_summary() {
        assert!(WeatherSummary::default().is_empty());
        let summary = WeatherSummary {
            temperature: Some(21.0),
            ..Default::default()
        };
        assert!(!summary.is_empty());
    }
}
