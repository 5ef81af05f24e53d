// src/models/selectors.rs

//! CSS selectors for scraping the mobile air-quality page.

use serde::{Deserialize, Serialize};

/// CSS selectors for scraping the mobile air-quality page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirPageSelectors {
    /// Selector for the pollutant values; first match is PM10, second PM2.5
    #[serde(default = "default_value")]
    pub value_selector: String,

    /// Selector for the station/location label
    #[serde(default = "default_location")]
    pub location_selector: String,

    /// Selector for the measurement time
    #[serde(default = "default_time")]
    pub time_selector: String,

    /// Selector for the current temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_selector: Option<String>,

    /// Selector for the apparent temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feels_like_selector: Option<String>,

    /// Selector for the weather description text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_selector: Option<String>,

    /// Selector for the weather icon element
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_selector: Option<String>,

    /// HTML attribute holding the icon reference
    #[serde(default = "default_icon_attr")]
    pub icon_attr: String,
}

fn default_value() -> String {
    ".air_info .value".to_string()
}

fn default_location() -> String {
    ".location_name".to_string()
}

fn default_time() -> String {
    ".summary_time".to_string()
}

fn default_icon_attr() -> String {
    "class".to_string()
}

impl Default for AirPageSelectors {
    fn default() -> Self {
        Self {
            value_selector: default_value(),
            location_selector: default_location(),
            time_selector: default_time(),
            temperature_selector: None,
            feels_like_selector: None,
            description_selector: None,
            icon_selector: None,
            icon_attr: default_icon_attr(),
        }
    }
}

impl AirPageSelectors {
    /// Whether any weather selector is configured.
    pub fn has_weather(&self) -> bool {
        self.temperature_selector.is_some()
            || self.feels_like_selector.is_some()
            || self.description_selector.is_some()
            || self.icon_selector.is_some()
    }

    /// Every configured selector, for up-front validation.
    pub fn all(&self) -> Vec<&str> {
        let mut selectors = vec![
            self.value_selector.as_str(),
            self.location_selector.as_str(),
            self.time_selector.as_str(),
        ];
        selectors.extend(
            [
                &self.temperature_selector,
                &self.feels_like_selector,
                &self.description_selector,
                &self.icon_selector,
            ]
            .into_iter()
            .flatten()
            .map(String::as_str),
        );
        selectors
    }
}
