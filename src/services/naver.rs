// src/services/naver.rs

//! Mobile weather page scraper.
//!
//! Fetches `{base_url}/{lat},{lon}` and reads pollutant values, the station
//! label, the measurement time and optional weather fields using configured
//! CSS selectors.

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{AirPageSelectors, Coordinates, FetcherConfig, WeatherSummary};
use crate::services::source::{AirQualitySource, RawAirData};
use crate::utils::retry::{RetryPolicy, with_retry};
use crate::utils::{http, normalize_whitespace, parse_leading_integer, parse_leading_number};

/// Station label used when the page does not name one.
pub const UNKNOWN_STATION: &str = "알 수 없음";

/// Parsed selector set, built once per source.
#[derive(Debug)]
struct CompiledSelectors {
    value: Selector,
    location: Selector,
    time: Selector,
    temperature: Option<Selector>,
    feels_like: Option<Selector>,
    description: Option<Selector>,
    icon: Option<Selector>,
    icon_attr: String,
}

impl CompiledSelectors {
    fn compile(selectors: &AirPageSelectors) -> Result<Self> {
        let optional = |s: &Option<String>| s.as_deref().map(parse_selector).transpose();
        Ok(Self {
            value: parse_selector(&selectors.value_selector)?,
            location: parse_selector(&selectors.location_selector)?,
            time: parse_selector(&selectors.time_selector)?,
            temperature: optional(&selectors.temperature_selector)?,
            feels_like: optional(&selectors.feels_like_selector)?,
            description: optional(&selectors.description_selector)?,
            icon: optional(&selectors.icon_selector)?,
            icon_attr: selectors.icon_attr.clone(),
        })
    }
}

/// Scraper for the mobile air-quality page.
pub struct NaverAirSource {
    client: Client,
    base_url: String,
    selectors: CompiledSelectors,
    retry: RetryPolicy,
}

impl NaverAirSource {
    /// Create a source from fetcher settings.
    pub fn new(config: &FetcherConfig) -> Result<Self> {
        Ok(Self {
            client: http::create_async_client(config)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            selectors: CompiledSelectors::compile(&config.selectors)?,
            retry: RetryPolicy::from(config),
        })
    }

    /// Page URL for a location.
    pub fn page_url(&self, coords: Coordinates) -> String {
        format!("{}/{},{}", self.base_url, coords.latitude, coords.longitude)
    }

    /// Extract readings from a page.
    ///
    /// Pollutant values keep only their integer part; missing or unparseable
    /// ones become 0. A missing station label becomes [`UNKNOWN_STATION`]
    /// and a missing time becomes now.
    pub fn parse_page(&self, html: &str) -> RawAirData {
        let document = Html::parse_document(html);
        let sel = &self.selectors;

        let mut values = document.select(&sel.value).map(element_text);
        let pm10 = pollutant_value("PM10", values.next());
        let pm25 = pollutant_value("PM2.5", values.next());

        let station = first_text(&document, &sel.location)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| UNKNOWN_STATION.to_string());

        let timestamp = first_text(&document, &sel.time)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true));

        let weather = WeatherSummary {
            temperature: sel
                .temperature
                .as_ref()
                .and_then(|s| first_text(&document, s))
                .and_then(|t| parse_leading_number(&t)),
            feels_like: sel
                .feels_like
                .as_ref()
                .and_then(|s| first_text(&document, s))
                .and_then(|t| parse_leading_number(&t)),
            description: sel
                .description
                .as_ref()
                .and_then(|s| first_text(&document, s))
                .filter(|t| !t.is_empty()),
            icon: sel
                .icon
                .as_ref()
                .and_then(|s| document.select(s).next())
                .and_then(|e| e.value().attr(&sel.icon_attr))
                .map(normalize_whitespace)
                .filter(|t| !t.is_empty()),
        };

        RawAirData {
            pm10,
            pm25,
            station,
            timestamp,
            weather: (!weather.is_empty()).then_some(weather),
        }
    }
}

#[async_trait]
impl AirQualitySource for NaverAirSource {
    async fn fetch(&self, coords: Coordinates) -> Result<RawAirData> {
        let url = self.page_url(coords);
        log::debug!("Fetching air quality page {}", url);

        let html = with_retry(&self.retry, &url, || http::fetch_text(&self.client, &url)).await?;
        let data = self.parse_page(&html);

        log::info!(
            "Fetched {}: PM10={} PM2.5={} station={}",
            coords,
            data.pm10,
            data.pm25,
            data.station
        );
        Ok(data)
    }
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

fn element_text(element: ElementRef<'_>) -> String {
    normalize_whitespace(&element.text().collect::<String>())
}

fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document.select(selector).next().map(element_text)
}

fn pollutant_value(name: &str, text: Option<String>) -> f64 {
    match text.as_deref().and_then(parse_leading_integer) {
        Some(value) => value,
        None => {
            log::warn!("Malformed {} value {:?}, using 0", name, text);
            0.0
        }
    }
}
