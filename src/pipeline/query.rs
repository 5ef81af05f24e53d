// src/pipeline/query.rs

//! One-shot lookups for the command line.

use crate::error::Result;
use crate::models::{AirQualityResult, AirQualityStatus, Config};
use crate::services::AirQualityService;
use crate::services::classifier::level_info;

/// Look up one location through a freshly built service.
pub async fn run_query(config: &Config, latitude: f64, longitude: f64) -> Result<AirQualityResult> {
    let service = AirQualityService::from_config(config).await?;
    log::info!("Querying air quality at {},{}", latitude, longitude);
    service.get_air_quality(latitude, longitude).await
}

/// Render a result as a short text card.
pub fn render_card(result: &AirQualityResult) -> String {
    let worst = level_info(result.worst.level);
    let mut lines = vec![
        format!("📍 {} ({})", result.station, result.timestamp),
        format!("{} {}  {}", worst.emoji, worst.message, worst.warning),
        status_line(&result.pm10_status),
        status_line(&result.pm25_status),
    ];

    if let Some(weather) = &result.weather {
        let mut parts = Vec::new();
        if let Some(t) = weather.temperature {
            parts.push(format!("{t}°"));
        }
        if let Some(t) = weather.feels_like {
            parts.push(format!("(체감 {t}°)"));
        }
        if let Some(d) = &weather.description {
            parts.push(d.clone());
        }
        if !parts.is_empty() {
            lines.push(format!("🌡 {}", parts.join(" ")));
        }
    }

    lines.join("\n")
}

fn status_line(status: &AirQualityStatus) -> String {
    format!(
        "{:<6} {:>5} ㎍/㎥  {} {}",
        status.pollutant.label(),
        status.value,
        status.message,
        status.color
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WeatherSummary;
    use crate::storage::test_support::sample_result;

    #[test]
    fn test_card_shows_worst_level() {
        let card = render_card(&sample_result(45.0, 60.0));
        let lines: Vec<&str> = card.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("중구"));
        assert!(lines[1].starts_with("😷 나쁨"));
        assert!(lines[2].starts_with("PM10"));
        assert!(lines[2].contains("보통"));
        assert!(lines[3].starts_with("PM2.5"));
        assert!(lines[3].contains("#F44336"));
    }

    #[test]
    fn test_card_includes_weather() {
        let mut result = sample_result(10.0, 5.0);
        result.weather = Some(WeatherSummary {
            temperature: Some(-2.0),
            description: Some("맑음".to_string()),
            ..Default::default()
        });
        let card = render_card(&result);
        assert!(card.ends_with("🌡 -2° 맑음"));
    }
}
