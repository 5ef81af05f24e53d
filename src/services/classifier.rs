// src/services/classifier.rs

//! Pollutant classification.
//!
//! Maps a concentration to one of six severity levels using pollutant-specific
//! inclusive upper bounds, and picks the more severe of two statuses.

use crate::models::{AirQualityStatus, Pollutant, SeverityLevel};

/// Inclusive upper bounds for Good, Moderate, SensitiveGroupsAffected, Bad, VeryBad.
/// Anything above the last bound is Hazardous.
const PM10_BOUNDS: [f64; 5] = [30.0, 50.0, 100.0, 150.0, 200.0];
const PM25_BOUNDS: [f64; 5] = [15.0, 25.0, 50.0, 75.0, 100.0];

/// Display metadata attached to a severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelInfo {
    pub level: SeverityLevel,
    pub message: &'static str,
    pub color: &'static str,
    pub emoji: &'static str,
    pub warning: &'static str,
}

/// One row per level, in severity order.
const LEVEL_TABLE: [LevelInfo; 6] = [
    LevelInfo {
        level: SeverityLevel::Good,
        message: "좋음",
        color: "#4CAF50",
        emoji: "😀",
        warning: "대기질이 좋습니다. 야외 활동을 즐기세요.",
    },
    LevelInfo {
        level: SeverityLevel::Moderate,
        message: "보통",
        color: "#FFB300",
        emoji: "🙂",
        warning: "대기질이 보통입니다. 민감한 분은 장시간 야외 활동에 유의하세요.",
    },
    LevelInfo {
        level: SeverityLevel::SensitiveGroupsAffected,
        message: "민감군 영향",
        color: "#FB8C00",
        emoji: "😐",
        warning: "어린이, 노약자, 호흡기 질환자는 야외 활동을 줄이세요.",
    },
    LevelInfo {
        level: SeverityLevel::Bad,
        message: "나쁨",
        color: "#F44336",
        emoji: "😷",
        warning: "외출 시 마스크를 착용하고 야외 활동을 자제하세요.",
    },
    LevelInfo {
        level: SeverityLevel::VeryBad,
        message: "매우 나쁨",
        color: "#7B1FA2",
        emoji: "😫",
        warning: "가급적 실내에 머물고 외출 시 보건용 마스크를 착용하세요.",
    },
    LevelInfo {
        level: SeverityLevel::Hazardous,
        message: "위험",
        color: "#B71C1C",
        emoji: "☠️",
        warning: "외출을 삼가고 창문을 닫아 실내 공기를 보호하세요.",
    },
];

/// Metadata row for a level.
pub fn level_info(level: SeverityLevel) -> &'static LevelInfo {
    // Table rows follow the enum's discriminant order.
    &LEVEL_TABLE[level as usize]
}

fn bounds(pollutant: Pollutant) -> &'static [f64; 5] {
    match pollutant {
        Pollutant::Pm10 => &PM10_BOUNDS,
        Pollutant::Pm25 => &PM25_BOUNDS,
    }
}

/// Severity level for a concentration, without metadata.
pub fn level_for(pollutant: Pollutant, concentration: f64) -> SeverityLevel {
    let value = sanitize(concentration);
    bounds(pollutant)
        .iter()
        .position(|bound| value <= *bound)
        .map_or(SeverityLevel::Hazardous, |idx| SeverityLevel::ALL[idx])
}

/// Classify a concentration (µg/m³) into a status with display metadata.
///
/// Negative or non-finite input is treated as 0.
pub fn classify(pollutant: Pollutant, concentration: f64) -> AirQualityStatus {
    let value = sanitize(concentration);
    let info = level_info(level_for(pollutant, value));

    AirQualityStatus {
        pollutant,
        level: info.level,
        value,
        message: info.message.to_string(),
        color: info.color.to_string(),
    }
}

/// The more severe of two statuses. `b` wins ties.
pub fn worse_of<'a>(a: &'a AirQualityStatus, b: &'a AirQualityStatus) -> &'a AirQualityStatus {
    if a.level > b.level { a } else { b }
}

fn sanitize(concentration: f64) -> f64 {
    if concentration.is_finite() && concentration > 0.0 {
        concentration
    } else {
        if concentration != 0.0 {
            log::debug!("Clamping malformed concentration {} to 0", concentration);
        }
        0.0
    }
}
