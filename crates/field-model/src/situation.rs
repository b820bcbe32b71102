//! Situational context for one evaluation cycle

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a monitored field/location
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(String);

impl SubjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SubjectId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Crop health as reported by the growth monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthStatus {
    #[default]
    Normal,
    Slow,
    Abnormal,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Normal => "NORMAL",
            HealthStatus::Slow => "SLOW",
            HealthStatus::Abnormal => "ABNORMAL",
        }
    }

    /// Whether the crop is already under stress
    pub fn is_stressed(&self) -> bool {
        !matches!(self, HealthStatus::Normal)
    }
}

/// Geographic position of the subject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    /// Metres above sea level
    #[serde(default)]
    pub elevation: f64,
    #[serde(default)]
    pub climate_zone: Option<String>,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            elevation: 0.0,
            climate_zone: None,
        }
    }
}

/// Aggregates over the last seven days of observed weather
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherHistory {
    pub avg_temp_7d: f64,
    pub avg_humidity_7d: f64,
    pub total_rain_7d: f64,
    pub max_wind_7d: f64,
    pub temp_variance_7d: f64,
}

impl Default for WeatherHistory {
    fn default() -> Self {
        Self {
            avg_temp_7d: 25.0,
            avg_humidity_7d: 60.0,
            total_rain_7d: 0.0,
            max_wind_7d: 10.0,
            temp_variance_7d: 5.0,
        }
    }
}

/// Historical performance of the crop on this subject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CropPerformance {
    pub yield_trend: f64,
    pub stress_events_count: u32,
    pub recovery_rate: f64,
}

impl Default for CropPerformance {
    fn default() -> Self {
        Self {
            yield_trend: 0.0,
            stress_events_count: 0,
            recovery_rate: 1.0,
        }
    }
}

/// Prior alert counts by hazard family
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertHistory {
    pub heat_stress_events: u32,
    pub drought_events: u32,
    pub flood_events: u32,
}

/// Immutable input describing the subject for one cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Situation {
    pub subject_id: SubjectId,
    #[serde(default)]
    pub crop_name: Option<String>,
    #[serde(default)]
    pub growth_stage: Option<String>,
    /// Confidence of the growth stage estimate (0.0 to 1.0)
    #[serde(default)]
    pub stage_confidence: f64,
    #[serde(default)]
    pub health_status: HealthStatus,
    /// Tags raised by the growth monitor, e.g. `SLOW_GROWTH`
    #[serde(default)]
    pub growth_alerts: Vec<String>,
    #[serde(default)]
    pub days_since_sowing: u32,
    pub location: Location,
    pub evaluation_date: NaiveDate,
    #[serde(default)]
    pub weather_history: WeatherHistory,
    #[serde(default)]
    pub crop_performance: CropPerformance,
    #[serde(default)]
    pub alert_history: AlertHistory,
}

impl Situation {
    /// Create a situation with no crop context
    pub fn new(subject_id: SubjectId, location: Location, evaluation_date: NaiveDate) -> Self {
        Self {
            subject_id,
            crop_name: None,
            growth_stage: None,
            stage_confidence: 0.0,
            health_status: HealthStatus::Normal,
            growth_alerts: Vec::new(),
            days_since_sowing: 0,
            location,
            evaluation_date,
            weather_history: WeatherHistory::default(),
            crop_performance: CropPerformance::default(),
            alert_history: AlertHistory::default(),
        }
    }

    /// Attach crop and growth stage
    pub fn with_crop(mut self, crop: &str, stage: &str, stage_confidence: f64) -> Self {
        self.crop_name = Some(crop.to_string());
        self.growth_stage = Some(stage.to_string());
        self.stage_confidence = stage_confidence;
        self
    }

    /// Growth stage, if present and not blank
    pub fn growth_stage(&self) -> Option<&str> {
        self.growth_stage
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Crop name, if present and not blank
    pub fn crop_name(&self) -> Option<&str> {
        self.crop_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Case-insensitive check for a growth monitor tag
    pub fn has_growth_alert(&self, tag: &str) -> bool {
        self.growth_alerts.iter().any(|a| a.eq_ignore_ascii_case(tag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Situation {
        Situation::new(
            SubjectId::from("field-7"),
            Location::new(23.02, 72.57),
            NaiveDate::from_ymd_opt(2026, 2, 10).unwrap(),
        )
    }

    #[test]
    fn test_blank_stage_is_absent() {
        let mut situation = sample().with_crop("wheat", "   ", 0.9);
        assert_eq!(situation.growth_stage(), None);

        situation.growth_stage = Some(" tillering ".to_string());
        assert_eq!(situation.growth_stage(), Some("tillering"));
    }

    #[test]
    fn test_growth_alert_lookup() {
        let mut situation = sample();
        situation.growth_alerts.push("slow_growth".to_string());
        assert!(situation.has_growth_alert("SLOW_GROWTH"));
        assert!(!situation.has_growth_alert("LEAF_CURL"));
    }

    #[test]
    fn test_minimal_json_uses_defaults() {
        let json = r#"{
            "subject_id": "field-7",
            "location": {"latitude": 23.0, "longitude": 72.5},
            "evaluation_date": "2026-02-10"
        }"#;
        let situation: Situation = serde_json::from_str(json).unwrap();
        assert_eq!(situation.health_status, HealthStatus::Normal);
        assert_eq!(situation.weather_history.avg_temp_7d, 25.0);
        assert_eq!(situation.crop_performance.recovery_rate, 1.0);
        assert!(situation.growth_stage().is_none());
    }
}
