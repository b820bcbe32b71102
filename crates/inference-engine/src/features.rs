//! Feature encoding for the threshold model

use chrono::Datelike;
use field_model::Situation;
use serde::{Deserialize, Serialize};

/// Number of model input features
pub const FEATURE_COUNT: usize = 23;

/// Feature names, in model input order
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "crop_name",
    "growth_stage",
    "growth_health_status",
    "days_since_sowing",
    "crop_confidence",
    "latitude",
    "longitude",
    "elevation",
    "climate_zone",
    "month",
    "season",
    "day_of_year",
    "avg_temp_7d",
    "avg_humidity_7d",
    "total_rain_7d",
    "max_wind_7d",
    "temp_variance_7d",
    "yield_trend",
    "stress_events_count",
    "recovery_rate",
    "heat_stress_events",
    "drought_events",
    "flood_events",
];

/// Meteorological season used as a model feature
pub fn season_name(month: u32) -> &'static str {
    match month {
        12 | 1 | 2 => "winter",
        3..=5 => "spring",
        6..=8 => "summer",
        _ => "autumn",
    }
}

/// Label vocabularies for the categorical features
///
/// A label encodes to its index in the list; unknown labels encode to -1.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vocabulary {
    pub crop_name: Vec<String>,
    pub growth_stage: Vec<String>,
    pub growth_health_status: Vec<String>,
    pub climate_zone: Vec<String>,
    pub season: Vec<String>,
}

fn encode_label(classes: &[String], label: &str) -> f64 {
    classes
        .iter()
        .position(|c| c.eq_ignore_ascii_case(label))
        .map_or(-1.0, |i| i as f64)
}

/// Builds raw (unscaled) feature vectors from a situation
#[derive(Debug, Clone)]
pub struct FeatureEncoder {
    vocabulary: Vocabulary,
}

impl FeatureEncoder {
    pub fn new(vocabulary: Vocabulary) -> Self {
        Self { vocabulary }
    }

    /// Encode a situation into the model's input order
    pub fn encode(&self, situation: &Situation) -> [f64; FEATURE_COUNT] {
        let vocab = &self.vocabulary;
        let date = situation.evaluation_date;
        let location = &situation.location;
        let history = &situation.weather_history;
        let performance = &situation.crop_performance;
        let alerts = &situation.alert_history;

        [
            encode_label(&vocab.crop_name, situation.crop_name().unwrap_or("unknown")),
            encode_label(&vocab.growth_stage, situation.growth_stage().unwrap_or("unknown")),
            encode_label(&vocab.growth_health_status, situation.health_status.as_str()),
            situation.days_since_sowing as f64,
            situation.stage_confidence,
            location.latitude,
            location.longitude,
            location.elevation,
            encode_label(
                &vocab.climate_zone,
                location.climate_zone.as_deref().unwrap_or("tropical"),
            ),
            date.month() as f64,
            encode_label(&vocab.season, season_name(date.month())),
            date.ordinal() as f64,
            history.avg_temp_7d,
            history.avg_humidity_7d,
            history.total_rain_7d,
            history.max_wind_7d,
            history.temp_variance_7d,
            performance.yield_trend,
            performance.stress_events_count as f64,
            performance.recovery_rate,
            alerts.heat_stress_events as f64,
            alerts.drought_events as f64,
            alerts.flood_events as f64,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use field_model::{HealthStatus, Location, SubjectId};

    fn vocabulary() -> Vocabulary {
        Vocabulary {
            crop_name: vec!["cotton".into(), "wheat".into()],
            growth_stage: vec!["flowering".into(), "vegetative".into()],
            growth_health_status: vec!["ABNORMAL".into(), "NORMAL".into(), "SLOW".into()],
            climate_zone: vec!["arid".into(), "tropical".into()],
            season: vec!["autumn".into(), "spring".into(), "summer".into(), "winter".into()],
        }
    }

    #[test]
    fn test_season_name() {
        assert_eq!(season_name(1), "winter");
        assert_eq!(season_name(4), "spring");
        assert_eq!(season_name(7), "summer");
        assert_eq!(season_name(10), "autumn");
        assert_eq!(season_name(12), "winter");
    }

    #[test]
    fn test_encode_layout() {
        let encoder = FeatureEncoder::new(vocabulary());
        let mut situation = Situation::new(
            SubjectId::from("f1"),
            Location::new(21.0, 72.0),
            NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
        )
        .with_crop("Wheat", "tillering", 0.8);
        situation.health_status = HealthStatus::Slow;
        situation.days_since_sowing = 40;

        let features = encoder.encode(&situation);
        assert_eq!(features.len(), FEATURE_NAMES.len());
        assert_eq!(features[0], 1.0); // wheat, case-insensitive
        assert_eq!(features[1], -1.0); // unknown stage
        assert_eq!(features[2], 2.0); // SLOW
        assert_eq!(features[3], 40.0);
        assert_eq!(features[8], 1.0); // tropical default
        assert_eq!(features[9], 2.0);
        assert_eq!(features[10], 3.0); // winter
        assert_eq!(features[11], 32.0);
        assert_eq!(features[12], 25.0);
        assert_eq!(features[19], 1.0);
    }
}
