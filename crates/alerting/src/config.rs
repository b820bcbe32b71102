//! Alerting configuration

use crate::AlertConfigError;
use field_model::{HazardType, PerHazard};
use serde::{Deserialize, Serialize};

/// Constants used by the hazard rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    /// A forecast day is dry below this rainfall (mm)
    pub dry_rain_mm: f64,
    /// ... and below this rain probability
    pub low_probability: f64,
    /// A forecast day is wet above this rain probability
    pub high_probability: f64,
    /// Forecast days included in the heat rule besides the current reading
    pub heat_forecast_days: usize,
    /// Forecast days inspected by the rain probability rule
    pub rain_probability_window: usize,
    /// Wet days within the window needed to fire
    pub rain_probability_min_days: usize,
    /// Margin over the threshold at which severity becomes High
    pub high_margins: PerHazard<f64>,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            dry_rain_mm: 2.0,
            low_probability: 0.2,
            high_probability: 0.7,
            heat_forecast_days: 0,
            rain_probability_window: 3,
            rain_probability_min_days: 2,
            high_margins: PerHazard {
                heat_stress: 5.0,
                heavy_rain: 10.0,
                high_wind: 20.0,
                cold_stress: 3.0,
                dry_spell: 2.0,
                high_rain_probability: 1.0,
            },
        }
    }
}

/// Alert configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Cooldown period between alerts of one hazard for one subject (minutes)
    pub cooldown_minutes: PerHazard<u64>,
    pub rules: RuleConfig,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            cooldown_minutes: PerHazard::from_fn(|_| 30),
            rules: RuleConfig::default(),
        }
    }
}

impl AlertConfig {
    /// Cooldown window for a hazard
    pub fn cooldown(&self, hazard: HazardType) -> chrono::Duration {
        const MAX_MINUTES: u64 = (i64::MAX / 60_000) as u64;
        let minutes = (*self.cooldown_minutes.get(hazard)).min(MAX_MINUTES);
        chrono::Duration::minutes(minutes as i64)
    }

    /// Check probabilities, margins and the rain window
    pub fn validate(&self) -> Result<(), AlertConfigError> {
        let rules = &self.rules;
        for (field, value) in [
            ("low_probability", rules.low_probability),
            ("high_probability", rules.high_probability),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(AlertConfigError::OutOfRange { field, value, min: 0.0, max: 1.0 });
            }
        }
        if !(rules.dry_rain_mm.is_finite() && rules.dry_rain_mm >= 0.0) {
            return Err(AlertConfigError::OutOfRange {
                field: "dry_rain_mm",
                value: rules.dry_rain_mm,
                min: 0.0,
                max: f64::MAX,
            });
        }
        for (_, margin) in rules.high_margins.iter() {
            if !(margin.is_finite() && *margin >= 0.0) {
                return Err(AlertConfigError::OutOfRange {
                    field: "high_margins",
                    value: *margin,
                    min: 0.0,
                    max: f64::MAX,
                });
            }
        }
        if rules.rain_probability_min_days == 0
            || rules.rain_probability_min_days > rules.rain_probability_window
        {
            return Err(AlertConfigError::InvalidRainWindow {
                min_days: rules.rain_probability_min_days,
                window: rules.rain_probability_window,
            });
        }
        Ok(())
    }
}
