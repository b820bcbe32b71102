//! Threshold provider configuration

use crate::ThresholdError;
use field_model::{HardBounds, PerThreshold};
use serde::{Deserialize, Serialize};

/// Threshold provider configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Minimum growth-stage confidence before any adaptation
    pub min_stage_confidence: f64,
    /// Minimum model confidence to adopt its prediction
    pub min_ml_confidence: f64,
    /// Model inference timeout (milliseconds)
    pub model_timeout_ms: u64,
    /// Hard safety bounds per kind
    pub bounds: PerThreshold<HardBounds>,
    /// Static base value per kind
    pub base: PerThreshold<f64>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            min_stage_confidence: 0.6,
            min_ml_confidence: 0.7,
            model_timeout_ms: 250,
            bounds: PerThreshold {
                heat_stress_temp: HardBounds::new(32.0, 40.0),
                heavy_rain_mm: HardBounds::new(10.0, 50.0),
                high_wind_kmh: HardBounds::new(10.0, 60.0),
                cold_stress_temp: HardBounds::new(5.0, 15.0),
                dry_spell_days: HardBounds::new(3.0, 15.0),
            },
            base: PerThreshold {
                heat_stress_temp: 35.0,
                heavy_rain_mm: 10.0,
                high_wind_kmh: 50.0,
                cold_stress_temp: 5.0,
                dry_spell_days: 3.0,
            },
        }
    }
}

impl ProviderConfig {
    /// Adapt only on confident stage estimates and confident models
    pub fn strict() -> Self {
        Self {
            min_stage_confidence: 0.8,
            min_ml_confidence: 0.85,
            ..Default::default()
        }
    }

    /// Check bounds, base values and confidences
    pub fn validate(&self) -> Result<(), ThresholdError> {
        for (kind, bounds) in self.bounds.iter() {
            if !bounds.is_valid() {
                return Err(ThresholdError::InvalidBounds {
                    kind,
                    min: bounds.min,
                    max: bounds.max,
                });
            }
            let value = *self.base.get(kind);
            if !bounds.contains(value) {
                return Err(ThresholdError::BaseOutOfBounds {
                    kind,
                    value,
                    min: bounds.min,
                    max: bounds.max,
                });
            }
        }
        for (field, value) in [
            ("min_stage_confidence", self.min_stage_confidence),
            ("min_ml_confidence", self.min_ml_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ThresholdError::InvalidConfidence { field, value });
            }
        }
        if self.model_timeout_ms == 0 {
            return Err(ThresholdError::ZeroTimeout);
        }
        Ok(())
    }
}
