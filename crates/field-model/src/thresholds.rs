//! Threshold sets with provenance

use crate::hazard::{PerThreshold, ThresholdKind};
use serde::{Deserialize, Serialize};

/// Where a threshold value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThresholdSource {
    #[serde(rename = "ML")]
    Ml,
    #[serde(rename = "RULE_BASED")]
    RuleBased,
    #[serde(rename = "BASE")]
    Base,
}

impl ThresholdSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThresholdSource::Ml => "ML",
            ThresholdSource::RuleBased => "RULE_BASED",
            ThresholdSource::Base => "BASE",
        }
    }
}

/// A single threshold with provenance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdValue {
    pub value: f64,
    pub source: ThresholdSource,
    /// Confidence of the deriving path (0.0 to 1.0)
    pub confidence: f64,
}

impl ThresholdValue {
    pub fn base(value: f64) -> Self {
        Self {
            value,
            source: ThresholdSource::Base,
            confidence: 0.0,
        }
    }
}

/// Hard safety bounds for one threshold kind
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HardBounds {
    pub min: f64,
    pub max: f64,
}

impl HardBounds {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Clamp into `[min, max]`
    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Bounds are usable: finite and ordered
    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }
}

/// Per-situation thresholds, one typed entry per kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThresholdSet {
    entries: PerThreshold<ThresholdValue>,
}

impl ThresholdSet {
    /// Static defaults, tagged `BASE` with confidence 0
    pub fn base(defaults: &PerThreshold<f64>) -> Self {
        Self {
            entries: defaults.map(|_, v| ThresholdValue::base(*v)),
        }
    }

    pub fn get(&self, kind: ThresholdKind) -> &ThresholdValue {
        self.entries.get(kind)
    }

    pub fn value(&self, kind: ThresholdKind) -> f64 {
        self.entries.get(kind).value
    }

    pub fn set(&mut self, kind: ThresholdKind, value: ThresholdValue) {
        *self.entries.get_mut(kind) = value;
    }

    pub fn iter(&self) -> impl Iterator<Item = (ThresholdKind, &ThresholdValue)> {
        self.entries.iter()
    }

    /// Most informative source present in the set
    pub fn source(&self) -> ThresholdSource {
        let sources: Vec<ThresholdSource> = self.iter().map(|(_, v)| v.source).collect();
        if sources.contains(&ThresholdSource::Ml) {
            ThresholdSource::Ml
        } else if sources.contains(&ThresholdSource::RuleBased) {
            ThresholdSource::RuleBased
        } else {
            ThresholdSource::Base
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> PerThreshold<f64> {
        PerThreshold {
            heat_stress_temp: 35.0,
            heavy_rain_mm: 10.0,
            high_wind_kmh: 50.0,
            cold_stress_temp: 5.0,
            dry_spell_days: 3.0,
        }
    }

    #[test]
    fn test_base_set() {
        let set = ThresholdSet::base(&defaults());
        assert_eq!(set.value(ThresholdKind::HeatStressTemp), 35.0);
        assert_eq!(set.source(), ThresholdSource::Base);
        assert!(set.iter().all(|(_, v)| v.confidence == 0.0));
    }

    #[test]
    fn test_source_prefers_ml() {
        let mut set = ThresholdSet::base(&defaults());
        set.set(
            ThresholdKind::HeavyRainMm,
            ThresholdValue { value: 20.0, source: ThresholdSource::RuleBased, confidence: 0.75 },
        );
        assert_eq!(set.source(), ThresholdSource::RuleBased);

        set.set(
            ThresholdKind::HeatStressTemp,
            ThresholdValue { value: 36.0, source: ThresholdSource::Ml, confidence: 0.8 },
        );
        assert_eq!(set.source(), ThresholdSource::Ml);
    }

    #[test]
    fn test_bounds() {
        let bounds = HardBounds::new(32.0, 40.0);
        assert_eq!(bounds.clamp(45.0), 40.0);
        assert_eq!(bounds.clamp(20.0), 32.0);
        assert_eq!(bounds.clamp(36.5), 36.5);
        assert!(bounds.is_valid());
        assert!(!HardBounds::new(5.0, 1.0).is_valid());
        assert!(!HardBounds::new(f64::NAN, 1.0).is_valid());
    }

    #[test]
    fn test_set_serializes_by_kind() {
        let set = ThresholdSet::base(&defaults());
        let json = serde_json::to_value(&set).unwrap();
        assert_eq!(json["heat_stress_temp"]["source"], "BASE");
        assert_eq!(json["dry_spell_days"]["value"], 3.0);
    }
}
