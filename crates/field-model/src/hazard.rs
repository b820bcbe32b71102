//! Hazard and threshold identifiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Weather-driven risk category
///
/// Declaration order is the tie-break priority used when two alerts are
/// otherwise equal (earlier wins).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HazardType {
    /// Maximum temperature at or above the heat threshold
    HeatStress,
    /// Current rainfall at or above the heavy rain threshold
    HeavyRain,
    /// Wind speed at or above the high wind threshold
    HighWind,
    /// Minimum temperature at or below the cold threshold
    ColdStress,
    /// Run of dry forecast days
    DrySpell,
    /// Rain very likely on most of the next three days
    HighRainProbability,
}

impl HazardType {
    /// All hazards, in priority order
    pub const ALL: [HazardType; 6] = [
        HazardType::HeatStress,
        HazardType::HeavyRain,
        HazardType::HighWind,
        HazardType::ColdStress,
        HazardType::DrySpell,
        HazardType::HighRainProbability,
    ];

    /// Get string representation (matches the wire format)
    pub fn as_str(&self) -> &'static str {
        match self {
            HazardType::HeatStress => "HEAT_STRESS",
            HazardType::HeavyRain => "HEAVY_RAIN",
            HazardType::HighWind => "HIGH_WIND",
            HazardType::ColdStress => "COLD_STRESS",
            HazardType::DrySpell => "DRY_SPELL",
            HazardType::HighRainProbability => "HIGH_RAIN_PROBABILITY",
        }
    }

    /// Tie-break rank, lower is more important
    pub fn priority_rank(&self) -> u8 {
        match self {
            HazardType::HeatStress => 0,
            HazardType::HeavyRain => 1,
            HazardType::HighWind => 2,
            HazardType::ColdStress => 3,
            HazardType::DrySpell => 4,
            HazardType::HighRainProbability => 5,
        }
    }
}

impl fmt::Display for HazardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One value per hazard
///
/// Used for tables that must cover every hazard (cooldown windows, rule
/// tuning) so that adding a hazard is a compile error until every table
/// is updated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerHazard<T> {
    pub heat_stress: T,
    pub heavy_rain: T,
    pub high_wind: T,
    pub cold_stress: T,
    pub dry_spell: T,
    pub high_rain_probability: T,
}

impl<T> PerHazard<T> {
    /// Build a table by evaluating `f` for every hazard
    pub fn from_fn(mut f: impl FnMut(HazardType) -> T) -> Self {
        Self {
            heat_stress: f(HazardType::HeatStress),
            heavy_rain: f(HazardType::HeavyRain),
            high_wind: f(HazardType::HighWind),
            cold_stress: f(HazardType::ColdStress),
            dry_spell: f(HazardType::DrySpell),
            high_rain_probability: f(HazardType::HighRainProbability),
        }
    }

    pub fn get(&self, hazard: HazardType) -> &T {
        match hazard {
            HazardType::HeatStress => &self.heat_stress,
            HazardType::HeavyRain => &self.heavy_rain,
            HazardType::HighWind => &self.high_wind,
            HazardType::ColdStress => &self.cold_stress,
            HazardType::DrySpell => &self.dry_spell,
            HazardType::HighRainProbability => &self.high_rain_probability,
        }
    }

    pub fn get_mut(&mut self, hazard: HazardType) -> &mut T {
        match hazard {
            HazardType::HeatStress => &mut self.heat_stress,
            HazardType::HeavyRain => &mut self.heavy_rain,
            HazardType::HighWind => &mut self.high_wind,
            HazardType::ColdStress => &mut self.cold_stress,
            HazardType::DrySpell => &mut self.dry_spell,
            HazardType::HighRainProbability => &mut self.high_rain_probability,
        }
    }

    /// Iterate in priority order
    pub fn iter(&self) -> impl Iterator<Item = (HazardType, &T)> {
        HazardType::ALL.into_iter().map(move |h| (h, self.get(h)))
    }
}

/// Numeric threshold parameters derived per situation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdKind {
    /// Heat stress temperature (°C)
    HeatStressTemp,
    /// Heavy rain amount (mm)
    HeavyRainMm,
    /// High wind speed (km/h)
    HighWindKmh,
    /// Cold stress temperature (°C)
    ColdStressTemp,
    /// Consecutive dry days before a dry spell alert
    DrySpellDays,
}

impl ThresholdKind {
    pub const ALL: [ThresholdKind; 5] = [
        ThresholdKind::HeatStressTemp,
        ThresholdKind::HeavyRainMm,
        ThresholdKind::HighWindKmh,
        ThresholdKind::ColdStressTemp,
        ThresholdKind::DrySpellDays,
    ];

    /// Get string representation (also the model target name)
    pub fn as_str(&self) -> &'static str {
        match self {
            ThresholdKind::HeatStressTemp => "heat_stress_temp",
            ThresholdKind::HeavyRainMm => "heavy_rain_mm",
            ThresholdKind::HighWindKmh => "high_wind_kmh",
            ThresholdKind::ColdStressTemp => "cold_stress_temp",
            ThresholdKind::DrySpellDays => "dry_spell_days",
        }
    }

    /// Parse a model target name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }
}

impl fmt::Display for ThresholdKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One value per threshold kind
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerThreshold<T> {
    pub heat_stress_temp: T,
    pub heavy_rain_mm: T,
    pub high_wind_kmh: T,
    pub cold_stress_temp: T,
    pub dry_spell_days: T,
}

impl<T> PerThreshold<T> {
    pub fn from_fn(mut f: impl FnMut(ThresholdKind) -> T) -> Self {
        Self {
            heat_stress_temp: f(ThresholdKind::HeatStressTemp),
            heavy_rain_mm: f(ThresholdKind::HeavyRainMm),
            high_wind_kmh: f(ThresholdKind::HighWindKmh),
            cold_stress_temp: f(ThresholdKind::ColdStressTemp),
            dry_spell_days: f(ThresholdKind::DrySpellDays),
        }
    }

    pub fn get(&self, kind: ThresholdKind) -> &T {
        match kind {
            ThresholdKind::HeatStressTemp => &self.heat_stress_temp,
            ThresholdKind::HeavyRainMm => &self.heavy_rain_mm,
            ThresholdKind::HighWindKmh => &self.high_wind_kmh,
            ThresholdKind::ColdStressTemp => &self.cold_stress_temp,
            ThresholdKind::DrySpellDays => &self.dry_spell_days,
        }
    }

    pub fn get_mut(&mut self, kind: ThresholdKind) -> &mut T {
        match kind {
            ThresholdKind::HeatStressTemp => &mut self.heat_stress_temp,
            ThresholdKind::HeavyRainMm => &mut self.heavy_rain_mm,
            ThresholdKind::HighWindKmh => &mut self.high_wind_kmh,
            ThresholdKind::ColdStressTemp => &mut self.cold_stress_temp,
            ThresholdKind::DrySpellDays => &mut self.dry_spell_days,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ThresholdKind, &T)> {
        ThresholdKind::ALL.into_iter().map(move |k| (k, self.get(k)))
    }

    /// Transform every value, keeping the kind alongside
    pub fn map<U>(&self, mut f: impl FnMut(ThresholdKind, &T) -> U) -> PerThreshold<U> {
        PerThreshold::from_fn(|k| f(k, self.get(k)))
    }
}
