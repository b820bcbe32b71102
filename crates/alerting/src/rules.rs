//! Hazard rules
//!
//! Each rule is pure: it looks at the current readings, the forecast and
//! the threshold set and either fires, stays quiet, or reports the field
//! it could not evaluate without.

use crate::config::RuleConfig;
use crate::RuleError;
use field_model::{ForecastDay, HazardType, Severity, ThresholdKind, ThresholdSet, WeatherReadings};

/// A rule that fired, before cooldown gating
#[derive(Debug, Clone, PartialEq)]
pub struct Trigger {
    pub hazard: HazardType,
    pub severity: Severity,
    pub message: String,
    pub confidence: f64,
    /// 1-based forecast day on which the condition was met
    pub forecast_day: Option<u32>,
}

fn tier(margin: f64, high_margin: f64) -> Severity {
    if margin >= high_margin {
        Severity::High
    } else {
        Severity::Medium
    }
}

fn require(
    value: Option<f64>,
    hazard: HazardType,
    field: &'static str,
) -> Result<f64, RuleError> {
    value.ok_or(RuleError::MissingField { hazard, field })
}

/// Evaluate one hazard rule
pub fn evaluate_rule(
    hazard: HazardType,
    current: &WeatherReadings,
    forecast: &[ForecastDay],
    thresholds: &ThresholdSet,
    config: &RuleConfig,
) -> Result<Option<Trigger>, RuleError> {
    match hazard {
        HazardType::HeatStress => heat_stress(current, forecast, thresholds, config),
        HazardType::HeavyRain => heavy_rain(current, thresholds, config),
        HazardType::HighWind => high_wind(current, thresholds, config),
        HazardType::ColdStress => cold_stress(current, thresholds, config),
        HazardType::DrySpell => Ok(dry_spell(forecast, thresholds, config)),
        HazardType::HighRainProbability => Ok(high_rain_probability(forecast, config)),
    }
}

fn heat_stress(
    current: &WeatherReadings,
    forecast: &[ForecastDay],
    thresholds: &ThresholdSet,
    config: &RuleConfig,
) -> Result<Option<Trigger>, RuleError> {
    let hazard = HazardType::HeatStress;
    let threshold = thresholds.value(ThresholdKind::HeatStressTemp);

    let current_max = current.max_temperature.or(current.temperature);
    let observed = forecast
        .iter()
        .take(config.heat_forecast_days)
        .filter_map(|day| day.readings.max_temperature)
        .chain(current_max)
        .reduce(f64::max);
    let observed = require(observed, hazard, "max_temperature")?;

    if observed < threshold {
        return Ok(None);
    }
    let severity = tier(observed - threshold, *config.high_margins.get(hazard));
    let confidence = if severity == Severity::High { 0.9 } else { 0.8 };
    Ok(Some(Trigger {
        hazard,
        severity,
        message: format!(
            "High temperature ({:.1}°C) may cause heat stress to crops and livestock",
            observed
        ),
        confidence,
        forecast_day: None,
    }))
}

fn cold_stress(
    current: &WeatherReadings,
    thresholds: &ThresholdSet,
    config: &RuleConfig,
) -> Result<Option<Trigger>, RuleError> {
    let hazard = HazardType::ColdStress;
    let threshold = thresholds.value(ThresholdKind::ColdStressTemp);
    let observed = require(
        current.min_temperature.or(current.temperature),
        hazard,
        "min_temperature",
    )?;

    if observed > threshold {
        return Ok(None);
    }
    let severity = tier(threshold - observed, *config.high_margins.get(hazard));
    let confidence = if severity == Severity::High { 0.85 } else { 0.8 };
    Ok(Some(Trigger {
        hazard,
        severity,
        message: format!(
            "Low temperature ({:.1}°C) may cause cold stress and frost damage to crops",
            observed
        ),
        confidence,
        forecast_day: None,
    }))
}

fn heavy_rain(
    current: &WeatherReadings,
    thresholds: &ThresholdSet,
    config: &RuleConfig,
) -> Result<Option<Trigger>, RuleError> {
    let hazard = HazardType::HeavyRain;
    let threshold = thresholds.value(ThresholdKind::HeavyRainMm);
    let rainfall = require(current.rainfall_mm, hazard, "rainfall_mm")?;

    if rainfall < threshold {
        return Ok(None);
    }
    Ok(Some(Trigger {
        hazard,
        severity: tier(rainfall - threshold, *config.high_margins.get(hazard)),
        message: format!(
            "Heavy rainfall ({:.1}mm) may cause waterlogging and soil erosion",
            rainfall
        ),
        confidence: 0.85,
        forecast_day: None,
    }))
}

fn high_wind(
    current: &WeatherReadings,
    thresholds: &ThresholdSet,
    config: &RuleConfig,
) -> Result<Option<Trigger>, RuleError> {
    let hazard = HazardType::HighWind;
    let threshold = thresholds.value(ThresholdKind::HighWindKmh);
    let wind = require(current.wind_speed, hazard, "wind_speed")?;

    if wind < threshold {
        return Ok(None);
    }
    Ok(Some(Trigger {
        hazard,
        severity: tier(wind - threshold, *config.high_margins.get(hazard)),
        message: format!(
            "Strong winds ({:.1} km/h) may damage crops and affect spraying",
            wind
        ),
        confidence: 0.8,
        forecast_day: None,
    }))
}

fn is_dry(day: &ForecastDay, config: &RuleConfig) -> bool {
    match (day.readings.rainfall_mm, day.readings.rainfall_probability) {
        (Some(rain), Some(probability)) => {
            rain < config.dry_rain_mm && probability < config.low_probability
        }
        _ => false,
    }
}

fn dry_spell(forecast: &[ForecastDay], thresholds: &ThresholdSet, config: &RuleConfig) -> Option<Trigger> {
    let hazard = HazardType::DrySpell;
    let required = thresholds.value(ThresholdKind::DrySpellDays).round().max(1.0) as usize;
    let run = forecast.iter().take_while(|day| is_dry(day, config)).count();

    if run < required {
        return None;
    }
    let margin = (run - required) as f64;
    Some(Trigger {
        hazard,
        severity: tier(margin, *config.high_margins.get(hazard)),
        message: format!(
            "Dry spell expected: {} consecutive days with minimal rainfall",
            run
        ),
        confidence: 0.8,
        forecast_day: Some(required as u32),
    })
}

fn high_rain_probability(forecast: &[ForecastDay], config: &RuleConfig) -> Option<Trigger> {
    let hazard = HazardType::HighRainProbability;
    let window = &forecast[..forecast.len().min(config.rain_probability_window)];
    let wet_days: Vec<usize> = window
        .iter()
        .enumerate()
        .filter(|(_, day)| {
            day.readings
                .rainfall_probability
                .is_some_and(|p| p > config.high_probability)
        })
        .map(|(i, _)| i)
        .collect();

    if wet_days.len() < config.rain_probability_min_days {
        return None;
    }
    let margin = (wet_days.len() - config.rain_probability_min_days) as f64;
    let reached_on = wet_days
        .get(config.rain_probability_min_days.saturating_sub(1))
        .map(|i| *i as u32 + 1);
    Some(Trigger {
        hazard,
        severity: tier(margin, *config.high_margins.get(hazard)),
        message: format!(
            "High rainfall probability expected for {} of the next {} days",
            wet_days.len(),
            config.rain_probability_window
        ),
        confidence: 0.75,
        forecast_day: reached_on,
    })
}
