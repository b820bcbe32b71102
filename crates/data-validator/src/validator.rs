//! Range checking for situations and weather readings

use crate::error::ValidationError;
use field_model::{ForecastDay, Situation, WeatherReadings, WeatherSnapshot};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Validation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Air temperature valid range (°C)
    pub temperature_range: (f64, f64),
    /// Relative humidity valid range (%)
    pub humidity_range: (f64, f64),
    /// Wind speed valid range (km/h)
    pub wind_speed_range: (f64, f64),
    /// Rainfall valid range (mm)
    pub rainfall_range: (f64, f64),
    /// Rain probability valid range
    pub probability_range: (f64, f64),
    /// Latitude valid range (degrees)
    pub latitude_range: (f64, f64),
    /// Longitude valid range (degrees)
    pub longitude_range: (f64, f64),
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            temperature_range: (-60.0, 60.0),
            humidity_range: (0.0, 100.0),
            wind_speed_range: (0.0, 400.0),
            rainfall_range: (0.0, 1000.0),
            probability_range: (0.0, 1.0),
            latitude_range: (-90.0, 90.0),
            longitude_range: (-180.0, 180.0),
        }
    }
}

/// Result of sanitizing a batch of readings
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    /// Whether all present values were valid
    pub valid: bool,
    /// Readings that were rejected and cleared
    pub errors: Vec<ValidationError>,
    /// Number of present fields checked
    pub fields_checked: usize,
}

impl ValidationResult {
    /// Create a valid result
    pub fn valid(fields_checked: usize) -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            fields_checked,
        }
    }

    /// Fold another result into this one
    pub fn merge(&mut self, other: ValidationResult) {
        self.valid &= other.valid;
        self.fields_checked += other.fields_checked;
        self.errors.extend(other.errors);
    }
}

/// Validator for situational context and weather inputs
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    /// Create a new validator with given config
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate a single value against a range
    pub fn validate_range(
        &self,
        field: &'static str,
        value: f64,
        range: (f64, f64),
    ) -> Result<(), ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::NotFinite(field));
        }
        if value < range.0 || value > range.1 {
            Err(ValidationError::OutOfRange {
                field,
                value,
                min: range.0,
                max: range.1,
            })
        } else {
            Ok(())
        }
    }

    fn validate_finite(&self, field: &'static str, value: f64) -> Result<(), ValidationError> {
        if value.is_finite() {
            Ok(())
        } else {
            Err(ValidationError::NotFinite(field))
        }
    }

    /// Validate the situational context used for threshold derivation
    ///
    /// Returns the first violation found.
    pub fn validate_situation(&self, situation: &Situation) -> Result<(), ValidationError> {
        if situation.subject_id.as_str().trim().is_empty() {
            return Err(ValidationError::BlankSubject);
        }
        self.validate_range("stage_confidence", situation.stage_confidence, (0.0, 1.0))?;
        self.validate_range("latitude", situation.location.latitude, self.config.latitude_range)?;
        self.validate_range("longitude", situation.location.longitude, self.config.longitude_range)?;
        self.validate_finite("elevation", situation.location.elevation)?;

        let history = &situation.weather_history;
        self.validate_finite("avg_temp_7d", history.avg_temp_7d)?;
        self.validate_finite("avg_humidity_7d", history.avg_humidity_7d)?;
        self.validate_finite("total_rain_7d", history.total_rain_7d)?;
        self.validate_finite("max_wind_7d", history.max_wind_7d)?;
        self.validate_finite("temp_variance_7d", history.temp_variance_7d)?;

        let performance = &situation.crop_performance;
        self.validate_finite("yield_trend", performance.yield_trend)?;
        self.validate_finite("recovery_rate", performance.recovery_rate)?;

        Ok(())
    }

    /// Clear every present reading that is non-finite or out of range
    pub fn sanitize_readings(&self, readings: &mut WeatherReadings) -> ValidationResult {
        let config = &self.config;
        let fields: [(&'static str, &mut Option<f64>, (f64, f64)); 7] = [
            ("temperature", &mut readings.temperature, config.temperature_range),
            ("min_temperature", &mut readings.min_temperature, config.temperature_range),
            ("max_temperature", &mut readings.max_temperature, config.temperature_range),
            ("humidity", &mut readings.humidity, config.humidity_range),
            ("wind_speed", &mut readings.wind_speed, config.wind_speed_range),
            ("rainfall_mm", &mut readings.rainfall_mm, config.rainfall_range),
            ("rainfall_probability", &mut readings.rainfall_probability, config.probability_range),
        ];

        let mut result = ValidationResult::valid(0);
        for (field, slot, range) in fields {
            let Some(value) = *slot else { continue };
            result.fields_checked += 1;
            if let Err(e) = self.validate_range(field, value, range) {
                warn!("Discarding reading: {}", e);
                *slot = None;
                result.valid = false;
                result.errors.push(e);
            }
        }
        result
    }

    /// Sanitize the current snapshot in place
    pub fn sanitize_snapshot(&self, snapshot: &mut WeatherSnapshot) -> ValidationResult {
        self.sanitize_readings(&mut snapshot.readings)
    }

    /// Sanitize every forecast day in place
    pub fn sanitize_forecast(&self, forecast: &mut [ForecastDay]) -> ValidationResult {
        let mut result = ValidationResult::valid(0);
        for day in forecast.iter_mut() {
            result.merge(self.sanitize_readings(&mut day.readings));
        }
        if let Some(index) = forecast.windows(2).position(|w| w[0].date >= w[1].date) {
            debug!("Forecast days are not strictly chronological");
            result.valid = false;
            result
                .errors
                .push(ValidationError::UnorderedForecast { index: index + 1 });
        }
        result
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}
