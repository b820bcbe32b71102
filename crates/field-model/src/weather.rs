//! Weather observations and forecasts

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Numeric weather readings
///
/// Every field is optional: upstream providers drop fields, and readings
/// that fail validation are cleared rather than trusted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherReadings {
    /// Air temperature (°C)
    pub temperature: Option<f64>,
    /// Minimum temperature (°C)
    pub min_temperature: Option<f64>,
    /// Maximum temperature (°C)
    pub max_temperature: Option<f64>,
    /// Relative humidity (%)
    pub humidity: Option<f64>,
    /// Wind speed (km/h)
    pub wind_speed: Option<f64>,
    /// Rainfall (mm)
    pub rainfall_mm: Option<f64>,
    /// Probability of rain (0.0 to 1.0)
    pub rainfall_probability: Option<f64>,
}

/// Current conditions at the subject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    #[serde(flatten)]
    pub readings: WeatherReadings,
    /// Condition keyword (clear, clouds, rain, ...)
    #[serde(default)]
    pub condition: String,
    /// Provider name
    #[serde(default)]
    pub source: String,
    pub observed_at: DateTime<Utc>,
}

impl WeatherSnapshot {
    pub fn new(readings: WeatherReadings, observed_at: DateTime<Utc>) -> Self {
        Self {
            readings,
            condition: String::new(),
            source: String::new(),
            observed_at,
        }
    }
}

/// Forecast for one day; index 0 of a forecast list is tomorrow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub readings: WeatherReadings,
    #[serde(default)]
    pub condition: String,
    #[serde(default)]
    pub source: String,
}

impl ForecastDay {
    pub fn new(date: NaiveDate, readings: WeatherReadings) -> Self {
        Self {
            date,
            readings,
            condition: String::new(),
            source: String::new(),
        }
    }
}
