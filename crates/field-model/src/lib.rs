//! FieldWatch Data Model
//!
//! Types shared by every stage of the alert engine:
//! - Situation (crop, growth stage, location, recent history)
//! - Weather readings (current snapshot and daily forecast)
//! - Threshold sets with provenance
//! - Risk alerts, farming actions and the aggregated cycle output

mod alert;
mod hazard;
mod situation;
mod thresholds;
mod weather;

pub use alert::{AlertOutput, AlertType, FarmingAction, Priority, RiskAlert, Severity, WeatherSummary};
pub use hazard::{HazardType, PerHazard, PerThreshold, ThresholdKind};
pub use situation::{AlertHistory, CropPerformance, HealthStatus, Location, Situation, SubjectId, WeatherHistory};
pub use thresholds::{HardBounds, ThresholdSet, ThresholdSource, ThresholdValue};
pub use weather::{ForecastDay, WeatherReadings, WeatherSnapshot};
