//! Alerting System
//!
//! Evaluates hazard rules against current weather and forecast, maps the
//! margin over each threshold to a severity, and gates emission through a
//! per-(subject, hazard) cooldown store.

mod config;
mod cooldown;
mod evaluator;
mod rules;

pub use config::{AlertConfig, RuleConfig};
pub use cooldown::{CooldownKey, CooldownPhase, CooldownStore, InMemoryCooldownStore};
pub use evaluator::AlertEvaluator;
pub use rules::{evaluate_rule, Trigger};

use field_model::HazardType;
use thiserror::Error;

/// A rule could not be evaluated
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuleError {
    #[error("{hazard} rule skipped: missing {field}")]
    MissingField {
        hazard: HazardType,
        field: &'static str,
    },
}

/// Cooldown store failures; these abort the cycle
#[derive(Debug, Error)]
pub enum CooldownError {
    #[error("Lock error: {0}")]
    Lock(String),
    #[error("Cooldown backend error: {0}")]
    Backend(String),
}

/// Invalid alerting configuration
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AlertConfigError {
    #[error("{field} must be within [{min}, {max}], got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("Rain probability rule needs {min_days} of {window} days")]
    InvalidRainWindow { min_days: usize, window: usize },
}
