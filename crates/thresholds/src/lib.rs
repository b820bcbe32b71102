//! Adaptive Thresholds
//!
//! Derives per-situation hazard thresholds:
//! 1. Validate the situation and gate on growth-stage confidence
//! 2. Try the learned model under a timeout
//! 3. Fall back to ordered rule strategies
//! 4. Clamp every derived value to its hard safety bounds and merge over
//!    the static base table

mod config;
mod provider;

pub use config::ProviderConfig;
pub use provider::{clamp_and_merge, ThresholdProvider};

use field_model::ThresholdKind;
use thiserror::Error;

/// Threshold configuration errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ThresholdError {
    #[error("Invalid bounds for {kind}: [{min}, {max}]")]
    InvalidBounds { kind: ThresholdKind, min: f64, max: f64 },
    #[error("Base value {value} for {kind} lies outside [{min}, {max}]")]
    BaseOutOfBounds {
        kind: ThresholdKind,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("{field} must be within [0, 1], got {value}")]
    InvalidConfidence { field: &'static str, value: f64 },
    #[error("Model timeout must be greater than zero")]
    ZeroTimeout,
}
