//! Advisory Layer
//!
//! Turns raw alerts into the advice a farmer sees:
//! - Seasonal feasibility filtering
//! - Mutual exclusion of contradicting hazards
//! - Per-severity caps with a normal-conditions fallback
//! - Farming actions derived from the surviving alerts

mod actions;
mod resolver;
mod season;

pub use actions::{ActionConfig, ActionSynthesizer};
pub use resolver::{ConflictResolver, ResolverConfig};
pub use season::{FeasibilityTable, Season, SeasonContext};

use field_model::HazardType;
use thiserror::Error;

/// Advisory configuration errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AdvisoryConfigError {
    #[error("Exclusion pair must name two different hazards, got {0} twice")]
    IdenticalPair(HazardType),

    #[error("Invalid comfortable temperature range: {min} to {max}")]
    InvalidComfortRange { min: f64, max: f64 },

    #[error("Invalid {field}: {value}")]
    InvalidValue { field: &'static str, value: f64 },
}
