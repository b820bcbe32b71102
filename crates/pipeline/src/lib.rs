//! FieldWatch Pipeline
//!
//! Runs one evaluation cycle per subject:
//! weather sanitation -> thresholds -> alert rules and cooldown ->
//! conflict resolution -> farming actions -> weather summary.
//!
//! Also hosts the engine configuration, the collaborator traits used to
//! fetch inputs, and a fixed-interval poll scheduler.

mod collaborators;
mod config;
mod driver;
mod scheduler;
mod summary;

pub use collaborators::{CropContextProvider, WeatherSource};
pub use config::{EngineConfig, LogFormat, LoggingConfig, SchedulerConfig, ServerConfig};
pub use driver::{CycleInput, CycleOutcome, Pipeline};
pub use scheduler::PollScheduler;
pub use summary::summarize;

use advisory::AdvisoryConfigError;
use alerting::{AlertConfigError, CooldownError};
use field_model::SubjectId;
use storage::StorageError;
use thiserror::Error;
use thresholds::ThresholdError;

/// Fatal configuration errors, raised at startup
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("Invalid threshold configuration: {0}")]
    Thresholds(#[from] ThresholdError),

    #[error("Invalid alert configuration: {0}")]
    Alerting(#[from] AlertConfigError),

    #[error("Invalid advisory configuration: {0}")]
    Advisory(#[from] AdvisoryConfigError),

    #[error("Cooldown store unavailable: {0}")]
    Storage(#[from] StorageError),

    #[error("Poll interval must be greater than zero")]
    ZeroPollInterval,
}

/// Failures from collaborators that supply cycle inputs
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UpstreamError {
    #[error("Unknown subject: {0}")]
    UnknownSubject(SubjectId),

    #[error("Upstream unavailable: {0}")]
    Unavailable(String),
}

/// Hard failures of a cycle
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Cooldown store failure: {0}")]
    Cooldown(#[from] CooldownError),

    #[error("Upstream failure: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("Lock error: {0}")]
    Lock(String),
}
