//! Threshold Model Inference
//!
//! Runs a learned threshold model against a situation. The model is a
//! regression-tree ensemble exported to JSON; inference runs on the
//! blocking pool under a timeout so a slow model never stalls a cycle.

mod engine;
mod features;
mod forest;

pub use engine::{InferenceEngine, InferenceResult, ModelInfo, ModelPrediction, ThresholdModel};
pub use features::{season_name, FeatureEncoder, Vocabulary, FEATURE_COUNT, FEATURE_NAMES};
pub use forest::{ForestModel, ModelFile, Node, Scaler, Tree};

use thiserror::Error;

/// Errors during inference
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Model load failed: {0}")]
    ModelLoadError(String),
    #[error("Inference failed: {0}")]
    InferenceFailed(String),
    #[error("Invalid input shape: expected {expected}, got {actual}")]
    InvalidInputShape { expected: String, actual: String },
    #[error("Inference timeout after {0}ms")]
    Timeout(u64),
}
