//! Inference Engine Implementation

use crate::InferenceError;
use field_model::{PerThreshold, Situation, ThresholdKind};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Per-kind predictions from a threshold model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPrediction {
    /// Predicted value per kind; `None` for kinds the model does not cover
    pub values: PerThreshold<Option<f64>>,
    /// Agreement-based confidence per kind
    pub confidences: PerThreshold<Option<f64>>,
    /// Overall confidence (0.0 to 1.0), mean over covered kinds
    pub confidence: f64,
}

impl ModelPrediction {
    /// Build a prediction from per-kind (value, confidence) pairs
    pub fn from_targets(targets: impl IntoIterator<Item = (ThresholdKind, f64, f64)>) -> Self {
        let mut values = PerThreshold::<Option<f64>>::default();
        let mut confidences = PerThreshold::<Option<f64>>::default();
        let mut total = 0.0;
        let mut count = 0usize;
        for (kind, value, confidence) in targets {
            *values.get_mut(kind) = Some(value);
            *confidences.get_mut(kind) = Some(confidence);
            total += confidence;
            count += 1;
        }
        let confidence = if count == 0 { 0.0 } else { total / count as f64 };
        Self {
            values,
            confidences,
            confidence,
        }
    }
}

/// Descriptive information about a loaded model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub path: String,
    pub targets: Vec<String>,
    pub feature_count: usize,
}

/// A learned model that predicts thresholds for a situation
///
/// Implementations are synchronous and CPU-bound; callers run them on the
/// blocking pool.
pub trait ThresholdModel: Send + Sync {
    fn predict(&self, situation: &Situation) -> Result<ModelPrediction, InferenceError>;

    fn info(&self) -> ModelInfo;
}

/// Result of inference operation
#[derive(Debug, Clone)]
pub struct InferenceResult {
    /// The prediction
    pub prediction: ModelPrediction,
    /// Inference latency in milliseconds
    pub latency_ms: u64,
}

/// Timeout-bounded model runner
#[derive(Clone)]
pub struct InferenceEngine {
    model: Arc<dyn ThresholdModel>,
    timeout: Duration,
}

impl InferenceEngine {
    /// Create a new inference engine
    pub fn new(model: Arc<dyn ThresholdModel>, timeout: Duration) -> Self {
        let info = model.info();
        info!(
            "Creating inference engine: model={}, targets={}, timeout={}ms",
            info.path,
            info.targets.len(),
            timeout.as_millis()
        );
        Self { model, timeout }
    }

    /// Run inference for a situation on the blocking pool
    ///
    /// A worker panic is reported as `InferenceFailed`, an elapsed timeout
    /// as `Timeout`.
    pub async fn predict(&self, situation: &Situation) -> Result<InferenceResult, InferenceError> {
        let start = Instant::now();
        let model = Arc::clone(&self.model);
        let situation = situation.clone();
        let worker = tokio::task::spawn_blocking(move || model.predict(&situation));

        let prediction = match tokio::time::timeout(self.timeout, worker).await {
            Ok(Ok(result)) => result?,
            Ok(Err(join_error)) => {
                return Err(InferenceError::InferenceFailed(format!(
                    "inference worker failed: {}",
                    join_error
                )))
            }
            Err(_) => return Err(InferenceError::Timeout(self.timeout.as_millis() as u64)),
        };

        if !prediction.confidence.is_finite() {
            return Err(InferenceError::InferenceFailed(
                "model returned a non-finite confidence".to_string(),
            ));
        }

        let latency_ms = start.elapsed().as_millis() as u64;
        debug!(
            "Inference completed in {}ms (confidence={:.2})",
            latency_ms, prediction.confidence
        );

        Ok(InferenceResult {
            prediction,
            latency_ms,
        })
    }

    pub fn info(&self) -> ModelInfo {
        self.model.info()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}
