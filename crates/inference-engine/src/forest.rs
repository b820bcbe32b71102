//! Regression-tree ensemble loaded from JSON

use crate::engine::{ModelInfo, ModelPrediction, ThresholdModel};
use crate::features::{FeatureEncoder, Vocabulary, FEATURE_COUNT};
use crate::InferenceError;
use field_model::{Situation, ThresholdKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

/// Tree node; splits go left when `x[feature] <= threshold`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

/// A single regression tree, root at index 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    fn check(&self) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("empty tree".to_string());
        }
        for node in &self.nodes {
            if let Node::Split { feature, left, right, threshold } = node {
                if *feature >= FEATURE_COUNT {
                    return Err(format!("split on unknown feature {}", feature));
                }
                if *left >= self.nodes.len() || *right >= self.nodes.len() {
                    return Err("child index out of bounds".to_string());
                }
                if !threshold.is_finite() {
                    return Err("non-finite split threshold".to_string());
                }
            }
        }
        Ok(())
    }

    /// Walk from the root to a leaf
    pub fn evaluate(&self, x: &[f64; FEATURE_COUNT]) -> Result<f64, InferenceError> {
        let mut index = 0;
        // A well-formed tree reaches a leaf in fewer steps than it has nodes
        for _ in 0..self.nodes.len() {
            match self.nodes.get(index) {
                Some(Node::Leaf { value }) => return Ok(*value),
                Some(Node::Split { feature, threshold, left, right }) => {
                    index = if x[*feature] <= *threshold { *left } else { *right };
                }
                None => break,
            }
        }
        Err(InferenceError::InferenceFailed("malformed tree".to_string()))
    }
}

/// Standard scaler parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl Scaler {
    fn transform(&self, raw: &[f64; FEATURE_COUNT]) -> [f64; FEATURE_COUNT] {
        let mut out = [0.0; FEATURE_COUNT];
        for (i, slot) in out.iter_mut().enumerate() {
            let scale = if self.scale[i] == 0.0 { 1.0 } else { self.scale[i] };
            *slot = (raw[i] - self.mean[i]) / scale;
        }
        out
    }
}

/// On-disk model format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelFile {
    #[serde(default)]
    pub vocabulary: Vocabulary,
    pub scaler: Scaler,
    /// Trees per threshold kind, keyed by kind name
    pub targets: BTreeMap<String, Vec<Tree>>,
}

/// Random-forest threshold model
///
/// Per-kind confidence is `1 - std/mean` of the member tree predictions,
/// clamped to [0, 1]; overall confidence is the mean over kinds.
#[derive(Debug, Clone)]
pub struct ForestModel {
    path: String,
    encoder: FeatureEncoder,
    scaler: Scaler,
    targets: Vec<(ThresholdKind, Vec<Tree>)>,
}

impl ForestModel {
    /// Load a model from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, InferenceError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| InferenceError::ModelLoadError(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&path.display().to_string(), &json)
    }

    /// Parse and check a model from its JSON text
    pub fn from_json(path: &str, json: &str) -> Result<Self, InferenceError> {
        let file: ModelFile =
            serde_json::from_str(json).map_err(|e| InferenceError::ModelLoadError(e.to_string()))?;
        Self::from_file(path, file)
    }

    pub fn from_file(path: &str, file: ModelFile) -> Result<Self, InferenceError> {
        if file.scaler.mean.len() != FEATURE_COUNT || file.scaler.scale.len() != FEATURE_COUNT {
            return Err(InferenceError::InvalidInputShape {
                expected: format!("{} scaler entries", FEATURE_COUNT),
                actual: format!("{}/{}", file.scaler.mean.len(), file.scaler.scale.len()),
            });
        }
        if file.scaler.mean.iter().chain(&file.scaler.scale).any(|v| !v.is_finite()) {
            return Err(InferenceError::ModelLoadError("non-finite scaler entry".to_string()));
        }

        let mut targets = Vec::new();
        for (name, trees) in file.targets {
            let Some(kind) = target_kind(&name) else {
                warn!("Ignoring unknown model target: {}", name);
                continue;
            };
            if trees.is_empty() {
                return Err(InferenceError::ModelLoadError(format!("target {} has no trees", name)));
            }
            for tree in &trees {
                tree.check()
                    .map_err(|e| InferenceError::ModelLoadError(format!("target {}: {}", name, e)))?;
            }
            targets.push((kind, trees));
        }
        if targets.is_empty() {
            return Err(InferenceError::ModelLoadError("model has no known targets".to_string()));
        }

        info!("Loaded threshold model from {} ({} targets)", path, targets.len());
        Ok(Self {
            path: path.to_string(),
            encoder: FeatureEncoder::new(file.vocabulary),
            scaler: file.scaler,
            targets,
        })
    }
}

/// Resolve a target name, accepting legacy names for cold and dry-spell targets
fn target_kind(name: &str) -> Option<ThresholdKind> {
    match name {
        "low_temp_threshold" => Some(ThresholdKind::ColdStressTemp),
        "drought_days_threshold" => Some(ThresholdKind::DrySpellDays),
        other => ThresholdKind::from_name(other),
    }
}

/// Mean and agreement confidence of member predictions
fn ensemble_stats(predictions: &[f64]) -> (f64, f64) {
    let n = predictions.len() as f64;
    let mean = predictions.iter().sum::<f64>() / n;
    let variance = predictions.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / n;
    let confidence = if mean > 0.0 && mean.is_finite() {
        (1.0 - variance.sqrt() / mean).clamp(0.0, 1.0)
    } else {
        0.0
    };
    (mean, confidence)
}

impl ThresholdModel for ForestModel {
    fn predict(&self, situation: &Situation) -> Result<ModelPrediction, InferenceError> {
        let x = self.scaler.transform(&self.encoder.encode(situation));
        let mut outputs = Vec::with_capacity(self.targets.len());
        for (kind, trees) in &self.targets {
            let predictions = trees
                .iter()
                .map(|tree| tree.evaluate(&x))
                .collect::<Result<Vec<_>, _>>()?;
            let (mean, confidence) = ensemble_stats(&predictions);
            outputs.push((*kind, mean, confidence));
        }
        Ok(ModelPrediction::from_targets(outputs))
    }

    fn info(&self) -> ModelInfo {
        ModelInfo {
            path: self.path.clone(),
            targets: self.targets.iter().map(|(k, _)| k.as_str().to_string()).collect(),
            feature_count: FEATURE_COUNT,
        }
    }
}
