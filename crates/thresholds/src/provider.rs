//! Threshold provider

use crate::config::ProviderConfig;
use crate::ThresholdError;
use data_validator::Validator;
use fallback::FallbackEngine;
use field_model::{
    HardBounds, PerThreshold, Situation, ThresholdSet, ThresholdSource, ThresholdValue,
};
use inference_engine::{InferenceEngine, ModelInfo, ThresholdModel};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Clamp derived values into their bounds and merge them over `base`
///
/// Kinds with no derived value, or a non-finite one, keep the base entry.
pub fn clamp_and_merge(
    base: &ThresholdSet,
    derived: &PerThreshold<Option<f64>>,
    bounds: &PerThreshold<HardBounds>,
    source: ThresholdSource,
    confidence: f64,
) -> ThresholdSet {
    let mut merged = base.clone();
    for (kind, value) in derived.iter() {
        let Some(value) = (*value).filter(|v| v.is_finite()) else {
            continue;
        };
        let clamped = bounds.get(kind).clamp(value);
        if clamped != value {
            debug!("Clamped {}: {} -> {}", kind, value, clamped);
        }
        merged.set(
            kind,
            ThresholdValue {
                value: clamped,
                source,
                confidence,
            },
        );
    }
    merged
}

/// Derives the threshold set for a situation
///
/// Never fails: every degraded path ends in rule-based or base thresholds.
pub struct ThresholdProvider {
    config: ProviderConfig,
    base: ThresholdSet,
    validator: Validator,
    engine: Option<InferenceEngine>,
    fallback: FallbackEngine,
}

impl ThresholdProvider {
    /// Create a provider; the configuration is validated here
    pub fn new(
        config: ProviderConfig,
        model: Option<Arc<dyn ThresholdModel>>,
        fallback: FallbackEngine,
    ) -> Result<Self, ThresholdError> {
        config.validate()?;
        let timeout = Duration::from_millis(config.model_timeout_ms);
        let engine = model.map(|m| InferenceEngine::new(m, timeout));
        info!(
            "Creating threshold provider: model={}, strategies={}",
            engine.is_some(),
            fallback.len()
        );
        Ok(Self {
            base: ThresholdSet::base(&config.base),
            config,
            validator: Validator::default(),
            engine,
            fallback,
        })
    }

    /// Static base set (source `BASE`, confidence 0)
    pub fn base_set(&self) -> ThresholdSet {
        self.base.clone()
    }

    /// Derive thresholds for a situation
    pub async fn get_thresholds(&self, situation: &Situation) -> ThresholdSet {
        if let Err(e) = self.validator.validate_situation(situation) {
            warn!("Invalid situation for {}: {}, using base thresholds", situation.subject_id, e);
            metrics::counter!("fieldwatch_threshold_derivations_total", "path" => "invalid_input")
                .increment(1);
            return self.base_set();
        }

        let Some(stage) = situation.growth_stage() else {
            debug!("No growth stage for {}, using base thresholds", situation.subject_id);
            metrics::counter!("fieldwatch_threshold_derivations_total", "path" => "stage_gate")
                .increment(1);
            return self.base_set();
        };
        if situation.stage_confidence < self.config.min_stage_confidence {
            debug!(
                "Stage confidence {:.2} below {:.2} for {}, using base thresholds",
                situation.stage_confidence, self.config.min_stage_confidence, situation.subject_id
            );
            metrics::counter!("fieldwatch_threshold_derivations_total", "path" => "stage_gate")
                .increment(1);
            return self.base_set();
        }

        if let Some(engine) = &self.engine {
            match engine.predict(situation).await {
                Ok(result) if result.prediction.confidence >= self.config.min_ml_confidence => {
                    info!(
                        "Model thresholds applied for {} (confidence={:.2}, latency={}ms)",
                        situation.subject_id, result.prediction.confidence, result.latency_ms
                    );
                    metrics::counter!("fieldwatch_threshold_derivations_total", "path" => "ml")
                        .increment(1);
                    return clamp_and_merge(
                        &self.base,
                        &result.prediction.values,
                        &self.config.bounds,
                        ThresholdSource::Ml,
                        result.prediction.confidence,
                    );
                }
                Ok(result) => {
                    debug!(
                        "Model confidence {:.2} below {:.2}, using rules",
                        result.prediction.confidence, self.config.min_ml_confidence
                    );
                }
                Err(e) => {
                    warn!("Degraded mode for {}: model unavailable ({})", situation.subject_id, e);
                    metrics::counter!("fieldwatch_threshold_degraded_total").increment(1);
                }
            }
        }

        match self.fallback.propose(situation) {
            Some((strategy, proposal)) => {
                info!(
                    "Rule-based thresholds applied for {} (strategy={}, stage={}, confidence={:.2})",
                    situation.subject_id, strategy, stage, proposal.confidence
                );
                metrics::counter!("fieldwatch_threshold_derivations_total", "path" => "rule_based")
                    .increment(1);
                clamp_and_merge(
                    &self.base,
                    &proposal.values,
                    &self.config.bounds,
                    ThresholdSource::RuleBased,
                    proposal.confidence,
                )
            }
            None => {
                warn!("No threshold strategy matched {}, using base thresholds", situation.subject_id);
                self.base_set()
            }
        }
    }

    /// Information about the configured model, if any
    pub fn model_info(&self) -> Option<ModelInfo> {
        self.engine.as_ref().map(InferenceEngine::info)
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use field_model::{HealthStatus, Location, SubjectId, ThresholdKind};
    use inference_engine::{InferenceError, ModelPrediction};
    use proptest::prelude::*;

    struct FixedModel {
        heat: f64,
        wind: f64,
        confidence: f64,
    }

    impl ThresholdModel for FixedModel {
        fn predict(&self, _situation: &Situation) -> Result<ModelPrediction, InferenceError> {
            Ok(ModelPrediction::from_targets([
                (ThresholdKind::HeatStressTemp, self.heat, self.confidence),
                (ThresholdKind::HighWindKmh, self.wind, self.confidence),
            ]))
        }

        fn info(&self) -> ModelInfo {
            ModelInfo {
                path: "fixed".to_string(),
                targets: vec!["heat_stress_temp".into(), "high_wind_kmh".into()],
                feature_count: 0,
            }
        }
    }

    struct FailingModel;

    impl ThresholdModel for FailingModel {
        fn predict(&self, _situation: &Situation) -> Result<ModelPrediction, InferenceError> {
            Err(InferenceError::InferenceFailed("no trees".to_string()))
        }

        fn info(&self) -> ModelInfo {
            ModelInfo {
                path: "failing".to_string(),
                targets: Vec::new(),
                feature_count: 0,
            }
        }
    }

    fn situation() -> Situation {
        Situation::new(
            SubjectId::from("field-3"),
            Location::new(22.3, 70.8),
            NaiveDate::from_ymd_opt(2026, 8, 12).unwrap(),
        )
        .with_crop("cotton", "vegetative", 0.9)
    }

    fn provider(model: Option<Arc<dyn ThresholdModel>>) -> ThresholdProvider {
        ThresholdProvider::new(ProviderConfig::default(), model, FallbackEngine::default()).unwrap()
    }

    #[tokio::test]
    async fn test_stage_gate() {
        let provider = provider(None);
        let mut s = situation();
        s.stage_confidence = 0.5;
        let set = provider.get_thresholds(&s).await;
        assert_eq!(set, provider.base_set());

        let mut s = situation();
        s.growth_stage = Some("  ".to_string());
        let set = provider.get_thresholds(&s).await;
        assert_eq!(set.source(), ThresholdSource::Base);
        assert!(set.iter().all(|(_, v)| v.confidence == 0.0));
    }

    #[tokio::test]
    async fn test_invalid_situation_uses_base() {
        let provider = provider(None);
        let mut s = situation();
        s.location.latitude = 120.0;
        assert_eq!(provider.get_thresholds(&s).await, provider.base_set());
    }

    #[tokio::test]
    async fn test_confident_model_is_adopted() {
        let model = FixedModel { heat: 38.0, wind: 90.0, confidence: 0.8 };
        let provider = provider(Some(Arc::new(model)));
        let set = provider.get_thresholds(&situation()).await;

        let heat = set.get(ThresholdKind::HeatStressTemp);
        assert_eq!(heat.value, 38.0);
        assert_eq!(heat.source, ThresholdSource::Ml);
        assert!((heat.confidence - 0.8).abs() < 1e-9);
        // clamped to the wind bound
        assert_eq!(set.value(ThresholdKind::HighWindKmh), 60.0);
        // not covered by the model
        assert_eq!(set.get(ThresholdKind::HeavyRainMm).source, ThresholdSource::Base);
        assert_eq!(set.value(ThresholdKind::HeavyRainMm), 10.0);
    }

    #[tokio::test]
    async fn test_unconfident_model_falls_back_to_rules() {
        let model = FixedModel { heat: 38.0, wind: 20.0, confidence: 0.5 };
        let provider = provider(Some(Arc::new(model)));
        let set = provider.get_thresholds(&situation()).await;
        assert_eq!(set.source(), ThresholdSource::RuleBased);
        assert_eq!(set.value(ThresholdKind::HeatStressTemp), 37.0);
        assert_eq!(set.get(ThresholdKind::HeatStressTemp).confidence, 0.82);
    }

    #[tokio::test]
    async fn test_model_error_falls_back_to_rules() {
        let provider = provider(Some(Arc::new(FailingModel)));
        let mut s = situation();
        s.health_status = HealthStatus::Slow;
        let set = provider.get_thresholds(&s).await;
        assert_eq!(set.source(), ThresholdSource::RuleBased);
        assert_eq!(set.value(ThresholdKind::HeatStressTemp), 34.0);
        assert_eq!(set.value(ThresholdKind::HighWindKmh), 14.0);
        assert_eq!(set.value(ThresholdKind::DrySpellDays), 4.0);
    }

    #[tokio::test]
    async fn test_stressed_crop_keeps_rule_wind() {
        let provider = provider(None);
        let mut s = situation();
        s.health_status = HealthStatus::Abnormal;
        let set = provider.get_thresholds(&s).await;

        let wind = set.get(ThresholdKind::HighWindKmh);
        assert_eq!(wind.value, 14.0);
        assert_eq!(wind.source, ThresholdSource::RuleBased);
        assert_eq!(wind.confidence, 0.75);
    }

    #[tokio::test]
    async fn test_model_wind_clamped_to_floor() {
        let model = FixedModel { heat: 36.0, wind: 4.0, confidence: 0.9 };
        let provider = provider(Some(Arc::new(model)));
        let set = provider.get_thresholds(&situation()).await;
        assert_eq!(set.value(ThresholdKind::HighWindKmh), 10.0);
    }

    #[tokio::test]
    async fn test_no_matching_strategy() {
        let provider =
            ThresholdProvider::new(ProviderConfig::default(), None, FallbackEngine::new(Vec::new()))
                .unwrap();
        assert_eq!(provider.get_thresholds(&situation()).await, provider.base_set());
        assert!(provider.model_info().is_none());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = ProviderConfig::default();
        config.base.heat_stress_temp = 45.0;
        assert!(ThresholdProvider::new(config, None, FallbackEngine::default()).is_err());
    }

    #[test]
    fn test_non_finite_keeps_base() {
        let config = ProviderConfig::default();
        let base = ThresholdSet::base(&config.base);
        let mut derived = PerThreshold::<Option<f64>>::default();
        derived.heat_stress_temp = Some(f64::NAN);
        derived.heavy_rain_mm = Some(f64::INFINITY);
        derived.cold_stress_temp = Some(9.0);

        let merged = clamp_and_merge(&base, &derived, &config.bounds, ThresholdSource::Ml, 0.9);
        assert_eq!(merged.get(ThresholdKind::HeatStressTemp), base.get(ThresholdKind::HeatStressTemp));
        assert_eq!(merged.get(ThresholdKind::HeavyRainMm), base.get(ThresholdKind::HeavyRainMm));
        assert_eq!(merged.value(ThresholdKind::ColdStressTemp), 9.0);
    }

    fn any_value() -> impl Strategy<Value = Option<f64>> {
        prop_oneof![
            Just(None),
            Just(Some(f64::NAN)),
            Just(Some(f64::INFINITY)),
            Just(Some(f64::NEG_INFINITY)),
            (-1.0e6..1.0e6f64).prop_map(Some),
        ]
    }

    proptest! {
        #[test]
        fn merged_values_stay_within_bounds(
            heat in any_value(),
            rain in any_value(),
            wind in any_value(),
            cold in any_value(),
            dry in any_value(),
            confidence in 0.0..=1.0f64,
        ) {
            let config = ProviderConfig::default();
            let base = ThresholdSet::base(&config.base);
            let derived = PerThreshold {
                heat_stress_temp: heat,
                heavy_rain_mm: rain,
                high_wind_kmh: wind,
                cold_stress_temp: cold,
                dry_spell_days: dry,
            };
            let merged = clamp_and_merge(&base, &derived, &config.bounds, ThresholdSource::Ml, confidence);
            for (kind, value) in merged.iter() {
                prop_assert!(config.bounds.get(kind).contains(value.value));
                if value.source == ThresholdSource::Base {
                    prop_assert_eq!(value.confidence, 0.0);
                }
            }
        }
    }
}
