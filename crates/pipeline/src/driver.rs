//! Evaluation cycle driver

use crate::collaborators::{CropContextProvider, WeatherSource};
use crate::config::EngineConfig;
use crate::summary::summarize;
use crate::{ConfigError, PipelineError};
use advisory::{ActionSynthesizer, ConflictResolver, SeasonContext};
use alerting::{AlertEvaluator, CooldownStore};
use chrono::{DateTime, Duration, Utc};
use data_validator::Validator;
use fallback::FallbackEngine;
use field_model::{AlertOutput, ForecastDay, Situation, SubjectId, ThresholdSet, WeatherSnapshot};
use inference_engine::{ModelInfo, ThresholdModel};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thresholds::ThresholdProvider;
use tracing::{debug, error, info, warn};

/// Inputs of one cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleInput {
    pub situation: Situation,
    pub current: WeatherSnapshot,
    /// Daily forecast, tomorrow first
    #[serde(default)]
    pub forecast: Vec<ForecastDay>,
}

/// How a cycle ended
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    Completed(AlertOutput),
    /// A newer cycle for the same subject started before this one finished
    Superseded,
}

impl CycleOutcome {
    pub fn into_output(self) -> Option<AlertOutput> {
        match self {
            CycleOutcome::Completed(output) => Some(output),
            CycleOutcome::Superseded => None,
        }
    }
}

/// Runs evaluation cycles against one cooldown store
///
/// Stages run strictly in order within a cycle; cycles for different
/// subjects share nothing mutable except the cooldown store.
pub struct Pipeline<S> {
    validator: Validator,
    provider: ThresholdProvider,
    evaluator: AlertEvaluator,
    resolver: ConflictResolver,
    synthesizer: ActionSynthesizer,
    store: S,
    cooldown_ttl: Duration,
    generations: Mutex<Generations>,
}

/// Latest cycle id per subject with a cycle in flight
///
/// Ids come from one counter shared by all subjects, so an id is never
/// reused after a subject's entry has been removed.
#[derive(Default)]
struct Generations {
    next: u64,
    latest: HashMap<SubjectId, u64>,
}

impl<S: CooldownStore> Pipeline<S> {
    /// Build every stage from a validated configuration
    pub fn new(
        config: &EngineConfig,
        model: Option<Arc<dyn ThresholdModel>>,
        store: S,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        info!(
            "Creating pipeline: model={}, ttl={}d",
            model.is_some(),
            config.scheduler.cooldown_ttl_days
        );
        Ok(Self {
            validator: Validator::new(config.validation.clone()),
            provider: ThresholdProvider::new(
                config.thresholds.clone(),
                model,
                FallbackEngine::default(),
            )?,
            evaluator: AlertEvaluator::new(config.alerting.clone())?,
            resolver: ConflictResolver::new(config.resolver.clone())?,
            synthesizer: ActionSynthesizer::new(config.actions.clone())?,
            store,
            cooldown_ttl: Duration::days(i64::from(config.scheduler.cooldown_ttl_days)),
            generations: Mutex::new(Generations::default()),
        })
    }

    fn begin(&self, subject: &SubjectId) -> Result<u64, PipelineError> {
        let mut generations = self
            .generations
            .lock()
            .map_err(|e| PipelineError::Lock(e.to_string()))?;
        generations.next += 1;
        let generation = generations.next;
        generations.latest.insert(subject.clone(), generation);
        Ok(generation)
    }

    /// End a cycle; returns whether it was still the subject's latest,
    /// in which case the subject's entry is dropped
    fn finish(&self, subject: &SubjectId, generation: u64) -> Result<bool, PipelineError> {
        let mut generations = self
            .generations
            .lock()
            .map_err(|e| PipelineError::Lock(e.to_string()))?;
        if generations.latest.get(subject) == Some(&generation) {
            generations.latest.remove(subject);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Run one full cycle
    ///
    /// Only cooldown store failures are returned as errors; bad readings,
    /// bad context and model failures degrade to sanitized inputs and rule
    /// or base thresholds.
    pub async fn run_cycle(
        &self,
        input: CycleInput,
        now: DateTime<Utc>,
    ) -> Result<CycleOutcome, PipelineError> {
        let CycleInput {
            situation,
            mut current,
            mut forecast,
        } = input;
        let subject = situation.subject_id.clone();
        let generation = self.begin(&subject)?;
        debug!("Cycle {} for {} started", generation, subject);

        let mut report = self.validator.sanitize_snapshot(&mut current);
        report.merge(self.validator.sanitize_forecast(&mut forecast));
        if !report.valid {
            warn!(
                "{} invalid weather readings for {} were discarded",
                report.errors.len(),
                subject
            );
        }
        forecast.sort_by_key(|day| day.date);

        let thresholds = self.provider.get_thresholds(&situation).await;
        debug!("Thresholds for {}: {:?}", subject, thresholds.source());

        let raw = match self
            .evaluator
            .evaluate(&subject, &current.readings, &forecast, &thresholds, &self.store, now)
            .await
        {
            Ok(alerts) => alerts,
            Err(e) => {
                error!("Cycle for {} failed: {}", subject, e);
                self.finish(&subject, generation)?;
                metrics::counter!("fieldwatch_cycles_total", "outcome" => "failed").increment(1);
                return Err(e.into());
            }
        };

        let alerts = self
            .resolver
            .resolve(raw, &SeasonContext::for_situation(&situation, now));
        let actions = self.synthesizer.synthesize(&alerts, &current.readings);
        let output = AlertOutput {
            weather_summary: summarize(&current, &forecast),
            risk_alerts: alerts,
            farming_actions: actions,
            generated_at: now,
        };

        if !self.finish(&subject, generation)? {
            info!("Cycle {} for {} superseded, discarding output", generation, subject);
            metrics::counter!("fieldwatch_cycles_total", "outcome" => "superseded").increment(1);
            return Ok(CycleOutcome::Superseded);
        }
        metrics::counter!("fieldwatch_cycles_total", "outcome" => "completed").increment(1);
        Ok(CycleOutcome::Completed(output))
    }

    /// Fetch context and weather for a subject, then run a cycle
    pub async fn refresh<C, W>(
        &self,
        subject: &SubjectId,
        crops: &C,
        weather: &W,
        now: DateTime<Utc>,
    ) -> Result<CycleOutcome, PipelineError>
    where
        C: CropContextProvider,
        W: WeatherSource,
    {
        let situation = crops.get_crop_context(subject).await.map_err(|e| {
            warn!("No crop context for {}: {}", subject, e);
            e
        })?;
        let (current, forecast) = weather.get_weather(&situation.location).await.map_err(|e| {
            warn!("No weather for {}: {}", subject, e);
            e
        })?;
        self.run_cycle(
            CycleInput {
                situation,
                current,
                forecast,
            },
            now,
        )
        .await
    }

    /// Thresholds for a situation, without evaluating alerts
    pub async fn thresholds(&self, situation: &Situation) -> ThresholdSet {
        self.provider.get_thresholds(situation).await
    }

    /// Drop cooldown entries idle for longer than the configured TTL
    pub async fn purge_cooldowns(&self, now: DateTime<Utc>) -> Result<usize, PipelineError> {
        let removed = self.store.purge_inactive(now - self.cooldown_ttl).await?;
        if removed > 0 {
            info!("Purged {} inactive cooldown entries", removed);
        }
        Ok(removed)
    }

    pub fn model_info(&self) -> Option<ModelInfo> {
        self.provider.model_info()
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
