//! Alert evaluator

use crate::config::AlertConfig;
use crate::cooldown::{CooldownKey, CooldownPhase, CooldownStore};
use crate::rules::{evaluate_rule, Trigger};
use crate::{AlertConfigError, CooldownError};
use chrono::{DateTime, Utc};
use field_model::{
    AlertType, ForecastDay, HazardType, RiskAlert, SubjectId, ThresholdSet, WeatherReadings,
};
use tracing::{debug, info, warn};

/// Runs every hazard rule and gates the results through the cooldown store
pub struct AlertEvaluator {
    config: AlertConfig,
}

impl AlertEvaluator {
    /// Create a new evaluator; the configuration is validated here
    pub fn new(config: AlertConfig) -> Result<Self, AlertConfigError> {
        config.validate()?;
        info!("Creating alert evaluator with config: {:?}", config);
        Ok(Self { config })
    }

    /// Evaluate all rules without touching cooldown state
    ///
    /// Rules that cannot be evaluated are skipped with a warning.
    pub fn check(
        &self,
        current: &WeatherReadings,
        forecast: &[ForecastDay],
        thresholds: &ThresholdSet,
    ) -> Vec<Trigger> {
        HazardType::ALL
            .into_iter()
            .filter_map(|hazard| {
                match evaluate_rule(hazard, current, forecast, thresholds, &self.config.rules) {
                    Ok(trigger) => trigger,
                    Err(e) => {
                        warn!("{}", e);
                        None
                    }
                }
            })
            .collect()
    }

    /// Evaluate all rules and emit the triggers whose cooldown has elapsed
    ///
    /// Suppressed triggers leave the store untouched. Store failures abort
    /// the evaluation.
    pub async fn evaluate<S: CooldownStore>(
        &self,
        subject: &SubjectId,
        current: &WeatherReadings,
        forecast: &[ForecastDay],
        thresholds: &ThresholdSet,
        store: &S,
        now: DateTime<Utc>,
    ) -> Result<Vec<RiskAlert>, CooldownError> {
        let mut alerts = Vec::new();
        for trigger in self.check(current, forecast, thresholds) {
            let key = CooldownKey::new(subject.clone(), trigger.hazard);
            let window = self.config.cooldown(trigger.hazard);
            if !store.try_fire(&key, now, window).await? {
                debug!("Alert suppressed: {} for {} in cooldown", trigger.hazard, subject);
                metrics::counter!("fieldwatch_alerts_suppressed_total", "hazard" => trigger.hazard.as_str())
                    .increment(1);
                continue;
            }

            info!(
                "Alert fired: {} for {} ({}, confidence={:.2})",
                trigger.hazard,
                subject,
                trigger.severity.as_str(),
                trigger.confidence
            );
            metrics::counter!("fieldwatch_alerts_emitted_total", "hazard" => trigger.hazard.as_str())
                .increment(1);
            alerts.push(RiskAlert {
                alert_type: AlertType::from(trigger.hazard),
                severity: trigger.severity,
                message: trigger.message,
                confidence: trigger.confidence,
                triggered_at: now,
                forecast_day: trigger.forecast_day,
            });
        }
        Ok(alerts)
    }

    /// Current cooldown phase of one (subject, hazard) pair
    pub async fn phase<S: CooldownStore>(
        &self,
        subject: &SubjectId,
        hazard: HazardType,
        store: &S,
        now: DateTime<Utc>,
    ) -> Result<CooldownPhase, CooldownError> {
        let key = CooldownKey::new(subject.clone(), hazard);
        let last = store.get(&key).await?;
        Ok(CooldownPhase::at(last, now, self.config.cooldown(hazard)))
    }

    pub fn config(&self) -> &AlertConfig {
        &self.config
    }
}

impl Default for AlertEvaluator {
    fn default() -> Self {
        Self {
            config: AlertConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cooldown::InMemoryCooldownStore;
    use chrono::{Duration, TimeZone};
    use field_model::{PerThreshold, Severity};

    struct BrokenStore;

    impl CooldownStore for BrokenStore {
        async fn get(&self, _key: &CooldownKey) -> Result<Option<DateTime<Utc>>, CooldownError> {
            Err(CooldownError::Backend("offline".to_string()))
        }

        async fn set(&self, _key: &CooldownKey, _at: DateTime<Utc>) -> Result<(), CooldownError> {
            Err(CooldownError::Backend("offline".to_string()))
        }

        async fn try_fire(
            &self,
            _key: &CooldownKey,
            _now: DateTime<Utc>,
            _window: Duration,
        ) -> Result<bool, CooldownError> {
            Err(CooldownError::Backend("offline".to_string()))
        }

        async fn purge_inactive(&self, _cutoff: DateTime<Utc>) -> Result<usize, CooldownError> {
            Err(CooldownError::Backend("offline".to_string()))
        }
    }

    fn thresholds() -> ThresholdSet {
        ThresholdSet::base(&PerThreshold {
            heat_stress_temp: 35.0,
            heavy_rain_mm: 10.0,
            high_wind_kmh: 50.0,
            cold_stress_temp: 5.0,
            dry_spell_days: 3.0,
        })
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap()
    }

    fn hot() -> WeatherReadings {
        WeatherReadings {
            max_temperature: Some(42.0),
            min_temperature: Some(28.0),
            rainfall_mm: Some(0.0),
            wind_speed: Some(8.0),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_single_heat_alert() {
        let evaluator = AlertEvaluator::default();
        let store = InMemoryCooldownStore::new();
        let subject = SubjectId::from("f1");

        let alerts = evaluator
            .evaluate(&subject, &hot(), &[], &thresholds(), &store, t0())
            .await
            .unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_type, AlertType::HeatStress);
        assert_eq!(alerts[0].severity, Severity::High);
        assert_eq!(alerts[0].triggered_at, t0());
    }

    #[tokio::test]
    async fn test_cooldown_suppresses_repeat() {
        let evaluator = AlertEvaluator::default();
        let store = InMemoryCooldownStore::new();
        let subject = SubjectId::from("f1");

        evaluator
            .evaluate(&subject, &hot(), &[], &thresholds(), &store, t0())
            .await
            .unwrap();
        let later = t0() + Duration::minutes(5);
        let alerts = evaluator
            .evaluate(&subject, &hot(), &[], &thresholds(), &store, later)
            .await
            .unwrap();
        assert!(alerts.is_empty());
        assert_eq!(
            evaluator.phase(&subject, HazardType::HeatStress, &store, later).await.unwrap(),
            CooldownPhase::Cooling
        );

        let after = t0() + Duration::minutes(31);
        let alerts = evaluator
            .evaluate(&subject, &hot(), &[], &thresholds(), &store, after)
            .await
            .unwrap();
        assert_eq!(alerts.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_fields_skip_only_their_rule() {
        let evaluator = AlertEvaluator::default();
        let store = InMemoryCooldownStore::new();
        let current = WeatherReadings {
            rainfall_mm: Some(35.0),
            ..Default::default()
        };
        let alerts = evaluator
            .evaluate(&SubjectId::from("f1"), &current, &[], &thresholds(), &store, t0())
            .await
            .unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_type, AlertType::HeavyRain);
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let evaluator = AlertEvaluator::default();
        let result = evaluator
            .evaluate(&SubjectId::from("f1"), &hot(), &[], &thresholds(), &BrokenStore, t0())
            .await;
        assert!(matches!(result, Err(CooldownError::Backend(_))));
    }

    #[tokio::test]
    async fn test_quiet_weather_touches_nothing() {
        let evaluator = AlertEvaluator::default();
        let store = InMemoryCooldownStore::new();
        let mild = WeatherReadings {
            max_temperature: Some(28.0),
            min_temperature: Some(18.0),
            rainfall_mm: Some(1.0),
            wind_speed: Some(10.0),
            ..Default::default()
        };
        let alerts = evaluator
            .evaluate(&SubjectId::from("f1"), &mild, &[], &thresholds(), &store, t0())
            .await
            .unwrap();
        assert!(alerts.is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = AlertConfig::default();
        config.rules.low_probability = -0.1;
        assert!(AlertEvaluator::new(config).is_err());
    }
}
