//! Farming actions for resolved alerts

use crate::AdvisoryConfigError;
use field_model::{AlertType, FarmingAction, HazardType, Priority, RiskAlert, WeatherReadings};
use serde::{Deserialize, Serialize};
use tracing::debug;

type ActionRow = (&'static str, &'static str, Priority);

const HEAT_ACTIONS: &[ActionRow] = &[
    (
        "Increase irrigation frequency during early morning or evening",
        "High temperatures increase water needs and prevent crop stress",
        Priority::High,
    ),
    (
        "Avoid field work during peak heat hours (11 AM - 3 PM)",
        "Protect yourself and livestock from heat exhaustion",
        Priority::High,
    ),
    (
        "Provide shade for young plants and livestock",
        "Prevent heat damage and reduce stress",
        Priority::Medium,
    ),
];

const HEAVY_RAIN_ACTIONS: &[ActionRow] = &[
    (
        "Stop all irrigation immediately",
        "Prevent waterlogging and root damage",
        Priority::High,
    ),
    (
        "Check and improve field drainage",
        "Remove excess water and prevent soil erosion",
        Priority::High,
    ),
    (
        "Delay sowing and transplanting",
        "Seeds may wash away and young plants may drown",
        Priority::Medium,
    ),
    (
        "Postpone pesticide and fertilizer application",
        "Rain will wash away chemicals and waste money",
        Priority::Medium,
    ),
];

const HIGH_WIND_ACTIONS: &[ActionRow] = &[
    (
        "Postpone pesticide spraying",
        "Wind causes spray drift and reduces effectiveness",
        Priority::High,
    ),
    (
        "Secure loose materials and protect young plants",
        "Prevent damage from strong winds",
        Priority::Medium,
    ),
];

const COLD_ACTIONS: &[ActionRow] = &[
    (
        "Cover nursery beds and young plants overnight",
        "Protect seedlings from frost damage",
        Priority::High,
    ),
    (
        "Move livestock to sheltered areas at night",
        "Prevent cold stress in animals",
        Priority::Medium,
    ),
    (
        "Postpone transplanting until temperatures rise",
        "Young transplants are vulnerable to cold injury",
        Priority::Medium,
    ),
];

const DRY_SPELL_ACTIONS: &[ActionRow] = &[
    (
        "Conserve water through mulching",
        "Reduce soil evaporation and maintain moisture",
        Priority::High,
    ),
    (
        "Plan supplemental irrigation",
        "Maintain crop water requirements during dry period",
        Priority::High,
    ),
    (
        "Consider drought-resistant crops for next season",
        "Prepare for future water scarcity",
        Priority::Medium,
    ),
];

const RAIN_PROBABILITY_ACTIONS: &[ActionRow] = &[
    (
        "Delay sowing if rain expected within 2-3 days",
        "Seeds need proper conditions to germinate",
        Priority::High,
    ),
    (
        "Prepare covered storage for harvested crops",
        "Protect harvest from unexpected rain damage",
        Priority::Medium,
    ),
    (
        "Check and repair farm equipment before rain",
        "Wet conditions make equipment maintenance difficult",
        Priority::Low,
    ),
];

const PEST_WATCH: ActionRow = (
    "Monitor for pest infestations in hot, dry conditions",
    "Pests thrive in hot, dry weather",
    Priority::Medium,
);

const GOOD_CONDITIONS: ActionRow = (
    "Good conditions for most farming activities",
    "Weather is favorable for field work",
    Priority::Low,
);

fn table(hazard: HazardType) -> &'static [ActionRow] {
    match hazard {
        HazardType::HeatStress => HEAT_ACTIONS,
        HazardType::HeavyRain => HEAVY_RAIN_ACTIONS,
        HazardType::HighWind => HIGH_WIND_ACTIONS,
        HazardType::ColdStress => COLD_ACTIONS,
        HazardType::DrySpell => DRY_SPELL_ACTIONS,
        HazardType::HighRainProbability => RAIN_PROBABILITY_ACTIONS,
    }
}

/// Ambient conditions behind the general (alert-independent) actions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionConfig {
    /// Comfortable temperature range (°C), inclusive
    pub comfortable_min_temp: f64,
    pub comfortable_max_temp: f64,
    /// Rainfall below which the day counts as workable (mm)
    pub workable_rain_mm: f64,
    /// Pest watch: temperature strictly above (°C)
    pub pest_min_temp: f64,
    /// Pest watch: humidity strictly below (%)
    pub pest_max_humidity: f64,
}

impl Default for ActionConfig {
    fn default() -> Self {
        Self {
            comfortable_min_temp: 20.0,
            comfortable_max_temp: 30.0,
            workable_rain_mm: 5.0,
            pest_min_temp: 30.0,
            pest_max_humidity: 40.0,
        }
    }
}

impl ActionConfig {
    pub fn validate(&self) -> Result<(), AdvisoryConfigError> {
        let (min, max) = (self.comfortable_min_temp, self.comfortable_max_temp);
        if !(min.is_finite() && max.is_finite() && min <= max) {
            return Err(AdvisoryConfigError::InvalidComfortRange { min, max });
        }
        for (field, value) in [
            ("workable_rain_mm", self.workable_rain_mm),
            ("pest_max_humidity", self.pest_max_humidity),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(AdvisoryConfigError::InvalidValue { field, value });
            }
        }
        if !self.pest_min_temp.is_finite() {
            return Err(AdvisoryConfigError::InvalidValue {
                field: "pest_min_temp",
                value: self.pest_min_temp,
            });
        }
        Ok(())
    }
}

/// Maps resolved alerts to an ordered, de-duplicated action list
///
/// Contradictions between actions cannot arise here: the resolver never
/// lets both members of an exclusive hazard pair through.
pub struct ActionSynthesizer {
    config: ActionConfig,
}

impl ActionSynthesizer {
    pub fn new(config: ActionConfig) -> Result<Self, AdvisoryConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn synthesize(&self, alerts: &[RiskAlert], ambient: &WeatherReadings) -> Vec<FarmingAction> {
        let mut actions: Vec<FarmingAction> = Vec::new();
        for hazard in alerts.iter().filter_map(RiskAlert::hazard) {
            for (action, reason, priority) in table(hazard) {
                match actions.iter_mut().find(|a| a.action == *action) {
                    Some(existing) if existing.priority.rank() < priority.rank() => {
                        *existing = FarmingAction::new(action, reason, *priority);
                    }
                    Some(_) => debug!("Skipping duplicate action: {}", action),
                    None => actions.push(FarmingAction::new(action, reason, *priority)),
                }
            }
        }

        if self.is_hot_and_dry(ambient) {
            let (action, reason, priority) = PEST_WATCH;
            actions.push(FarmingAction::new(action, reason, priority));
        }

        if actions.is_empty() && self.is_quiet(alerts) && self.is_comfortable(ambient) {
            let (action, reason, priority) = GOOD_CONDITIONS;
            actions.push(FarmingAction::new(action, reason, priority));
        }

        // Stable: table order is kept within a priority
        actions.sort_by(|a, b| b.priority.rank().cmp(&a.priority.rank()));
        actions
    }

    fn is_quiet(&self, alerts: &[RiskAlert]) -> bool {
        !alerts.is_empty()
            && alerts
                .iter()
                .all(|a| a.alert_type == AlertType::NormalConditions)
    }

    fn is_hot_and_dry(&self, ambient: &WeatherReadings) -> bool {
        match (ambient_temperature(ambient), ambient.humidity) {
            (Some(temperature), Some(humidity)) => {
                temperature > self.config.pest_min_temp && humidity < self.config.pest_max_humidity
            }
            _ => false,
        }
    }

    fn is_comfortable(&self, ambient: &WeatherReadings) -> bool {
        let Some(temperature) = ambient_temperature(ambient) else {
            return false;
        };
        let rainfall = ambient.rainfall_mm.unwrap_or(0.0);
        (self.config.comfortable_min_temp..=self.config.comfortable_max_temp).contains(&temperature)
            && rainfall < self.config.workable_rain_mm
    }

    pub fn config(&self) -> &ActionConfig {
        &self.config
    }
}

fn ambient_temperature(ambient: &WeatherReadings) -> Option<f64> {
    ambient.temperature.or(ambient.max_temperature)
}

impl Default for ActionSynthesizer {
    fn default() -> Self {
        Self {
            config: ActionConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use field_model::Severity;

    fn alert(hazard: HazardType, severity: Severity) -> RiskAlert {
        RiskAlert {
            alert_type: AlertType::from(hazard),
            severity,
            message: String::new(),
            confidence: 0.8,
            triggered_at: Utc.with_ymd_and_hms(2026, 4, 10, 12, 0, 0).unwrap(),
            forecast_day: None,
        }
    }

    fn normal() -> RiskAlert {
        RiskAlert::normal_conditions(Utc.with_ymd_and_hms(2026, 4, 10, 12, 0, 0).unwrap())
    }

    fn pleasant() -> WeatherReadings {
        WeatherReadings {
            temperature: Some(24.0),
            rainfall_mm: Some(0.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_heat_actions() {
        let actions = ActionSynthesizer::default()
            .synthesize(&[alert(HazardType::HeatStress, Severity::High)], &pleasant());
        assert_eq!(actions.len(), 3);
        assert!(actions
            .iter()
            .any(|a| a.action == "Avoid field work during peak heat hours (11 AM - 3 PM)"));
        assert_eq!(actions[2].priority, Priority::Medium);
    }

    #[test]
    fn test_repeated_hazard_actions_listed_once() {
        let actions = ActionSynthesizer::default().synthesize(
            &[
                alert(HazardType::HeavyRain, Severity::High),
                alert(HazardType::HeavyRain, Severity::Medium),
            ],
            &pleasant(),
        );
        assert_eq!(actions.len(), 4);
        let drainage = actions
            .iter()
            .filter(|a| a.action == "Check and improve field drainage")
            .count();
        assert_eq!(drainage, 1);
    }

    #[test]
    fn test_rain_and_rain_probability_keep_distinct_delays() {
        let actions = ActionSynthesizer::default().synthesize(
            &[
                alert(HazardType::HeavyRain, Severity::High),
                alert(HazardType::HighRainProbability, Severity::Medium),
            ],
            &pleasant(),
        );
        assert_eq!(actions.len(), 7);
        let sowing = actions.iter().find(|a| a.action == "Delay sowing and transplanting").unwrap();
        assert_eq!(sowing.priority, Priority::Medium);
        let rain_soon = actions
            .iter()
            .find(|a| a.action == "Delay sowing if rain expected within 2-3 days")
            .unwrap();
        assert_eq!(rain_soon.priority, Priority::High);
    }

    fn has_pest_watch(actions: &[FarmingAction]) -> bool {
        actions
            .iter()
            .any(|a| a.action == "Monitor for pest infestations in hot, dry conditions")
    }

    #[test]
    fn test_pest_watch_needs_hot_and_dry() {
        let synthesizer = ActionSynthesizer::default();
        let readings = |temperature: f64, humidity: f64| WeatherReadings {
            temperature: Some(temperature),
            humidity: Some(humidity),
            rainfall_mm: Some(0.0),
            ..Default::default()
        };

        let actions = synthesizer.synthesize(&[normal()], &readings(31.0, 39.0));
        assert_eq!(actions.len(), 1);
        assert!(has_pest_watch(&actions));
        assert_eq!(actions[0].priority, Priority::Medium);

        assert!(!has_pest_watch(&synthesizer.synthesize(&[normal()], &readings(30.0, 30.0))));
        assert!(!has_pest_watch(&synthesizer.synthesize(&[normal()], &readings(35.0, 40.0))));
        assert!(!has_pest_watch(&synthesizer.synthesize(
            &[normal()],
            &WeatherReadings {
                temperature: Some(35.0),
                ..Default::default()
            }
        )));
    }

    #[test]
    fn test_pest_watch_alongside_hazard_actions() {
        let hot_dry = WeatherReadings {
            temperature: Some(38.0),
            humidity: Some(25.0),
            ..Default::default()
        };
        let actions = ActionSynthesizer::default()
            .synthesize(&[alert(HazardType::HeatStress, Severity::High)], &hot_dry);
        assert_eq!(actions.len(), 4);
        assert!(has_pest_watch(&actions));
        assert_eq!(actions[3].action, "Monitor for pest infestations in hot, dry conditions");
    }

    #[test]
    fn test_ordered_by_priority() {
        let actions = ActionSynthesizer::default().synthesize(
            &[
                alert(HazardType::HighRainProbability, Severity::Medium),
                alert(HazardType::HighWind, Severity::High),
            ],
            &pleasant(),
        );
        let ranks: Vec<u8> = actions.iter().map(|a| a.priority.rank()).collect();
        let mut sorted = ranks.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(ranks, sorted);
        assert_eq!(actions[0].action, "Delay sowing if rain expected within 2-3 days");
        assert_eq!(actions[1].action, "Postpone pesticide spraying");
    }

    #[test]
    fn test_good_conditions_only_when_quiet_and_comfortable() {
        let synthesizer = ActionSynthesizer::default();

        let actions = synthesizer.synthesize(&[normal()], &pleasant());
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].action, "Good conditions for most farming activities");
        assert_eq!(actions[0].priority, Priority::Low);

        let hot = WeatherReadings {
            temperature: Some(33.0),
            ..pleasant()
        };
        assert!(synthesizer.synthesize(&[normal()], &hot).is_empty());

        let wet = WeatherReadings {
            rainfall_mm: Some(6.0),
            ..pleasant()
        };
        assert!(synthesizer.synthesize(&[normal()], &wet).is_empty());
        assert!(synthesizer.synthesize(&[], &pleasant()).is_empty());
        assert!(synthesizer
            .synthesize(&[normal()], &WeatherReadings::default())
            .is_empty());
    }

    #[test]
    fn test_invalid_comfort_range() {
        let config = ActionConfig {
            comfortable_min_temp: 30.0,
            comfortable_max_temp: 20.0,
            ..ActionConfig::default()
        };
        assert!(ActionSynthesizer::new(config).is_err());
    }
}
