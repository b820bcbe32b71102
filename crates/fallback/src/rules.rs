//! Threshold strategies, ordered from most to least specific

use field_model::{HealthStatus, PerThreshold, Situation};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Thresholds proposed by a strategy, before safety clamping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    /// Proposed value per kind; `None` keeps the base value
    pub values: PerThreshold<Option<f64>>,
    /// Fixed confidence of the proposing strategy
    pub confidence: f64,
}

impl Proposal {
    /// Proposal covering every kind
    pub fn full(heat: f64, rain: f64, wind: f64, cold: f64, dry_days: f64, confidence: f64) -> Self {
        Self {
            values: PerThreshold {
                heat_stress_temp: Some(heat),
                heavy_rain_mm: Some(rain),
                high_wind_kmh: Some(wind),
                cold_stress_temp: Some(cold),
                dry_spell_days: Some(dry_days),
            },
            confidence,
        }
    }
}

/// A rule that may propose thresholds for a situation
pub trait ThresholdStrategy: Send + Sync {
    fn name(&self) -> &str;

    /// `None` when the strategy does not apply
    fn propose(&self, situation: &Situation) -> Option<Proposal>;
}

/// Thresholds for a specific crop in specific stages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CropProfileStrategy {
    pub crop: String,
    pub stages: Vec<String>,
    /// Growth-monitor tags that disqualify the profile
    #[serde(default)]
    pub excluded_alerts: Vec<String>,
    pub proposal: Proposal,
}

impl CropProfileStrategy {
    /// Healthy cotton in vegetative growth tolerates more
    pub fn cotton_vegetative() -> Self {
        Self {
            crop: "cotton".to_string(),
            stages: vec!["vegetative".to_string()],
            excluded_alerts: vec!["SLOW_GROWTH".to_string()],
            proposal: Proposal::full(37.0, 25.0, 18.0, 8.0, 7.0, 0.82),
        }
    }

    /// Young wheat
    pub fn wheat_early() -> Self {
        Self {
            crop: "wheat".to_string(),
            stages: vec!["seedling".to_string(), "tillering".to_string()],
            excluded_alerts: Vec::new(),
            proposal: Proposal::full(35.0, 20.0, 16.0, 6.0, 5.0, 0.78),
        }
    }
}

impl ThresholdStrategy for CropProfileStrategy {
    fn name(&self) -> &str {
        &self.crop
    }

    fn propose(&self, situation: &Situation) -> Option<Proposal> {
        let crop = situation.crop_name()?;
        let stage = situation.growth_stage()?;
        let matches = crop.eq_ignore_ascii_case(&self.crop)
            && self.stages.iter().any(|s| s.eq_ignore_ascii_case(stage))
            && situation.health_status == HealthStatus::Normal
            && !self.excluded_alerts.iter().any(|tag| situation.has_growth_alert(tag));
        matches.then(|| self.proposal.clone())
    }
}

/// Earlier alerts for crops that are already stressed
#[derive(Debug, Clone)]
pub struct HealthStrategy {
    proposal: Proposal,
}

impl Default for HealthStrategy {
    fn default() -> Self {
        Self {
            proposal: Proposal::full(34.0, 18.0, 14.0, 8.0, 4.0, 0.75),
        }
    }
}

impl ThresholdStrategy for HealthStrategy {
    fn name(&self) -> &str {
        "stressed_crop"
    }

    fn propose(&self, situation: &Situation) -> Option<Proposal> {
        situation.health_status.is_stressed().then(|| self.proposal.clone())
    }
}

/// Catch-all, always applies
#[derive(Debug, Clone)]
pub struct DefaultStrategy {
    proposal: Proposal,
}

impl Default for DefaultStrategy {
    fn default() -> Self {
        Self {
            proposal: Proposal::full(36.0, 22.0, 17.0, 7.0, 6.0, 0.65),
        }
    }
}

impl ThresholdStrategy for DefaultStrategy {
    fn name(&self) -> &str {
        "default"
    }

    fn propose(&self, _situation: &Situation) -> Option<Proposal> {
        Some(self.proposal.clone())
    }
}

/// Ordered strategy list; the first strategy that applies wins
pub struct FallbackEngine {
    strategies: Vec<Box<dyn ThresholdStrategy>>,
}

impl FallbackEngine {
    /// Create an engine from an ordered strategy list
    pub fn new(strategies: Vec<Box<dyn ThresholdStrategy>>) -> Self {
        info!("Creating fallback engine with {} strategies", strategies.len());
        Self { strategies }
    }

    /// Built-in strategies, most specific first
    pub fn default_strategies() -> Vec<Box<dyn ThresholdStrategy>> {
        vec![
            Box::new(CropProfileStrategy::cotton_vegetative()),
            Box::new(CropProfileStrategy::wheat_early()),
            Box::new(HealthStrategy::default()),
            Box::new(DefaultStrategy::default()),
        ]
    }

    /// Walk the strategies in order
    ///
    /// Returns the matching strategy's name with its proposal.
    pub fn propose(&self, situation: &Situation) -> Option<(&str, Proposal)> {
        for strategy in &self.strategies {
            if let Some(proposal) = strategy.propose(situation) {
                debug!("Strategy {} matched (confidence={:.2})", strategy.name(), proposal.confidence);
                return Some((strategy.name(), proposal));
            }
        }
        None
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl Default for FallbackEngine {
    fn default() -> Self {
        Self::new(Self::default_strategies())
    }
}
