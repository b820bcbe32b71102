//! Conflict resolution over raw alerts

use crate::season::{FeasibilityTable, SeasonContext};
use crate::AdvisoryConfigError;
use field_model::{AlertType, HazardType, RiskAlert, Severity};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{debug, info};

/// Resolver configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub feasibility: FeasibilityTable,
    /// Hazards that contradict each other; at most one of each pair survives
    pub exclusive_pairs: Vec<(HazardType, HazardType)>,
    /// Maximum High alerts kept
    pub max_high: usize,
    /// Maximum Medium alerts kept
    pub max_medium: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            feasibility: FeasibilityTable::default(),
            exclusive_pairs: vec![
                (HazardType::HeavyRain, HazardType::DrySpell),
                (HazardType::HighRainProbability, HazardType::DrySpell),
                (HazardType::HeatStress, HazardType::ColdStress),
            ],
            max_high: 1,
            max_medium: 1,
        }
    }
}

impl ResolverConfig {
    pub fn validate(&self) -> Result<(), AdvisoryConfigError> {
        match self.exclusive_pairs.iter().find(|(a, b)| a == b) {
            Some((hazard, _)) => Err(AdvisoryConfigError::IdenticalPair(*hazard)),
            None => Ok(()),
        }
    }
}

/// Output ranking: severity desc, confidence desc, hazard priority asc
fn rank(a: &RiskAlert, b: &RiskAlert) -> Ordering {
    b.severity
        .rank()
        .cmp(&a.severity.rank())
        .then_with(|| b.confidence.total_cmp(&a.confidence))
        .then_with(|| a.alert_type.priority_rank().cmp(&b.alert_type.priority_rank()))
}

/// Which member of an exclusive pair loses: lower confidence, then lower
/// severity, then later in priority order
fn loser(a: &RiskAlert, b: &RiskAlert) -> AlertType {
    let ordering = a
        .confidence
        .total_cmp(&b.confidence)
        .then_with(|| a.severity.rank().cmp(&b.severity.rank()))
        .then_with(|| b.alert_type.priority_rank().cmp(&a.alert_type.priority_rank()));
    if ordering == Ordering::Less {
        a.alert_type
    } else {
        b.alert_type
    }
}

/// Reduces raw alerts to a consistent, capped, non-empty set
///
/// Pure and deterministic; resolving an already resolved set returns it
/// unchanged.
pub struct ConflictResolver {
    config: ResolverConfig,
}

impl ConflictResolver {
    pub fn new(config: ResolverConfig) -> Result<Self, AdvisoryConfigError> {
        config.validate()?;
        info!("Creating conflict resolver with config: {:?}", config);
        Ok(Self { config })
    }

    pub fn resolve(&self, alerts: Vec<RiskAlert>, context: &SeasonContext) -> Vec<RiskAlert> {
        let feasible = self.filter_infeasible(alerts, context);
        let consistent = self.apply_exclusions(feasible);
        let mut resolved = self.apply_caps(consistent);

        if resolved.is_empty() {
            debug!("No alerts survived resolution, reporting normal conditions");
            resolved.push(RiskAlert::normal_conditions(context.evaluated_at));
        }
        resolved
    }

    fn filter_infeasible(&self, alerts: Vec<RiskAlert>, context: &SeasonContext) -> Vec<RiskAlert> {
        alerts
            .into_iter()
            .filter(|alert| match alert.hazard() {
                Some(hazard) if !self.config.feasibility.is_feasible(context.season, hazard) => {
                    debug!("Dropping {}: not plausible in {}", hazard, context.season.as_str());
                    false
                }
                _ => true,
            })
            .collect()
    }

    fn apply_exclusions(&self, mut alerts: Vec<RiskAlert>) -> Vec<RiskAlert> {
        for (first, second) in &self.config.exclusive_pairs {
            let strongest = |hazard: HazardType, alerts: &[RiskAlert]| {
                alerts
                    .iter()
                    .filter(|a| a.hazard() == Some(hazard))
                    .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
                    .cloned()
            };
            let (Some(a), Some(b)) = (strongest(*first, &alerts), strongest(*second, &alerts)) else {
                continue;
            };
            let dropped = loser(&a, &b);
            debug!("Dropping {:?}: {} and {} are exclusive", dropped, first, second);
            alerts.retain(|alert| alert.alert_type != dropped);
        }
        alerts
    }

    fn apply_caps(&self, mut alerts: Vec<RiskAlert>) -> Vec<RiskAlert> {
        alerts.sort_by(rank);
        let (mut high, mut medium) = (0, 0);
        alerts.retain(|alert| match alert.severity {
            Severity::High => {
                high += 1;
                high <= self.config.max_high
            }
            Severity::Medium => {
                medium += 1;
                medium <= self.config.max_medium
            }
            Severity::Low | Severity::Informational => false,
        });
        alerts
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }
}

impl Default for ConflictResolver {
    fn default() -> Self {
        Self {
            config: ResolverConfig::default(),
        }
    }
}
