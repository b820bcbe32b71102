//! Alerts, actions and cycle output

use crate::hazard::HazardType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Alert severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    /// No risk, conveys normal conditions
    Informational,
}

impl Severity {
    /// Ranking weight, higher is more severe
    pub fn rank(&self) -> u8 {
        match self {
            Severity::High => 3,
            Severity::Medium => 2,
            Severity::Low => 1,
            Severity::Informational => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Informational => "INFORMATIONAL",
        }
    }
}

/// Action priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// Ranking weight, higher is more urgent
    pub fn rank(&self) -> u8 {
        match self {
            Priority::High => 2,
            Priority::Medium => 1,
            Priority::Low => 0,
        }
    }
}

/// Alert type as reported to callers
///
/// Every hazard plus the synthetic normal-conditions marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertType {
    HeatStress,
    HeavyRain,
    HighWind,
    ColdStress,
    DrySpell,
    HighRainProbability,
    NormalConditions,
}

impl AlertType {
    /// The hazard behind this alert, `None` for normal conditions
    pub fn hazard(&self) -> Option<HazardType> {
        match self {
            AlertType::HeatStress => Some(HazardType::HeatStress),
            AlertType::HeavyRain => Some(HazardType::HeavyRain),
            AlertType::HighWind => Some(HazardType::HighWind),
            AlertType::ColdStress => Some(HazardType::ColdStress),
            AlertType::DrySpell => Some(HazardType::DrySpell),
            AlertType::HighRainProbability => Some(HazardType::HighRainProbability),
            AlertType::NormalConditions => None,
        }
    }

    /// Tie-break rank, lower is more important
    pub fn priority_rank(&self) -> u8 {
        self.hazard().map_or(u8::MAX, |h| h.priority_rank())
    }
}

impl From<HazardType> for AlertType {
    fn from(hazard: HazardType) -> Self {
        match hazard {
            HazardType::HeatStress => AlertType::HeatStress,
            HazardType::HeavyRain => AlertType::HeavyRain,
            HazardType::HighWind => AlertType::HighWind,
            HazardType::ColdStress => AlertType::ColdStress,
            HazardType::DrySpell => AlertType::DrySpell,
            HazardType::HighRainProbability => AlertType::HighRainProbability,
        }
    }
}

/// A risk alert for one subject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAlert {
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub severity: Severity,
    pub message: String,
    /// Confidence score (0.0 to 1.0)
    pub confidence: f64,
    pub triggered_at: DateTime<Utc>,
    /// Forecast day (1-based) on which a forecast-driven condition was met
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forecast_day: Option<u32>,
}

impl RiskAlert {
    /// Synthetic alert emitted when no risk survives resolution
    pub fn normal_conditions(at: DateTime<Utc>) -> Self {
        Self {
            alert_type: AlertType::NormalConditions,
            severity: Severity::Informational,
            message: "No significant weather risks. Conditions are normal.".to_string(),
            confidence: 1.0,
            triggered_at: at,
            forecast_day: None,
        }
    }

    pub fn hazard(&self) -> Option<HazardType> {
        self.alert_type.hazard()
    }
}

/// Recommended farming action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FarmingAction {
    pub action: String,
    pub reason: String,
    pub priority: Priority,
}

impl FarmingAction {
    pub fn new(action: &str, reason: &str, priority: Priority) -> Self {
        Self {
            action: action.to_string(),
            reason: reason.to_string(),
            priority,
        }
    }
}

/// Short templated description of the weather
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherSummary {
    pub temperature: String,
    pub condition: String,
    pub rainfall_outlook: String,
}

/// Result of one evaluation cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertOutput {
    pub weather_summary: WeatherSummary,
    pub risk_alerts: Vec<RiskAlert>,
    pub farming_actions: Vec<FarmingAction>,
    pub generated_at: DateTime<Utc>,
}
