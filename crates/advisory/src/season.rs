//! Agricultural seasons and hazard feasibility

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use field_model::{HazardType, Situation};
use serde::{Deserialize, Serialize};

/// Agricultural season
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    Winter,
    Summer,
    Monsoon,
    PostMonsoon,
}

impl Season {
    /// Season for a calendar month (1-12) at a latitude
    ///
    /// Northern calendar: Dec-Feb winter, Mar-May summer, Jun-Sep monsoon,
    /// Oct-Nov post-monsoon. South of the equator the calendar is shifted by
    /// six months.
    pub fn from_month(month: u32, latitude: f64) -> Self {
        let month = if latitude < 0.0 {
            (month + 5) % 12 + 1
        } else {
            month
        };
        match month {
            3..=5 => Season::Summer,
            6..=9 => Season::Monsoon,
            10 | 11 => Season::PostMonsoon,
            _ => Season::Winter,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Winter => "winter",
            Season::Summer => "summer",
            Season::Monsoon => "monsoon",
            Season::PostMonsoon => "post_monsoon",
        }
    }
}

/// Hazards that cannot plausibly occur in each season
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeasibilityTable {
    pub winter: Vec<HazardType>,
    pub summer: Vec<HazardType>,
    pub monsoon: Vec<HazardType>,
    pub post_monsoon: Vec<HazardType>,
}

impl Default for FeasibilityTable {
    fn default() -> Self {
        Self {
            winter: vec![HazardType::HeatStress],
            summer: vec![HazardType::ColdStress],
            monsoon: vec![
                HazardType::DrySpell,
                HazardType::HeatStress,
                HazardType::ColdStress,
            ],
            post_monsoon: Vec::new(),
        }
    }
}

impl FeasibilityTable {
    pub fn infeasible(&self, season: Season) -> &[HazardType] {
        match season {
            Season::Winter => &self.winter,
            Season::Summer => &self.summer,
            Season::Monsoon => &self.monsoon,
            Season::PostMonsoon => &self.post_monsoon,
        }
    }

    pub fn is_feasible(&self, season: Season, hazard: HazardType) -> bool {
        !self.infeasible(season).contains(&hazard)
    }
}

/// Seasonal context of one evaluation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeasonContext {
    pub season: Season,
    /// Timestamp given to a synthesized normal-conditions alert
    pub evaluated_at: DateTime<Utc>,
}

impl SeasonContext {
    pub fn new(date: NaiveDate, latitude: f64, evaluated_at: DateTime<Utc>) -> Self {
        Self {
            season: Season::from_month(date.month(), latitude),
            evaluated_at,
        }
    }

    pub fn for_situation(situation: &Situation, evaluated_at: DateTime<Utc>) -> Self {
        Self::new(
            situation.evaluation_date,
            situation.location.latitude,
            evaluated_at,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_northern_calendar() {
        assert_eq!(Season::from_month(1, 20.0), Season::Winter);
        assert_eq!(Season::from_month(12, 20.0), Season::Winter);
        assert_eq!(Season::from_month(4, 20.0), Season::Summer);
        assert_eq!(Season::from_month(7, 20.0), Season::Monsoon);
        assert_eq!(Season::from_month(9, 20.0), Season::Monsoon);
        assert_eq!(Season::from_month(11, 20.0), Season::PostMonsoon);
    }

    #[test]
    fn test_southern_shift() {
        // January south of the equator maps to July
        assert_eq!(Season::from_month(1, -33.9), Season::Monsoon);
        assert_eq!(Season::from_month(7, -33.9), Season::Winter);
        assert_eq!(Season::from_month(10, -33.9), Season::Summer);
        assert_eq!(Season::from_month(5, -33.9), Season::PostMonsoon);
    }

    #[test]
    fn test_default_table() {
        let table = FeasibilityTable::default();
        assert!(!table.is_feasible(Season::Winter, HazardType::HeatStress));
        assert!(table.is_feasible(Season::Winter, HazardType::HeavyRain));
        assert!(!table.is_feasible(Season::Monsoon, HazardType::DrySpell));
        assert!(HazardType::ALL
            .iter()
            .all(|h| table.is_feasible(Season::PostMonsoon, *h)));
    }
}
