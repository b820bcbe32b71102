//! Templated weather summary

use field_model::{ForecastDay, WeatherSnapshot, WeatherSummary};

const OUTLOOK_DAYS: usize = 3;

fn temperature_text(snapshot: &WeatherSnapshot) -> String {
    let readings = &snapshot.readings;
    let Some(t) = readings.temperature.or(readings.max_temperature) else {
        return "Temperature data unavailable".to_string();
    };
    match t {
        t if t >= 40.0 => format!("Very hot ({:.1}°C) - dangerous heat levels", t),
        t if t >= 35.0 => format!("Hot ({:.1}°C) - heat stress conditions", t),
        t if t >= 25.0 => format!("Warm ({:.1}°C) - good for most crops", t),
        t if t >= 15.0 => format!("Mild ({:.1}°C) - comfortable conditions", t),
        t if t >= 5.0 => format!("Cool ({:.1}°C) - some crops may struggle", t),
        t => format!("Very cold ({:.1}°C) - frost risk", t),
    }
}

fn condition_text(snapshot: &WeatherSnapshot) -> String {
    let probability = snapshot.readings.rainfall_probability.unwrap_or(0.0);
    if probability > 0.7 {
        return format!("Rain very likely ({:.0}% chance)", probability * 100.0);
    }
    if probability > 0.4 {
        return format!("Rain possible ({:.0}% chance)", probability * 100.0);
    }

    let keyword = snapshot.condition.trim().to_lowercase();
    match keyword.as_str() {
        "" => "Conditions unknown".to_string(),
        "clear" => "Clear skies".to_string(),
        "clouds" | "cloudy" => "Cloudy".to_string(),
        "rain" | "drizzle" => "Rainy".to_string(),
        "thunderstorm" => "Thunderstorms".to_string(),
        other => {
            let mut chars = other.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        }
    }
}

fn rainfall_outlook(forecast: &[ForecastDay]) -> String {
    if forecast.is_empty() {
        return "No forecast data available".to_string();
    }
    let total: f64 = forecast
        .iter()
        .take(OUTLOOK_DAYS)
        .filter_map(|day| day.readings.rainfall_mm)
        .sum();
    let text = if total > 15.0 {
        "Heavy rainfall expected in next few days"
    } else if total > 5.0 {
        "Moderate rainfall expected"
    } else if total > 0.0 {
        "Light rainfall possible"
    } else {
        "Dry conditions expected"
    };
    text.to_string()
}

/// Summarize current conditions and the near-term rain outlook
pub fn summarize(current: &WeatherSnapshot, forecast: &[ForecastDay]) -> WeatherSummary {
    WeatherSummary {
        temperature: temperature_text(current),
        condition: condition_text(current),
        rainfall_outlook: rainfall_outlook(forecast),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use field_model::WeatherReadings;

    fn snapshot(temperature: f64, probability: f64, condition: &str) -> WeatherSnapshot {
        let mut snapshot = WeatherSnapshot::new(
            WeatherReadings {
                temperature: Some(temperature),
                rainfall_probability: Some(probability),
                ..Default::default()
            },
            Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap(),
        );
        snapshot.condition = condition.to_string();
        snapshot
    }

    fn day(offset: u32, rain: f64) -> ForecastDay {
        ForecastDay::new(
            NaiveDate::from_ymd_opt(2026, 3, 3 + offset).unwrap(),
            WeatherReadings {
                rainfall_mm: Some(rain),
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_temperature_bands() {
        assert_eq!(temperature_text(&snapshot(41.0, 0.0, "")), "Very hot (41.0°C) - dangerous heat levels");
        assert_eq!(temperature_text(&snapshot(35.0, 0.0, "")), "Hot (35.0°C) - heat stress conditions");
        assert_eq!(temperature_text(&snapshot(26.4, 0.0, "")), "Warm (26.4°C) - good for most crops");
        assert_eq!(temperature_text(&snapshot(3.0, 0.0, "")), "Very cold (3.0°C) - frost risk");

        let empty = WeatherSnapshot::new(WeatherReadings::default(), Utc::now());
        assert_eq!(temperature_text(&empty), "Temperature data unavailable");
    }

    #[test]
    fn test_condition_text() {
        assert_eq!(condition_text(&snapshot(25.0, 0.85, "clear")), "Rain very likely (85% chance)");
        assert_eq!(condition_text(&snapshot(25.0, 0.5, "clear")), "Rain possible (50% chance)");
        assert_eq!(condition_text(&snapshot(25.0, 0.1, "Clouds")), "Cloudy");
        assert_eq!(condition_text(&snapshot(25.0, 0.1, "haze")), "Haze");
        assert_eq!(condition_text(&snapshot(25.0, 0.1, "")), "Conditions unknown");
    }

    #[test]
    fn test_rainfall_outlook() {
        assert_eq!(rainfall_outlook(&[]), "No forecast data available");
        assert_eq!(
            rainfall_outlook(&[day(0, 10.0), day(1, 6.0), day(2, 0.0), day(3, 50.0)]),
            "Heavy rainfall expected in next few days"
        );
        assert_eq!(rainfall_outlook(&[day(0, 3.0), day(1, 3.0)]), "Moderate rainfall expected");
        assert_eq!(rainfall_outlook(&[day(0, 0.5)]), "Light rainfall possible");
        assert_eq!(rainfall_outlook(&[day(0, 0.0), day(1, 0.0), day(2, 0.0), day(3, 30.0)]), "Dry conditions expected");
    }
}
