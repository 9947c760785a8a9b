//! Display-state reduction: pure transformation from a fetch outcome into
//! the strings a screen renders. No I/O, no shared state.

use chrono::Days;

use crate::model::{AirQuality, TemperatureUnit, Weather};

/// Placeholder forecast row, synthesized until the client consumes a real
/// forecast endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastEntry {
    pub day_label: String,
    pub min_text: String,
    pub max_text: String,
}

/// Everything a current-weather page renders. Exactly one of three modes
/// holds at a time: loading, error, or loaded; the all-`None` default is
/// "no data yet".
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DisplayState {
    pub is_loading: bool,
    pub error_message: Option<String>,
    pub city_label: Option<String>,
    pub temperature_text: Option<String>,
    pub feels_like_text: Option<String>,
    pub min_temp_text: Option<String>,
    pub max_temp_text: Option<String>,
    pub description: Option<String>,
    pub humidity_pct: Option<u8>,
    pub wind_speed_text: Option<String>,
    pub pressure_hpa: Option<u32>,
    pub air_quality_index: Option<u8>,
    pub air_quality_text: Option<String>,
    pub pm2_5: Option<f64>,
    pub pm10: Option<f64>,
    pub ozone: Option<f64>,
    pub forecast: Vec<ForecastEntry>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl DisplayState {
    pub fn loading() -> Self {
        Self {
            is_loading: true,
            ..Self::default()
        }
    }

    /// Error mode. Carries no stale numeric fields from earlier loads.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error_message: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn is_loaded(&self) -> bool {
        !self.is_loading && self.error_message.is_none() && self.temperature_text.is_some()
    }
}

/// Reduce a successful fetch into a display state. Idempotent: the same
/// snapshot and unit always produce the same strings.
pub fn loaded(
    city_label: &str,
    weather: &Weather,
    air: Option<&AirQuality>,
    unit: TemperatureUnit,
) -> DisplayState {
    DisplayState {
        is_loading: false,
        error_message: None,
        city_label: Some(city_label.to_owned()),
        temperature_text: Some(format_temperature(weather.temperature, unit)),
        feels_like_text: Some(format_temperature(weather.feels_like, unit)),
        min_temp_text: weather.temp_min.map(|t| format_temperature(t, unit)),
        max_temp_text: weather.temp_max.map(|t| format_temperature(t, unit)),
        description: Some(weather.description.clone()),
        humidity_pct: Some(weather.humidity_pct),
        wind_speed_text: Some(format!("{:.1} {}", weather.wind_speed, unit.wind_suffix())),
        pressure_hpa: Some(weather.pressure_hpa),
        air_quality_index: air.map(|a| a.index),
        air_quality_text: air.map(|a| aqi_label(a.index).to_owned()),
        pm2_5: air.and_then(|a| a.pm2_5),
        pm10: air.and_then(|a| a.pm10),
        ozone: air.and_then(|a| a.ozone),
        forecast: forecast_placeholder(weather, unit),
        latitude: Some(weather.coordinates.latitude),
        longitude: Some(weather.coordinates.longitude),
    }
}

/// Human label for the 1..=5 air quality index.
pub fn aqi_label(index: u8) -> &'static str {
    match index {
        1 => "Good",
        2 => "Fair",
        3 => "Moderate",
        4 => "Poor",
        5 => "Very poor",
        _ => "Unknown",
    }
}

/// Rounded to the nearest integer, then suffixed: 21.6°C becomes "22°C".
fn format_temperature(value: f64, unit: TemperatureUnit) -> String {
    format!("{}{}", value.round() as i64, unit.symbol())
}

/// Five synthetic rows derived from today's min/max, each subsequent day
/// offset by one more unit. Falls back to the current temperature when the
/// snapshot has no min/max.
fn forecast_placeholder(weather: &Weather, unit: TemperatureUnit) -> Vec<ForecastEntry> {
    let min = weather.temp_min.unwrap_or(weather.temperature);
    let max = weather.temp_max.unwrap_or(weather.temperature);
    let base_date = weather.observed_at.date_naive();

    (1..=5u64)
        .map(|day| {
            let date = base_date
                .checked_add_days(Days::new(day))
                .unwrap_or(base_date);
            ForecastEntry {
                day_label: date.format("%a").to_string(),
                min_text: format_temperature(min + day as f64, unit),
                max_text: format_temperature(max + day as f64, unit),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Coordinates;
    use chrono::{TimeZone, Utc};

    fn sample_weather() -> Weather {
        Weather {
            temperature: 21.6,
            feels_like: 20.3,
            temp_min: Some(16.2),
            temp_max: Some(20.1),
            description: "clear sky".to_string(),
            icon_code: "01d".to_string(),
            humidity_pct: 58,
            pressure_hpa: 1012,
            wind_speed: 3.42,
            // 2024-05-31, a Friday
            observed_at: Utc.with_ymd_and_hms(2024, 5, 31, 13, 0, 0).unwrap(),
            coordinates: Coordinates::new(50.0755, 14.4378),
        }
    }

    #[test]
    fn temperatures_round_to_nearest_integer() {
        let state = loaded("Prague, CZ", &sample_weather(), None, TemperatureUnit::Celsius);
        assert_eq!(state.temperature_text.as_deref(), Some("22°C"));
        assert_eq!(state.feels_like_text.as_deref(), Some("20°C"));
        assert_eq!(state.min_temp_text.as_deref(), Some("16°C"));
        assert_eq!(state.max_temp_text.as_deref(), Some("20°C"));
    }

    #[test]
    fn reduction_is_idempotent() {
        let weather = sample_weather();
        let first = loaded("Prague, CZ", &weather, None, TemperatureUnit::Celsius);
        let second = loaded("Prague, CZ", &weather, None, TemperatureUnit::Celsius);
        assert_eq!(first, second);
    }

    #[test]
    fn fahrenheit_formatting() {
        let mut weather = sample_weather();
        // What the API returns for 18.4°C with units=imperial.
        weather.temperature = 65.1;
        let state = loaded("Prague, CZ", &weather, None, TemperatureUnit::Fahrenheit);
        assert_eq!(state.temperature_text.as_deref(), Some("65°F"));
        assert_eq!(state.wind_speed_text.as_deref(), Some("3.4 mph"));
    }

    #[test]
    fn aqi_labels_follow_the_fixed_table() {
        assert_eq!(aqi_label(1), "Good");
        assert_eq!(aqi_label(2), "Fair");
        assert_eq!(aqi_label(3), "Moderate");
        assert_eq!(aqi_label(4), "Poor");
        assert_eq!(aqi_label(5), "Very poor");
        assert_eq!(aqi_label(7), "Unknown");
        assert_eq!(aqi_label(0), "Unknown");
    }

    #[test]
    fn air_quality_fields_absent_without_data() {
        let state = loaded("Prague, CZ", &sample_weather(), None, TemperatureUnit::Celsius);
        assert_eq!(state.air_quality_index, None);
        assert_eq!(state.air_quality_text, None);
        assert!(state.is_loaded());
    }

    #[test]
    fn air_quality_fields_present_with_data() {
        let air = AirQuality {
            index: 3,
            pm2_5: Some(5.2),
            pm10: Some(8.1),
            ozone: Some(68.7),
        };
        let state = loaded(
            "Prague, CZ",
            &sample_weather(),
            Some(&air),
            TemperatureUnit::Celsius,
        );
        assert_eq!(state.air_quality_index, Some(3));
        assert_eq!(state.air_quality_text.as_deref(), Some("Moderate"));
        assert_eq!(state.pm2_5, Some(5.2));
    }

    #[test]
    fn forecast_placeholder_offsets_by_day_index() {
        let state = loaded("Prague, CZ", &sample_weather(), None, TemperatureUnit::Celsius);
        assert_eq!(state.forecast.len(), 5);

        // Day 1: min 16.2 + 1 = 17.2 -> "17°C", max 20.1 + 1 = 21.1 -> "21°C".
        assert_eq!(state.forecast[0].min_text, "17°C");
        assert_eq!(state.forecast[0].max_text, "21°C");
        // Day 5: min 16.2 + 5 = 21.2 -> "21°C", max 20.1 + 5 = 25.1 -> "25°C".
        assert_eq!(state.forecast[4].min_text, "21°C");
        assert_eq!(state.forecast[4].max_text, "25°C");

        // Observed on a Friday; the placeholder starts the next day.
        assert_eq!(state.forecast[0].day_label, "Sat");
        assert_eq!(state.forecast[4].day_label, "Wed");
    }

    #[test]
    fn error_state_carries_no_numeric_fields() {
        let state = DisplayState::failed("boom");
        assert_eq!(state.error_message.as_deref(), Some("boom"));
        assert!(!state.is_loading);
        assert!(!state.is_loaded());
        assert_eq!(state.temperature_text, None);
        assert_eq!(state.humidity_pct, None);
        assert!(state.forecast.is_empty());
    }

    #[test]
    fn loading_state_is_exclusive() {
        let state = DisplayState::loading();
        assert!(state.is_loading);
        assert_eq!(state.error_message, None);
        assert!(!state.is_loaded());
    }
}
