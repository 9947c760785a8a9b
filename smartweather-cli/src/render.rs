//! Rendering of a display state into terminal text.

use smartweather_core::DisplayState;

pub fn render_state(state: &DisplayState) -> String {
    if state.is_loading {
        return "Loading...".to_string();
    }
    if let Some(message) = &state.error_message {
        return format!("Error: {message}");
    }
    if !state.is_loaded() {
        return "No weather data loaded yet.".to_string();
    }

    let mut lines = Vec::new();

    let mut headline = state.city_label.clone().unwrap_or_default();
    if let Some(temp) = &state.temperature_text {
        headline.push_str(&format!("  {temp}"));
    }
    if let Some(description) = &state.description
        && !description.is_empty()
    {
        headline.push_str(&format!("  {description}"));
    }
    lines.push(headline);

    let mut details = Vec::new();
    if let Some(feels) = &state.feels_like_text {
        details.push(format!("feels like {feels}"));
    }
    if let (Some(min), Some(max)) = (&state.min_temp_text, &state.max_temp_text) {
        details.push(format!("min {min} / max {max}"));
    }
    if !details.is_empty() {
        lines.push(details.join("   "));
    }

    let mut conditions = Vec::new();
    if let Some(humidity) = state.humidity_pct {
        conditions.push(format!("humidity {humidity}%"));
    }
    if let Some(wind) = &state.wind_speed_text {
        conditions.push(format!("wind {wind}"));
    }
    if let Some(pressure) = state.pressure_hpa {
        conditions.push(format!("pressure {pressure} hPa"));
    }
    if !conditions.is_empty() {
        lines.push(conditions.join("   "));
    }

    if let (Some(label), Some(index)) = (&state.air_quality_text, state.air_quality_index) {
        let mut air = format!("air quality: {label} ({index})");
        if let Some(pm2_5) = state.pm2_5 {
            air.push_str(&format!("   pm2.5 {pm2_5:.1}"));
        }
        if let Some(pm10) = state.pm10 {
            air.push_str(&format!("   pm10 {pm10:.1}"));
        }
        if let Some(ozone) = state.ozone {
            air.push_str(&format!("   o3 {ozone:.1}"));
        }
        lines.push(air);
    }

    if !state.forecast.is_empty() {
        lines.push("forecast:".to_string());
        for entry in &state.forecast {
            lines.push(format!(
                "  {}  {} / {}",
                entry.day_label, entry.min_text, entry.max_text
            ));
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use smartweather_core::ForecastEntry;

    #[test]
    fn loading_and_error_modes() {
        let loading = DisplayState {
            is_loading: true,
            ..DisplayState::default()
        };
        assert_eq!(render_state(&loading), "Loading...");

        let failed = DisplayState {
            error_message: Some("boom".to_string()),
            ..DisplayState::default()
        };
        assert_eq!(render_state(&failed), "Error: boom");

        assert_eq!(
            render_state(&DisplayState::default()),
            "No weather data loaded yet."
        );
    }

    #[test]
    fn loaded_state_renders_all_sections() {
        let state = DisplayState {
            city_label: Some("Prague, CZ".to_string()),
            temperature_text: Some("18°C".to_string()),
            feels_like_text: Some("17°C".to_string()),
            min_temp_text: Some("16°C".to_string()),
            max_temp_text: Some("20°C".to_string()),
            description: Some("clear sky".to_string()),
            humidity_pct: Some(58),
            wind_speed_text: Some("3.4 m/s".to_string()),
            pressure_hpa: Some(1012),
            air_quality_index: Some(1),
            air_quality_text: Some("Good".to_string()),
            pm2_5: Some(5.2),
            forecast: vec![ForecastEntry {
                day_label: "Sat".to_string(),
                min_text: "17°C".to_string(),
                max_text: "21°C".to_string(),
            }],
            ..DisplayState::default()
        };

        let text = render_state(&state);
        assert!(text.starts_with("Prague, CZ  18°C  clear sky"));
        assert!(text.contains("feels like 17°C"));
        assert!(text.contains("min 16°C / max 20°C"));
        assert!(text.contains("humidity 58%"));
        assert!(text.contains("air quality: Good (1)"));
        assert!(text.contains("pm2.5 5.2"));
        assert!(text.contains("  Sat  17°C / 21°C"));
    }
}
