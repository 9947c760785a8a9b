use crate::{
    Config,
    gateway::openweather::OpenWeatherGateway,
    model::{AirQuality, City, Coordinates, TemperatureUnit, Weather},
};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod openweather;

/// Abstraction over the remote weather service. The coordinator and the
/// screens only ever talk to this trait; the concrete client lives behind it.
#[async_trait]
pub trait WeatherGateway: Send + Sync + Debug {
    async fn current_by_city(&self, city: &str, unit: TemperatureUnit) -> anyhow::Result<Weather>;

    async fn current_by_coordinates(
        &self,
        coordinates: Coordinates,
        unit: TemperatureUnit,
    ) -> anyhow::Result<Weather>;

    /// `Ok(None)` when the service has no air quality data for the location.
    async fn air_quality(&self, coordinates: Coordinates) -> anyhow::Result<Option<AirQuality>>;

    async fn search_cities(&self, query: &str) -> anyhow::Result<Vec<City>>;
}

/// Construct the gateway from config.
pub fn gateway_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherGateway>> {
    let api_key = config.api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured.\n\
             Hint: run `smartweather configure` and enter your OpenWeather API key."
        )
    })?;

    Ok(Arc::new(OpenWeatherGateway::new(api_key.to_owned())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_from_config_errors_when_missing_api_key() {
        let cfg = Config::default();
        let err = gateway_from_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("No API key configured"));
    }

    #[test]
    fn gateway_from_config_works_when_configured() {
        let mut cfg = Config::default();
        cfg.set_api_key("KEY".to_string());

        let gateway = gateway_from_config(&cfg);
        assert!(gateway.is_ok());
    }
}
