use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::model::{AirQuality, City, Coordinates, TemperatureUnit, Weather};

use super::WeatherGateway;

const CURRENT_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
const AIR_QUALITY_URL: &str = "https://api.openweathermap.org/data/2.5/air_pollution";
const GEOCODING_URL: &str = "https://api.openweathermap.org/geo/1.0/direct";

const SEARCH_LIMIT: u8 = 5;

#[derive(Debug, Clone)]
pub struct OpenWeatherGateway {
    api_key: String,
    http: Client,
}

impl OpenWeatherGateway {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            http: Client::new(),
        }
    }

    async fn get_body(&self, url: &str, query: &[(&str, String)], what: &str) -> Result<String> {
        let res = self
            .http
            .get(url)
            .query(query)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await
            .with_context(|| format!("Failed to send request to OpenWeather ({what})"))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .with_context(|| format!("Failed to read OpenWeather {what} response body"))?;

        if !status.is_success() {
            return Err(anyhow!(
                "OpenWeather {} request failed with status {}: {}",
                what,
                status,
                truncate_body(&body),
            ));
        }

        Ok(body)
    }
}

#[async_trait]
impl WeatherGateway for OpenWeatherGateway {
    async fn current_by_city(&self, city: &str, unit: TemperatureUnit) -> Result<Weather> {
        let query = [
            ("q", city.to_owned()),
            ("units", unit.api_units().to_owned()),
        ];
        let body = self.get_body(CURRENT_URL, &query, "current weather").await?;
        decode_current(&body)
    }

    async fn current_by_coordinates(
        &self,
        coordinates: Coordinates,
        unit: TemperatureUnit,
    ) -> Result<Weather> {
        let query = [
            ("lat", coordinates.latitude.to_string()),
            ("lon", coordinates.longitude.to_string()),
            ("units", unit.api_units().to_owned()),
        ];
        let body = self.get_body(CURRENT_URL, &query, "current weather").await?;
        decode_current(&body)
    }

    async fn air_quality(&self, coordinates: Coordinates) -> Result<Option<AirQuality>> {
        let query = [
            ("lat", coordinates.latitude.to_string()),
            ("lon", coordinates.longitude.to_string()),
        ];
        let body = self.get_body(AIR_QUALITY_URL, &query, "air quality").await?;
        decode_air_quality(&body)
    }

    async fn search_cities(&self, query: &str) -> Result<Vec<City>> {
        let query = [
            ("q", query.to_owned()),
            ("limit", SEARCH_LIMIT.to_string()),
        ];
        let body = self.get_body(GEOCODING_URL, &query, "geocoding").await?;
        decode_cities(&body)
    }
}

#[derive(Debug, Deserialize)]
struct OwCoord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    temp_min: Option<f64>,
    temp_max: Option<f64>,
    humidity: u8,
    pressure: u32,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    coord: OwCoord,
    weather: Vec<OwWeather>,
    main: OwMain,
    wind: OwWind,
    dt: i64,
}

#[derive(Debug, Deserialize)]
struct OwAirIndex {
    aqi: u8,
}

#[derive(Debug, Deserialize)]
struct OwAirComponents {
    pm2_5: Option<f64>,
    pm10: Option<f64>,
    o3: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwAirEntry {
    main: OwAirIndex,
    components: OwAirComponents,
}

#[derive(Debug, Deserialize)]
struct OwAirResponse {
    list: Vec<OwAirEntry>,
}

#[derive(Debug, Deserialize)]
struct OwGeoEntry {
    name: String,
    country: Option<String>,
    lat: f64,
    lon: f64,
}

fn decode_current(body: &str) -> Result<Weather> {
    let parsed: OwCurrentResponse =
        serde_json::from_str(body).context("Failed to parse OpenWeather current JSON")?;

    let observed_at = unix_to_utc(parsed.dt).unwrap_or_else(Utc::now);

    let (description, icon_code) = parsed
        .weather
        .first()
        .map(|w| (w.description.clone(), w.icon.clone()))
        .unwrap_or_default();

    Ok(Weather {
        temperature: parsed.main.temp,
        feels_like: parsed.main.feels_like,
        temp_min: parsed.main.temp_min,
        temp_max: parsed.main.temp_max,
        description,
        icon_code,
        humidity_pct: parsed.main.humidity,
        pressure_hpa: parsed.main.pressure,
        wind_speed: parsed.wind.speed,
        observed_at,
        coordinates: Coordinates::new(parsed.coord.lat, parsed.coord.lon),
    })
}

fn decode_air_quality(body: &str) -> Result<Option<AirQuality>> {
    let parsed: OwAirResponse =
        serde_json::from_str(body).context("Failed to parse OpenWeather air quality JSON")?;

    // The service returns an empty list for locations it has no data for.
    Ok(parsed.list.into_iter().next().map(|entry| AirQuality {
        index: entry.main.aqi,
        pm2_5: entry.components.pm2_5,
        pm10: entry.components.pm10,
        ozone: entry.components.o3,
    }))
}

fn decode_cities(body: &str) -> Result<Vec<City>> {
    let parsed: Vec<OwGeoEntry> =
        serde_json::from_str(body).context("Failed to parse OpenWeather geocoding JSON")?;

    Ok(parsed
        .into_iter()
        .map(|entry| City {
            name: entry.name,
            country: entry.country,
            coordinates: Coordinates::new(entry.lat, entry.lon),
        })
        .collect())
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(ts, 0)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        format!("{}...", &body[..MAX])
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CURRENT_BODY: &str = r#"{
        "coord": {"lon": 14.4378, "lat": 50.0755},
        "weather": [{"id": 800, "main": "Clear", "description": "clear sky", "icon": "01d"}],
        "main": {"temp": 18.4, "feels_like": 17.8, "temp_min": 16.2, "temp_max": 20.1,
                 "pressure": 1012, "humidity": 58},
        "wind": {"speed": 3.4, "deg": 220},
        "dt": 1717160400,
        "name": "Prague"
    }"#;

    #[test]
    fn decode_current_maps_all_fields() {
        let weather = decode_current(CURRENT_BODY).expect("decode");

        assert_eq!(weather.temperature, 18.4);
        assert_eq!(weather.feels_like, 17.8);
        assert_eq!(weather.temp_min, Some(16.2));
        assert_eq!(weather.temp_max, Some(20.1));
        assert_eq!(weather.description, "clear sky");
        assert_eq!(weather.icon_code, "01d");
        assert_eq!(weather.humidity_pct, 58);
        assert_eq!(weather.pressure_hpa, 1012);
        assert_eq!(weather.wind_speed, 3.4);
        assert_eq!(weather.coordinates, Coordinates::new(50.0755, 14.4378));
        assert_eq!(weather.observed_at.timestamp(), 1_717_160_400);
    }

    #[test]
    fn decode_current_tolerates_missing_weather_entry() {
        let body = r#"{
            "coord": {"lon": 0.0, "lat": 0.0},
            "weather": [],
            "main": {"temp": 1.0, "feels_like": 1.0, "pressure": 1000, "humidity": 50},
            "wind": {"speed": 0.0},
            "dt": 0,
            "name": ""
        }"#;
        let weather = decode_current(body).expect("decode");
        assert_eq!(weather.description, "");
        assert_eq!(weather.temp_min, None);
    }

    #[test]
    fn decode_current_rejects_malformed_json() {
        let err = decode_current("{\"nope\": true}").unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn decode_air_quality_takes_first_entry() {
        let body = r#"{
            "coord": {"lon": 14.4378, "lat": 50.0755},
            "list": [{
                "main": {"aqi": 2},
                "components": {"co": 201.9, "no2": 0.8, "o3": 68.7, "pm2_5": 5.2, "pm10": 8.1}
            }]
        }"#;
        let air = decode_air_quality(body).expect("decode").expect("present");

        assert_eq!(air.index, 2);
        assert_eq!(air.pm2_5, Some(5.2));
        assert_eq!(air.pm10, Some(8.1));
        assert_eq!(air.ozone, Some(68.7));
    }

    #[test]
    fn decode_air_quality_empty_list_is_none() {
        let body = r#"{"coord": {"lon": 0.0, "lat": 0.0}, "list": []}"#;
        assert!(decode_air_quality(body).expect("decode").is_none());
    }

    #[test]
    fn decode_cities_maps_candidates() {
        let body = r#"[
            {"name": "Prague", "country": "CZ", "lat": 50.0755, "lon": 14.4378},
            {"name": "Prague", "country": "US", "lat": 35.4868, "lon": -96.6850}
        ]"#;
        let cities = decode_cities(body).expect("decode");

        assert_eq!(cities.len(), 2);
        assert_eq!(cities[0].title(), "Prague, CZ");
        assert_eq!(cities[1].coordinates.longitude, -96.685);
    }
}
