use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Temperature unit preference. The OpenWeather API converts server-side,
/// so the unit also selects the `units` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn symbol(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
        }
    }

    /// Value of the `units` query parameter understood by the API.
    pub fn api_units(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "metric",
            TemperatureUnit::Fahrenheit => "imperial",
        }
    }

    /// Wind speed suffix matching what the API returns per unit system.
    pub fn wind_suffix(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "m/s",
            TemperatureUnit::Fahrenheit => "mph",
        }
    }

    /// Convert a Celsius value into this unit.
    pub fn from_celsius(&self, celsius: f64) -> f64 {
        match self {
            TemperatureUnit::Celsius => celsius,
            TemperatureUnit::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "celsius",
            TemperatureUnit::Fahrenheit => "fahrenheit",
        }
    }

    pub const fn all() -> &'static [TemperatureUnit] {
        &[TemperatureUnit::Celsius, TemperatureUnit::Fahrenheit]
    }
}

impl std::fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TemperatureUnit {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "celsius" | "c" | "metric" => Ok(TemperatureUnit::Celsius),
            "fahrenheit" | "f" | "imperial" => Ok(TemperatureUnit::Fahrenheit),
            _ => Err(anyhow::anyhow!(
                "Unknown unit '{value}'. Supported units: celsius, fahrenheit."
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// What the user last asked for. Kept around so a unit change can replay
/// the same request against the gateway.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationDescriptor {
    ByCityName(String),
    ByCoordinates {
        coordinates: Coordinates,
        label: String,
    },
    CurrentDevice,
}

/// Current conditions as returned by a successful gateway fetch.
/// Values are already in the unit system that was requested.
#[derive(Debug, Clone, PartialEq)]
pub struct Weather {
    pub temperature: f64,
    pub feels_like: f64,
    pub temp_min: Option<f64>,
    pub temp_max: Option<f64>,
    pub description: String,
    pub icon_code: String,
    pub humidity_pct: u8,
    pub pressure_hpa: u32,
    pub wind_speed: f64,
    pub observed_at: DateTime<Utc>,
    pub coordinates: Coordinates,
}

/// Air quality for a coordinate pair, on the OpenWeather 1..=5 scale.
/// Absence of data for a location is not an error.
#[derive(Debug, Clone, PartialEq)]
pub struct AirQuality {
    pub index: u8,
    pub pm2_5: Option<f64>,
    pub pm10: Option<f64>,
    pub ozone: Option<f64>,
}

/// A geocoding candidate from city search.
#[derive(Debug, Clone, PartialEq)]
pub struct City {
    pub name: String,
    pub country: Option<String>,
    pub coordinates: Coordinates,
}

impl City {
    pub fn title(&self) -> String {
        match &self.country {
            Some(country) => format!("{}, {}", self.name, country),
            None => self.name.clone(),
        }
    }
}

/// A city the user pinned. Identity is name + country + coordinates;
/// adding the same city twice collapses to one entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteCity {
    pub name: String,
    pub country: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

impl FavoriteCity {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }

    pub fn title(&self) -> String {
        match &self.country {
            Some(country) if !country.is_empty() => format!("{}, {}", self.name, country),
            _ => self.name.clone(),
        }
    }

    pub fn key(&self) -> CityKey {
        CityKey {
            name: self.name.clone(),
            country: self.country.clone(),
            lat_bits: self.latitude.to_bits(),
            lon_bits: self.longitude.to_bits(),
        }
    }
}

impl From<&City> for FavoriteCity {
    fn from(city: &City) -> Self {
        Self {
            name: city.name.clone(),
            country: city.country.clone(),
            latitude: city.coordinates.latitude,
            longitude: city.coordinates.longitude,
        }
    }
}

/// Composite identity of a favorite city, used as the cache key.
/// Structural equality over all four parts; coordinates are compared
/// bit-exact so the key is hashable without string joining.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CityKey {
    name: String,
    country: Option<String>,
    lat_bits: u64,
    lon_bits: u64,
}
