//! Core library for the SmartWeather client.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The gateway to the remote weather service (current conditions, air
//!   quality, city geocoding)
//! - Local stores for the temperature unit and favorite cities
//! - The request coordinator, per-favorite display cache, and the pure
//!   display-state reducer behind the current-weather screen
//!
//! It is used by `smartweather-cli`, but can also be reused by other
//! front ends.

pub mod cache;
pub mod config;
pub mod coordinator;
pub mod display;
pub mod gateway;
pub mod location;
pub mod model;
pub mod store;

pub use cache::FavoriteStateCache;
pub use config::Config;
pub use coordinator::WeatherCoordinator;
pub use display::{DisplayState, ForecastEntry};
pub use gateway::{WeatherGateway, gateway_from_config};
pub use location::{FixedLocationSource, LocationError, LocationSource};
pub use model::{
    AirQuality, City, CityKey, Coordinates, FavoriteCity, LocationDescriptor, TemperatureUnit,
    Weather,
};
pub use store::{FavoritesStore, SettingsStore};
