//! Interactive screens: configuration, current weather, city search,
//! favorites browsing, and unit settings.

use std::sync::Arc;

use anyhow::{Context, Result};
use inquire::{Confirm, Select, Text};
use tokio::sync::watch;

use smartweather_core::{
    Config, Coordinates, DisplayState, FavoriteCity, FavoritesStore, FixedLocationSource,
    SettingsStore, TemperatureUnit, WeatherCoordinator, WeatherGateway, gateway_from_config,
};

use crate::render::render_state;

pub fn configure() -> Result<()> {
    let mut config = Config::load()?;

    let api_key = Text::new("OpenWeather API key:").prompt()?;
    config.set_api_key(api_key.trim().to_string());

    let set_home = Confirm::new("Set a home location for `show --here`?")
        .with_default(false)
        .prompt()?;
    if set_home {
        let latitude: f64 = Text::new("Latitude:")
            .prompt()?
            .trim()
            .parse()
            .context("Latitude must be a number")?;
        let longitude: f64 = Text::new("Longitude:")
            .prompt()?
            .trim()
            .parse()
            .context("Longitude must be a number")?;
        config.set_home(Coordinates::new(latitude, longitude));
    }

    config.save()?;
    println!(
        "Configuration saved to {}",
        Config::config_file_path()?.display()
    );
    Ok(())
}

pub async fn show(city: Option<String>, coords: Option<(f64, f64)>, here: bool) -> Result<()> {
    let config = Config::load()?;
    let settings = SettingsStore::open()?;
    let coordinator = build_coordinator(&config, settings.unit())?;
    let mut rx = coordinator.subscribe();

    if here {
        coordinator.request_device_location();
    } else if let Some((latitude, longitude)) = coords {
        let coordinates = Coordinates::new(latitude, longitude);
        coordinator.request_by_coordinates(coordinates, &coordinates.to_string());
    } else if let Some(city) = city {
        coordinator.request_by_city(&city);
    } else {
        anyhow::bail!("Nothing to show. Pass a city name, --coords, or --here.");
    }

    let state = wait_for_outcome(&mut rx).await?;
    println!("{}", render_state(&state));
    Ok(())
}

pub async fn search(query: &str) -> Result<()> {
    let config = Config::load()?;
    let gateway = gateway_from_config(&config)?;

    let cities = gateway.search_cities(query).await?;
    if cities.is_empty() {
        println!("No cities matched '{query}'.");
        return Ok(());
    }

    let titles: Vec<String> = cities
        .iter()
        .map(|c| format!("{} ({})", c.title(), c.coordinates))
        .collect();
    let picked = Select::new("Pick a city:", titles.clone()).prompt()?;
    let index = titles.iter().position(|t| *t == picked).unwrap_or(0);
    let city = &cities[index];

    let action = Select::new("What next?", vec!["Show weather", "Add to favorites"]).prompt()?;
    match action {
        "Show weather" => {
            let settings = SettingsStore::open()?;
            let coordinator = build_coordinator(&config, settings.unit())?;
            let mut rx = coordinator.subscribe();
            coordinator.request_by_coordinates(city.coordinates, &city.title());
            let state = wait_for_outcome(&mut rx).await?;
            println!("{}", render_state(&state));
        }
        "Add to favorites" => {
            let favorites = FavoritesStore::open()?;
            if favorites.add(FavoriteCity::from(city))? {
                println!("Added {} to favorites.", city.title());
            } else {
                println!("{} is already a favorite.", city.title());
            }
        }
        _ => {}
    }
    Ok(())
}

const REMOVE_ITEM: &str = "[ remove a city ]";
const CLEAR_ITEM: &str = "[ clear all ]";
const TOGGLE_UNIT_ITEM: &str = "[ toggle °C/°F ]";
const BACK_ITEM: &str = "[ back ]";

pub async fn favorites() -> Result<()> {
    let config = Config::load()?;
    let settings = SettingsStore::open()?;
    let store = FavoritesStore::open()?;
    let coordinator = build_coordinator(&config, settings.unit())?;

    loop {
        let cities = store.list();
        if cities.is_empty() {
            println!("No favorite cities yet. Hint: `smartweather search <name>` can add one.");
            return Ok(());
        }

        let mut items: Vec<String> = cities.iter().map(FavoriteCity::title).collect();
        items.extend(
            [REMOVE_ITEM, CLEAR_ITEM, TOGGLE_UNIT_ITEM, BACK_ITEM]
                .iter()
                .map(|item| (*item).to_string()),
        );

        let picked = Select::new("Favorites:", items).prompt()?;
        match picked.as_str() {
            REMOVE_ITEM => {
                let titles: Vec<String> = cities.iter().map(FavoriteCity::title).collect();
                let victim = Select::new("Remove which city?", titles).prompt()?;
                if let Some(city) = cities.iter().find(|c| c.title() == victim) {
                    store.remove(&city.key())?;
                    coordinator.on_favorites_changed(&store.list());
                    println!("Removed {victim}.");
                }
            }
            CLEAR_ITEM => {
                let confirmed = Confirm::new("Remove all favorite cities?")
                    .with_default(false)
                    .prompt()?;
                if confirmed {
                    store.clear()?;
                    coordinator.on_favorites_changed(&store.list());
                }
            }
            TOGGLE_UNIT_ITEM => {
                let next = match settings.unit() {
                    TemperatureUnit::Celsius => TemperatureUnit::Fahrenheit,
                    TemperatureUnit::Fahrenheit => TemperatureUnit::Celsius,
                };
                settings.set_unit(next)?;
                coordinator.on_unit_changed(next);
                println!("Unit set to {next} ({}).", next.symbol());
            }
            BACK_ITEM => return Ok(()),
            title => {
                if let Some(city) = cities.iter().find(|c| c.title() == title) {
                    coordinator.show_favorite(city);
                    let mut rx = coordinator.subscribe();
                    let state = wait_for_outcome(&mut rx).await?;
                    println!("{}", render_state(&state));
                }
            }
        }
    }
}

pub fn unit(value: Option<String>) -> Result<()> {
    let settings = SettingsStore::open()?;
    match value {
        None => {
            let unit = settings.unit();
            println!("Current unit: {unit} ({}).", unit.symbol());
        }
        Some(value) => {
            let unit = TemperatureUnit::try_from(value.as_str())?;
            settings.set_unit(unit)?;
            println!("Unit set to {unit} ({}).", unit.symbol());
        }
    }
    Ok(())
}

fn build_coordinator(config: &Config, unit: TemperatureUnit) -> Result<WeatherCoordinator> {
    let gateway = gateway_from_config(config)?;
    let location = FixedLocationSource::new(config.home_coordinates());
    Ok(WeatherCoordinator::new(gateway, Arc::new(location), unit))
}

/// Wait until the current request settles into a loaded or error state.
async fn wait_for_outcome(rx: &mut watch::Receiver<DisplayState>) -> Result<DisplayState> {
    loop {
        {
            let state = rx.borrow_and_update();
            if state.error_message.is_some() || state.is_loaded() {
                return Ok((*state).clone());
            }
        }
        rx.changed()
            .await
            .context("weather coordinator went away")?;
    }
}
