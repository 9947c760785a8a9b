//! Local persistence for settings and favorites.
//!
//! Both stores keep their current value in memory behind a
//! `tokio::sync::watch` channel so screens can observe changes, and write
//! a TOML file under the platform config directory on every mutation.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tokio::sync::watch;

use crate::config::project_dirs;
use crate::model::{CityKey, FavoriteCity, TemperatureUnit};

fn store_file_path(file_name: &str) -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join(file_name))
}

fn read_toml<T: Default + for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }

    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read store file: {}", path.display()))?;

    toml::from_str(&contents)
        .with_context(|| format!("Failed to parse store file: {}", path.display()))
}

fn write_toml<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create store directory: {}", parent.display()))?;
    }

    let toml = toml::to_string_pretty(value).context("Failed to serialize store to TOML")?;

    fs::write(path, toml)
        .with_context(|| format!("Failed to write store file: {}", path.display()))
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct SettingsFile {
    unit: TemperatureUnit,
}

/// Persisted temperature unit, observable through a watch channel.
#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    tx: watch::Sender<TemperatureUnit>,
}

impl SettingsStore {
    pub fn open() -> Result<Self> {
        Self::open_at(store_file_path("settings.toml")?)
    }

    pub fn open_at(path: PathBuf) -> Result<Self> {
        let file: SettingsFile = read_toml(&path)?;
        let (tx, _) = watch::channel(file.unit);
        Ok(Self { path, tx })
    }

    pub fn unit(&self) -> TemperatureUnit {
        *self.tx.borrow()
    }

    pub fn set_unit(&self, unit: TemperatureUnit) -> Result<()> {
        if self.unit() == unit {
            return Ok(());
        }
        write_toml(&self.path, &SettingsFile { unit })?;
        self.tx.send_replace(unit);
        Ok(())
    }

    pub fn subscribe(&self) -> watch::Receiver<TemperatureUnit> {
        self.tx.subscribe()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct FavoritesFile {
    cities: Vec<FavoriteCity>,
}

/// Persisted ordered list of favorite cities, observable through a watch
/// channel. Adding is idempotent by city key.
#[derive(Debug)]
pub struct FavoritesStore {
    path: PathBuf,
    tx: watch::Sender<Vec<FavoriteCity>>,
}

impl FavoritesStore {
    pub fn open() -> Result<Self> {
        Self::open_at(store_file_path("favorites.toml")?)
    }

    pub fn open_at(path: PathBuf) -> Result<Self> {
        let file: FavoritesFile = read_toml(&path)?;
        let (tx, _) = watch::channel(file.cities);
        Ok(Self { path, tx })
    }

    pub fn list(&self) -> Vec<FavoriteCity> {
        self.tx.borrow().clone()
    }

    /// Returns `false` when a favorite with the same key already exists.
    pub fn add(&self, city: FavoriteCity) -> Result<bool> {
        let mut cities = self.list();
        let key = city.key();
        if cities.iter().any(|c| c.key() == key) {
            return Ok(false);
        }
        cities.push(city);
        self.persist(cities)?;
        Ok(true)
    }

    /// Returns `false` when no favorite matched the key.
    pub fn remove(&self, key: &CityKey) -> Result<bool> {
        let mut cities = self.list();
        let before = cities.len();
        cities.retain(|c| c.key() != *key);
        if cities.len() == before {
            return Ok(false);
        }
        self.persist(cities)?;
        Ok(true)
    }

    pub fn clear(&self) -> Result<()> {
        self.persist(Vec::new())
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<FavoriteCity>> {
        self.tx.subscribe()
    }

    fn persist(&self, cities: Vec<FavoriteCity>) -> Result<()> {
        write_toml(
            &self.path,
            &FavoritesFile {
                cities: cities.clone(),
            },
        )?;
        self.tx.send_replace(cities);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn favorite(name: &str, lat: f64, lon: f64) -> FavoriteCity {
        FavoriteCity {
            name: name.to_string(),
            country: Some("CZ".to_string()),
            latitude: lat,
            longitude: lon,
        }
    }

    #[test]
    fn settings_default_to_celsius() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SettingsStore::open_at(dir.path().join("settings.toml")).expect("open");
        assert_eq!(store.unit(), TemperatureUnit::Celsius);
    }

    #[test]
    fn settings_survive_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.toml");

        let store = SettingsStore::open_at(path.clone()).expect("open");
        store.set_unit(TemperatureUnit::Fahrenheit).expect("set");

        let reopened = SettingsStore::open_at(path).expect("reopen");
        assert_eq!(reopened.unit(), TemperatureUnit::Fahrenheit);
    }

    #[test]
    fn settings_notify_subscribers() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SettingsStore::open_at(dir.path().join("settings.toml")).expect("open");
        let rx = store.subscribe();

        store.set_unit(TemperatureUnit::Fahrenheit).expect("set");
        assert_eq!(*rx.borrow(), TemperatureUnit::Fahrenheit);
    }

    #[test]
    fn add_is_idempotent_by_key() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FavoritesStore::open_at(dir.path().join("favorites.toml")).expect("open");

        assert!(store.add(favorite("Prague", 50.0755, 14.4378)).expect("add"));
        assert!(!store.add(favorite("Prague", 50.0755, 14.4378)).expect("add"));
        assert_eq!(store.list().len(), 1);
    }

    #[test]
    fn remove_and_clear() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FavoritesStore::open_at(dir.path().join("favorites.toml")).expect("open");

        let prague = favorite("Prague", 50.0755, 14.4378);
        let brno = favorite("Brno", 49.1951, 16.6068);
        store.add(prague.clone()).expect("add");
        store.add(brno.clone()).expect("add");

        assert!(store.remove(&prague.key()).expect("remove"));
        assert!(!store.remove(&prague.key()).expect("remove again"));
        assert_eq!(store.list(), vec![brno]);

        store.clear().expect("clear");
        assert!(store.list().is_empty());
    }

    #[test]
    fn favorites_survive_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("favorites.toml");

        let store = FavoritesStore::open_at(path.clone()).expect("open");
        store.add(favorite("Zlin", 49.2265, 17.6708)).expect("add");

        let reopened = FavoritesStore::open_at(path).expect("reopen");
        assert_eq!(reopened.list().len(), 1);
        assert_eq!(reopened.list()[0].name, "Zlin");
    }
}
