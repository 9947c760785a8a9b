use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::model::Coordinates;

/// A fixed coordinate pair standing in for device location.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HomeLocation {
    pub latitude: f64,
    pub longitude: f64,
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// OpenWeather API key.
    pub api_key: Option<String>,

    /// Example TOML:
    /// [home]
    /// latitude = 49.2265
    /// longitude = 17.6708
    pub home: Option<HomeLocation>,
}

impl Config {
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    pub fn home_coordinates(&self) -> Option<Coordinates> {
        self.home
            .map(|h| Coordinates::new(h.latitude, h.longitude))
    }

    pub fn set_home(&mut self, coordinates: Coordinates) {
        self.home = Some(HomeLocation {
            latitude: coordinates.latitude,
            longitude: coordinates.longitude,
        });
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }
}

/// Platform directories shared by the config file and the local stores.
pub(crate) fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("dev", "smartweather", "smartweather")
        .ok_or_else(|| anyhow!("Could not determine platform config directory"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_has_no_key() {
        let cfg = Config::default();
        assert!(cfg.api_key().is_none());
        assert!(cfg.home_coordinates().is_none());
    }

    #[test]
    fn set_api_key_and_home() {
        let mut cfg = Config::default();
        cfg.set_api_key("KEY".into());
        cfg.set_home(Coordinates::new(49.2265, 17.6708));

        assert_eq!(cfg.api_key(), Some("KEY"));
        let home = cfg.home_coordinates().expect("home must be set");
        assert_eq!(home.latitude, 49.2265);
        assert_eq!(home.longitude, 17.6708);
    }

    #[test]
    fn toml_roundtrip() {
        let mut cfg = Config::default();
        cfg.set_api_key("KEY".into());
        cfg.set_home(Coordinates::new(50.0755, 14.4378));

        let text = toml::to_string_pretty(&cfg).expect("serialize");
        let parsed: Config = toml::from_str(&text).expect("parse");

        assert_eq!(parsed.api_key(), Some("KEY"));
        assert_eq!(
            parsed.home_coordinates(),
            Some(Coordinates::new(50.0755, 14.4378))
        );
    }
}
