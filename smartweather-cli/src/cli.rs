use clap::{Parser, Subcommand};

use crate::screens;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "smartweather", version, about = "SmartWeather CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key and an optional home location.
    Configure,

    /// Show current conditions for a city, coordinates, or your location.
    Show {
        /// City name, e.g. "Prague".
        city: Option<String>,

        /// Explicit coordinates instead of a city name.
        #[arg(long, num_args = 2, value_names = ["LAT", "LON"], allow_negative_numbers = true)]
        coords: Option<Vec<f64>>,

        /// Use the configured home location.
        #[arg(long)]
        here: bool,
    },

    /// Search for cities and optionally pin one as a favorite.
    Search {
        /// City name or prefix to look up.
        query: String,
    },

    /// Browse, page through, and manage favorite cities.
    Favorites,

    /// Show or change the temperature unit.
    Unit {
        /// "celsius" or "fahrenheit"; omit to print the current unit.
        unit: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => screens::configure(),
            Command::Show { city, coords, here } => {
                let coords = match coords {
                    Some(values) if values.len() == 2 => Some((values[0], values[1])),
                    Some(_) => anyhow::bail!("--coords expects exactly LAT LON"),
                    None => None,
                };
                screens::show(city, coords, here).await
            }
            Command::Search { query } => screens::search(&query).await,
            Command::Favorites => screens::favorites().await,
            Command::Unit { unit } => screens::unit(unit),
        }
    }
}
