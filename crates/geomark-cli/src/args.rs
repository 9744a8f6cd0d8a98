use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for geomark
#[derive(Debug, Parser)]
#[command(
    name = "geomark",
    version,
    about = "Drive the geomark-core map interaction engine from the terminal"
)]
pub struct CliArgs {
    /// Path to a JSON config file (default: built-in defaults plus GEOMARK_API_KEY)
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Use a custom place list (JSON) for the offline gazetteer
    #[arg(short = 'p', long = "places", global = true)]
    pub places: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long = "json", global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Autocomplete a prefix, biased toward the configured region
    Suggest {
        /// Text typed so far (e.g. "Bost")
        prefix: String,
    },

    /// Resolve an address to ranked coordinates
    Geocode {
        /// Free-text address (e.g. "Boston, Massachusetts")
        address: String,
    },

    /// Resolve a coordinate to the nearest known address
    Reverse {
        #[arg(allow_negative_numbers = true)]
        latitude: f64,
        #[arg(allow_negative_numbers = true)]
        longitude: f64,
    },

    /// Run an event script through the full event loop and print the final session
    Replay {
        /// Script file, one event per line ("click 42.0 -71.0", "search Boston", "wait 300", ...)
        script: PathBuf,

        /// Device position reported to `locate`, as "lat,lon"
        #[arg(long = "position", value_parser = parse_position, conflicts_with = "deny_location", allow_hyphen_values = true)]
        position: Option<(f64, f64)>,

        /// Answer `locate` with a permission error
        #[arg(long = "deny-location")]
        deny_location: bool,

        /// Also print every call made to the render surface
        #[arg(long = "calls")]
        calls: bool,
    },
}

fn parse_position(s: &str) -> Result<(f64, f64), String> {
    let (lat, lon) = s
        .split_once(',')
        .ok_or_else(|| format!("expected \"lat,lon\", got {s:?}"))?;
    let lat = lat.trim().parse::<f64>().map_err(|e| format!("latitude: {e}"))?;
    let lon = lon.trim().parse::<f64>().map_err(|e| format!("longitude: {e}"))?;
    Ok((lat, lon))
}
