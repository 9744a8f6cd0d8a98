//! geomark: command-line driver for geomark-core
//!
//! This binary exposes the geocoding providers and the interaction event
//! loop without a graphical map. The render surface is headless: every call
//! the core makes to it is recorded and can be printed.
//!
//! Usage examples
//! --------------
//!
//! - Autocomplete, biased toward the configured region
//!   $ geomark suggest bost
//!
//! - Forward and reverse geocoding
//!   $ geomark geocode "Portland, Oregon"
//!   $ geomark reverse 42.35 -71.07
//!
//! - Replay an event script and print the final session as JSON
//!   $ geomark replay session.txt --position 42.36,-71.06 --calls
//!
//! Providers
//! ---------
//!
//! The offline gazetteer is used unless the config selects `maps_co` (build
//! with `--features http` and set `GEOMARK_API_KEY`). `--places <file>`
//! swaps in a custom gazetteer place list.
//!
//! Logging goes to stderr and is controlled by `RUST_LOG` (default `info`).
mod args;

use crate::args::{CliArgs, Commands};
use anyhow::Context;
use clap::Parser;
use geomark_cli::script::{parse_script, Step};
use geomark_core::geocoding::{client_from_config, gazetteer::Gazetteer};
use geomark_core::{
    Coordinate, EventLoop, GeocodeClient, HeadlessSurface, MapConfig, MapError, PositioningSource,
    StaticPositioning,
};
use std::path::Path;
use std::sync::Arc;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();

    // Config file if given, otherwise defaults plus the environment
    let config = match &args.config {
        Some(path) => MapConfig::load_from_path(path)?,
        None => MapConfig::from_env(),
    };
    let geocoder = build_geocoder(&config, args.places.as_deref())?;

    match args.command {
        Commands::Suggest { prefix } => {
            let suggestions = geocoder.suggest(&prefix, &config.search_bias).await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&suggestions)?);
            } else if suggestions.is_empty() {
                println!("No suggestions for: {prefix}");
            } else {
                for (i, s) in suggestions.iter().enumerate() {
                    println!("{:>2}. {}", i + 1, s.label);
                }
            }
        }

        Commands::Geocode { address } => {
            let candidates = geocoder.forward(&address).await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&candidates)?);
            } else if candidates.is_empty() {
                println!("No results for: {address}");
            } else {
                for c in &candidates {
                    println!("{}  ({})", c.label, c.coordinate);
                }
            }
        }

        Commands::Reverse { latitude, longitude } => {
            let position = Coordinate::new(latitude, longitude)?;
            match geocoder.reverse(position).await {
                Ok(label) if args.json => println!("{}", serde_json::json!({ "label": label })),
                Ok(label) => println!("{label}"),
                Err(MapError::NoResults(_)) => eprintln!("Nothing known near {position}"),
                Err(e) => return Err(e.into()),
            }
        }

        Commands::Replay {
            script,
            position,
            deny_location,
            calls,
        } => {
            let positioning: Arc<dyn PositioningSource> = match (position, deny_location) {
                (Some((lat, lon)), _) => Arc::new(StaticPositioning::fixed(Coordinate::new(lat, lon)?)),
                (None, true) => Arc::new(StaticPositioning::denied()),
                (None, false) => Arc::new(StaticPositioning::unavailable("no position source configured")),
            };
            replay(&config, geocoder, positioning, &script, calls).await?;
        }
    }

    Ok(())
}

fn build_geocoder(config: &MapConfig, places: Option<&Path>) -> anyhow::Result<Arc<dyn GeocodeClient>> {
    match places {
        Some(path) => {
            let gazetteer = Gazetteer::load_from_path(path)?.with_max_results(config.max_suggestions);
            Ok(Arc::new(gazetteer))
        }
        None => Ok(client_from_config(config)?),
    }
}

async fn replay(
    config: &MapConfig,
    geocoder: Arc<dyn GeocodeClient>,
    positioning: Arc<dyn PositioningSource>,
    script: &Path,
    print_calls: bool,
) -> anyhow::Result<()> {
    let source = std::fs::read_to_string(script)
        .with_context(|| format!("failed to read script {}", script.display()))?;
    let steps = parse_script(&source)?;
    tracing::info!(steps = steps.len(), script = %script.display(), "replaying");

    let surface = Arc::new(HeadlessSurface::new());
    let (event_loop, handle) = EventLoop::new(config, surface.clone(), geocoder, positioning);

    // The handle is dropped when the script ends; the loop then drains
    // outstanding provider tasks and returns.
    let driver = async move {
        for step in steps {
            match step {
                Step::Event(event) => handle.send(event)?,
                Step::Wait(pause) => tokio::time::sleep(pause).await,
            }
        }
        Ok::<(), MapError>(())
    };
    let (finished, driven) = tokio::join!(event_loop.run(), driver);

    for notice in surface.notices() {
        eprintln!("[{:?}] {}", notice.level, notice.message);
    }
    let coordinator = finished?;
    driven?;

    let snapshot = coordinator.snapshot();
    let output = if print_calls {
        serde_json::json!({ "session": snapshot, "calls": surface.calls() })
    } else {
        serde_json::to_value(&snapshot)?
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
