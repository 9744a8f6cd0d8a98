// crates/geomark-core/src/config.rs

//! # Configuration
//!
//! Every field has a default, so an empty JSON object (`{}`) is a valid
//! configuration. The provider credential can be injected through the
//! `GEOMARK_API_KEY` environment variable instead of the file.

use crate::error::{MapError, Result};
use crate::geo::{Coordinate, SearchBias, Viewport, MAX_ZOOM};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const API_KEY_ENV: &str = "GEOMARK_API_KEY";

// Boston, MA. Matches the bundled gazetteer's densest region.
const DEFAULT_CENTER: Coordinate = Coordinate::new_unchecked(42.3601, -71.0589);
const DEFAULT_BIAS_RADIUS_METERS: f64 = 200_000.0;

/// Which [`GeocodeClient`](crate::geocoding::GeocodeClient) backs the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Embedded offline place list.
    #[default]
    Gazetteer,
    /// geocode.maps.co (requires `api_key` and the `http` feature).
    MapsCo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub api_key: Option<String>,
    pub provider: ProviderKind,
    pub search_bias: SearchBias,
    pub initial_viewport: Viewport,
    /// Opaque reference handed to the render surface.
    pub marker_icon: String,
    /// Zoom applied when a search result is focused.
    pub focus_zoom: u8,
    /// Zoom applied after a successful locate-me.
    pub locate_zoom: u8,
    pub debounce_ms: u64,
    pub request_timeout_ms: u64,
    pub max_suggestions: usize,
    /// Also drop a marker where a search resolves.
    pub place_marker_on_search: bool,
    /// Reverse-geocode a marker's address the first time it is selected.
    pub reverse_lookup_on_select: bool,
}

impl Default for MapConfig {
    fn default() -> Self {
        let center = DEFAULT_CENTER;
        Self {
            api_key: None,
            provider: ProviderKind::default(),
            search_bias: SearchBias {
                center,
                radius_meters: DEFAULT_BIAS_RADIUS_METERS,
            },
            initial_viewport: Viewport { center, zoom: 10 },
            marker_icon: "marker-icon.png".to_string(),
            focus_zoom: 14,
            locate_zoom: 14,
            debounce_ms: 200,
            request_timeout_ms: 10_000,
            max_suggestions: 5,
            place_marker_on_search: false,
            reverse_lookup_on_select: true,
        }
    }
}

impl MapConfig {
    /// Reads a JSON config file, applies the environment override and validates.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            MapError::NotFound(format!("config not found at {}: {}", path.display(), e))
        })?;
        let mut config: MapConfig = serde_json::from_str(&text)?;
        config.apply_env();
        config.validate()?;
        tracing::debug!(path = %path.display(), provider = ?config.provider, "config loaded");
        Ok(config)
    }

    /// Defaults plus the environment override.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                self.api_key = Some(key);
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.search_bias.radius_meters.is_finite() && self.search_bias.radius_meters > 0.0) {
            return Err(MapError::Config(format!(
                "search_bias.radius_meters must be positive, got {}",
                self.search_bias.radius_meters
            )));
        }
        for (name, zoom) in [
            ("initial_viewport.zoom", self.initial_viewport.zoom),
            ("focus_zoom", self.focus_zoom),
            ("locate_zoom", self.locate_zoom),
        ] {
            if zoom > MAX_ZOOM {
                return Err(MapError::Config(format!(
                    "{name} must be at most {MAX_ZOOM}, got {zoom}"
                )));
            }
        }
        if self.max_suggestions == 0 {
            return Err(MapError::Config("max_suggestions must be at least 1".into()));
        }
        if self.request_timeout_ms == 0 {
            return Err(MapError::Config("request_timeout_ms must be non-zero".into()));
        }
        if self.provider == ProviderKind::MapsCo && self.api_key.is_none() {
            return Err(MapError::Config(format!(
                "provider maps_co needs an api_key (or {API_KEY_ENV})"
            )));
        }
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_default() {
        let config: MapConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.focus_zoom, 14);
        assert_eq!(config.search_bias.radius_meters, 200_000.0);
        assert!(!config.place_marker_on_search);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_override() {
        let config: MapConfig = serde_json::from_str(
            r#"{ "focus_zoom": 16, "initial_viewport": { "center": { "latitude": 48.85, "longitude": 2.35 }, "zoom": 5 } }"#,
        )
        .unwrap();
        assert_eq!(config.focus_zoom, 16);
        assert_eq!(config.initial_viewport.zoom, 5);
        assert_eq!(config.debounce(), Duration::from_millis(200));
    }

    #[test]
    fn rejects_bad_values() {
        let mut config = MapConfig::default();
        config.focus_zoom = 30;
        assert!(matches!(config.validate(), Err(MapError::Config(_))));

        let mut config = MapConfig::default();
        config.search_bias.radius_meters = 0.0;
        assert!(config.validate().is_err());

        let mut config = MapConfig::default();
        config.provider = ProviderKind::MapsCo;
        config.api_key = None;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_center() {
        let parsed = serde_json::from_str::<MapConfig>(
            r#"{ "search_bias": { "center": { "latitude": 95.0, "longitude": 0.0 }, "radius_meters": 10.0 } }"#,
        );
        assert!(parsed.is_err());
    }
}
