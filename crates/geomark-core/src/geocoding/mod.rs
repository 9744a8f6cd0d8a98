// crates/geomark-core/src/geocoding/mod.rs

//! # Geocoding
//!
//! [`GeocodeClient`] is the seam to the geocoding provider. Two backends
//! ship with the crate:
//!
//! - [`gazetteer::Gazetteer`]: offline, backed by an embedded place list.
//! - `http::MapsCo` (feature `http`): geocode.maps.co over HTTPS.
//!
//! [`client_from_config`] picks one based on [`MapConfig::provider`].

pub mod gazetteer;
#[cfg(feature = "http")]
pub mod http;

use crate::config::{MapConfig, ProviderKind};
use crate::error::{MapError, Result};
use crate::geo::{Coordinate, SearchBias};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Provider-scoped identifier of a suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SuggestionId(String);

impl SuggestionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SuggestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An autocomplete entry for a search prefix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: SuggestionId,
    pub label: String,
}

/// A ranked forward-geocode result. Rank is the position in the returned list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeCandidate {
    pub coordinate: Coordinate,
    pub label: String,
}

/// A geocoding provider that can resolve addresses to coordinates and vice versa.
#[async_trait]
pub trait GeocodeClient: Send + Sync + 'static {
    /// Forward geocode: resolve an address to ranked candidates (best first).
    async fn forward(&self, address: &str) -> Result<Vec<GeocodeCandidate>>;

    /// Autocomplete `prefix`, preferring results inside `bias`.
    async fn suggest(&self, prefix: &str, bias: &SearchBias) -> Result<Vec<Suggestion>>;

    /// Reverse geocode: resolve a position to a display label.
    async fn reverse(&self, position: Coordinate) -> Result<String>;
}

/// Builds the provider named by `config.provider`.
///
/// A provider that cannot be built is reported as
/// [`MapError::ProviderUnavailable`]: the session cannot start without it.
pub fn client_from_config(config: &MapConfig) -> Result<Arc<dyn GeocodeClient>> {
    match config.provider {
        ProviderKind::Gazetteer => {
            let gazetteer = gazetteer::Gazetteer::embedded()
                .map_err(|e| MapError::ProviderUnavailable(e.to_string()))?
                .with_max_results(config.max_suggestions);
            Ok(Arc::new(gazetteer))
        }
        #[cfg(feature = "http")]
        ProviderKind::MapsCo => {
            let key = config.api_key.clone().ok_or_else(|| {
                MapError::ProviderUnavailable("maps_co provider needs an api_key".into())
            })?;
            let backend = http::MapsCo::new(key, config.request_timeout())
                .map_err(|e| MapError::ProviderUnavailable(e.to_string()))?
                .with_max_results(config.max_suggestions);
            Ok(Arc::new(backend))
        }
        #[cfg(not(feature = "http"))]
        ProviderKind::MapsCo => Err(MapError::ProviderUnavailable(
            "maps_co provider requires the `http` feature".into(),
        )),
    }
}
