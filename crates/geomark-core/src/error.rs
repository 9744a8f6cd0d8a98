// crates/geomark-core/src/error.rs
use std::time::Duration;

use thiserror::Error;

use crate::geocoding::SuggestionId;

/// Failure modes of a device positioning request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PositioningError {
    #[error("permission to read the device position was denied")]
    PermissionDenied,
    #[error("device position unavailable: {0}")]
    Unavailable(String),
    #[error("positioning timed out")]
    Timeout,
}

/// Error type for every fallible operation in the crate.
///
/// Only [`MapError::ProviderUnavailable`] is fatal to a session (see
/// [`MapError::is_fatal`]). Everything else is contained to the operation
/// that produced it and never touches markers, selection or viewport.
#[derive(Debug, Error)]
pub enum MapError {
    /// The mapping backend failed to initialise.
    #[error("map provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// A single geocode or suggestion lookup failed.
    #[error("geocode lookup failed: {0}")]
    Geocode(String),

    #[error("no geocode results for {0:?}")]
    NoResults(String),

    #[error(transparent)]
    Positioning(#[from] PositioningError),

    #[error("render surface is not ready")]
    SurfaceNotReady,

    #[error("provider call timed out after {0:?}")]
    Timeout(Duration),

    #[error("invalid coordinate ({latitude}, {longitude})")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    #[error("unknown suggestion {0}")]
    UnknownSuggestion(SuggestionId),

    #[error("no suggestions to select from")]
    NothingToSelect,

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "http")]
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl MapError {
    /// Whether the error blocks the whole interface.
    pub fn is_fatal(&self) -> bool {
        matches!(self, MapError::ProviderUnavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, MapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_provider_unavailable_is_fatal() {
        assert!(MapError::ProviderUnavailable("tiles".into()).is_fatal());
        assert!(!MapError::Geocode("boom".into()).is_fatal());
        assert!(!MapError::SurfaceNotReady.is_fatal());
        assert!(!MapError::from(PositioningError::PermissionDenied).is_fatal());
    }
}
