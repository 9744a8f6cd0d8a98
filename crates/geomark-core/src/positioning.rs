// crates/geomark-core/src/positioning.rs

//! Device positioning.

use crate::error::PositioningError;
use crate::geo::Coordinate;
use async_trait::async_trait;

/// Single-shot source of the device's current position.
#[async_trait]
pub trait PositioningSource: Send + Sync + 'static {
    async fn current_position(&self) -> Result<Coordinate, PositioningError>;
}

/// Always answers with the same outcome.
#[derive(Debug, Clone)]
pub struct StaticPositioning {
    outcome: Result<Coordinate, PositioningError>,
}

impl StaticPositioning {
    pub fn fixed(position: Coordinate) -> Self {
        Self {
            outcome: Ok(position),
        }
    }

    pub fn denied() -> Self {
        Self {
            outcome: Err(PositioningError::PermissionDenied),
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            outcome: Err(PositioningError::Unavailable(reason.into())),
        }
    }
}

#[async_trait]
impl PositioningSource for StaticPositioning {
    async fn current_position(&self) -> Result<Coordinate, PositioningError> {
        self.outcome.clone()
    }
}
