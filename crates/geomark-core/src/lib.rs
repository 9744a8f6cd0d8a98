// crates/geomark-core/src/lib.rs

//! # geomark-core
//!
//! Location-interaction core for a map annotation tool. Three input sources
//! (free-text search, device geolocation, map clicks) are folded into one
//! model: the current [`Viewport`], the ordered marker set and the selection.
//!
//! Map drawing and geocoding are external collaborators behind
//! [`RenderSurface`], [`GeocodeClient`] and [`PositioningSource`].
//!
//! ```rust,no_run
//! use geomark_core::{EventLoop, HeadlessSurface, MapConfig, MapEvent, StaticPositioning};
//! use geomark_core::geocoding::client_from_config;
//! use std::sync::Arc;
//!
//! # async fn demo() -> geomark_core::Result<()> {
//! let config = MapConfig::default();
//! let surface = Arc::new(HeadlessSurface::new());
//! let (event_loop, handle) = EventLoop::new(
//!     &config,
//!     surface.clone(),
//!     client_from_config(&config)?,
//!     Arc::new(StaticPositioning::denied()),
//! );
//! handle.send(MapEvent::SurfaceReady)?;
//! handle.type_text("Bost")?;
//! drop(handle);
//! let coordinator = event_loop.run().await?;
//! println!("{:?}", coordinator.search().query().suggestions);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod coordinator;
pub mod error;
pub mod geo;
pub mod geocoding;
pub mod markers;
pub mod positioning;
pub mod runtime;
pub mod search;
pub mod surface;
pub mod text;
pub mod viewport;

// Re-exports
pub use crate::config::MapConfig;
pub use crate::coordinator::{Completion, InteractionCoordinator, MapEvent, SessionSnapshot};
pub use crate::error::{MapError, PositioningError, Result};
pub use crate::geo::{Coordinate, SearchBias, Viewport};
pub use crate::geocoding::{GeocodeCandidate, GeocodeClient, Suggestion, SuggestionId};
pub use crate::markers::{Marker, MarkerDetails, MarkerId, MarkerStore};
pub use crate::positioning::{PositioningSource, StaticPositioning};
pub use crate::runtime::{EventLoop, MapHandle};
pub use crate::search::{SearchQuery, SearchSession, SearchStatus};
pub use crate::surface::{HeadlessSurface, Notice, NoticeLevel, RenderSurface, SurfaceCall};
pub use crate::viewport::ViewportController;
