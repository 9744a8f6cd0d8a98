// crates/geomark-core/src/runtime.rs

//! # Event loop
//!
//! One task owns the [`InteractionCoordinator`]; everything else talks to it
//! through channels:
//!
//! - surfaces and drivers send [`MapEvent`]s through a cloneable [`MapHandle`];
//! - spawned provider tasks send [`Completion`]s back.
//!
//! The loop stops when every `MapHandle` is dropped and no provider task is
//! outstanding, or immediately on a fatal error.

use crate::config::MapConfig;
use crate::coordinator::{Completion, InteractionCoordinator, MapEvent};
use crate::error::{MapError, Result};
use crate::geo::Coordinate;
use crate::geocoding::GeocodeClient;
use crate::markers::MarkerId;
use crate::positioning::PositioningSource;
use crate::surface::RenderSurface;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Sending side of the event loop.
#[derive(Debug, Clone)]
pub struct MapHandle {
    events: mpsc::UnboundedSender<MapEvent>,
}

impl MapHandle {
    pub fn send(&self, event: MapEvent) -> Result<()> {
        self.events
            .send(event)
            .map_err(|_| MapError::ProviderUnavailable("event loop has stopped".into()))
    }

    pub fn surface_ready(&self) -> Result<()> {
        self.send(MapEvent::SurfaceReady)
    }

    pub fn click(&self, position: Coordinate) -> Result<()> {
        self.send(MapEvent::MapClicked(position))
    }

    pub fn click_marker(&self, id: MarkerId) -> Result<()> {
        self.send(MapEvent::MarkerClicked(id))
    }

    pub fn type_text(&self, text: impl Into<String>) -> Result<()> {
        self.send(MapEvent::SearchEdited(text.into()))
    }

    pub fn locate(&self) -> Result<()> {
        self.send(MapEvent::LocateRequested)
    }
}

pub struct EventLoop<S: RenderSurface> {
    coordinator: InteractionCoordinator<S>,
    events: mpsc::UnboundedReceiver<MapEvent>,
    completions: mpsc::UnboundedReceiver<Completion>,
}

impl<S: RenderSurface> EventLoop<S> {
    pub fn new(
        config: &MapConfig,
        surface: Arc<S>,
        geocoder: Arc<dyn GeocodeClient>,
        positioning: Arc<dyn PositioningSource>,
    ) -> (Self, MapHandle) {
        let (event_tx, events) = mpsc::unbounded_channel();
        let (completion_tx, completions) = mpsc::unbounded_channel();
        let coordinator = InteractionCoordinator::new(config, surface, geocoder, positioning, completion_tx);
        (
            Self {
                coordinator,
                events,
                completions,
            },
            MapHandle { events: event_tx },
        )
    }

    pub fn coordinator(&self) -> &InteractionCoordinator<S> {
        &self.coordinator
    }

    /// Runs until all handles are gone and all provider tasks have reported.
    ///
    /// Returns the coordinator so the caller can inspect the final state.
    pub async fn run(mut self) -> Result<InteractionCoordinator<S>> {
        let mut accepting = true;
        loop {
            if !accepting && self.coordinator.pending_tasks() == 0 {
                break;
            }
            tokio::select! {
                event = self.events.recv(), if accepting => match event {
                    Some(event) => self.coordinator.handle(event)?,
                    None => {
                        tracing::debug!(pending = self.coordinator.pending_tasks(), "all handles dropped");
                        accepting = false;
                    }
                },
                Some(completion) = self.completions.recv() => self.coordinator.complete(completion),
                else => break,
            }
        }
        tracing::debug!(markers = self.coordinator.markers().len(), "event loop finished");
        Ok(self.coordinator)
    }
}
