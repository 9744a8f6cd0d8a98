// crates/geomark-core/tests/common/mod.rs

//! Shared test harness: a coordinator wired to a headless surface, driven
//! step by step instead of through the event loop.
#![allow(dead_code)]

use geomark_core::{
    Completion, Coordinate, GeocodeClient, HeadlessSurface, InteractionCoordinator, MapConfig, MapEvent,
    PositioningSource,
};
use std::sync::Arc;
use tokio::sync::mpsc;

pub fn coord(lat: f64, lon: f64) -> Coordinate {
    Coordinate::new(lat, lon).unwrap()
}

pub struct Harness {
    pub coordinator: InteractionCoordinator<HeadlessSurface>,
    pub surface: Arc<HeadlessSurface>,
    completions: mpsc::UnboundedReceiver<Completion>,
}

impl Harness {
    pub fn new(
        config: &MapConfig,
        geocoder: Arc<dyn GeocodeClient>,
        positioning: Arc<dyn PositioningSource>,
    ) -> Self {
        let surface = Arc::new(HeadlessSurface::new());
        let (tx, completions) = mpsc::unbounded_channel();
        let coordinator = InteractionCoordinator::new(config, surface.clone(), geocoder, positioning, tx);
        Self {
            coordinator,
            surface,
            completions,
        }
    }

    /// Surface ready, then forget the initial pan/zoom.
    pub fn ready(mut self) -> Self {
        self.send(MapEvent::SurfaceReady);
        self.surface.clear();
        self
    }

    pub fn send(&mut self, event: MapEvent) {
        self.coordinator.handle(event).unwrap();
    }

    /// Applies completions until no provider task is outstanding.
    pub async fn settle(&mut self) {
        while self.coordinator.pending_tasks() > 0 {
            let completion = self.completions.recv().await.expect("completion channel closed");
            self.coordinator.complete(completion);
        }
    }

    /// Applies only the completions that have already arrived.
    pub fn drain_ready(&mut self) {
        while let Ok(completion) = self.completions.try_recv() {
            self.coordinator.complete(completion);
        }
    }
}
