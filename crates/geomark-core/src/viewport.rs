// crates/geomark-core/src/viewport.rs

//! # Viewport controller
//!
//! Sole owner of the camera. Holds an injected handle to the render surface
//! and gates every command on the surface lifecycle:
//!
//! ```text
//! Uninitialized --(surface ready)--> Ready --(ready again)--> Ready
//! ```
//!
//! Commands issued before `Ready` are rejected with
//! [`MapError::SurfaceNotReady`]; they are never queued.

use crate::error::{MapError, Result};
use crate::geo::{Coordinate, Viewport, MAX_ZOOM};
use crate::surface::RenderSurface;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceState {
    Uninitialized,
    Ready,
}

pub struct ViewportController<S: RenderSurface> {
    surface: Arc<S>,
    state: SurfaceState,
    viewport: Viewport,
}

impl<S: RenderSurface> ViewportController<S> {
    /// `initial` is applied to the surface once it reports ready.
    pub fn new(surface: Arc<S>, initial: Viewport) -> Self {
        Self {
            surface,
            state: SurfaceState::Uninitialized,
            viewport: Viewport {
                center: initial.center,
                zoom: initial.zoom.min(MAX_ZOOM),
            },
        }
    }

    /// Handles the surface-ready signal. Returns `true` on the first call.
    pub fn mark_ready(&mut self) -> bool {
        if self.state == SurfaceState::Ready {
            return false;
        }
        self.state = SurfaceState::Ready;
        self.surface.pan_to(self.viewport.center);
        self.surface.set_zoom(self.viewport.zoom);
        tracing::info!(center = %self.viewport.center, zoom = self.viewport.zoom, "surface ready");
        true
    }

    /// Moves the camera to `position`, optionally changing zoom.
    pub fn pan_to(&mut self, position: Coordinate, zoom: Option<u8>) -> Result<()> {
        if self.state != SurfaceState::Ready {
            tracing::warn!(position = %position, "pan rejected: surface not ready");
            return Err(MapError::SurfaceNotReady);
        }

        self.viewport.center = position;
        self.surface.pan_to(position);
        if let Some(zoom) = zoom {
            let zoom = zoom.min(MAX_ZOOM);
            self.viewport.zoom = zoom;
            self.surface.set_zoom(zoom);
        }
        tracing::debug!(center = %position, zoom = self.viewport.zoom, "viewport moved");
        Ok(())
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn state(&self) -> SurfaceState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == SurfaceState::Ready
    }

    pub fn surface(&self) -> &Arc<S> {
        &self.surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{HeadlessSurface, SurfaceCall};

    fn boston() -> Coordinate {
        Coordinate::new(42.36, -71.06).unwrap()
    }

    fn controller() -> (Arc<HeadlessSurface>, ViewportController<HeadlessSurface>) {
        let surface = Arc::new(HeadlessSurface::new());
        let initial = Viewport {
            center: Coordinate::new(0.0, 0.0).unwrap(),
            zoom: 3,
        };
        (surface.clone(), ViewportController::new(surface, initial))
    }

    #[test]
    fn rejects_pan_before_ready() {
        let (surface, mut vc) = controller();
        let before = vc.viewport();
        assert!(matches!(vc.pan_to(boston(), Some(14)), Err(MapError::SurfaceNotReady)));
        assert_eq!(vc.viewport(), before);
        assert!(surface.calls().is_empty());
    }

    #[test]
    fn ready_applies_initial_viewport_once() {
        let (surface, mut vc) = controller();
        assert!(vc.mark_ready());
        assert!(!vc.mark_ready());
        assert_eq!(surface.calls().len(), 2);
        assert_eq!(surface.pans(), vec![Coordinate::new(0.0, 0.0).unwrap()]);
    }

    #[test]
    fn pan_with_and_without_zoom() {
        let (surface, mut vc) = controller();
        vc.mark_ready();
        surface.clear();

        vc.pan_to(boston(), None).unwrap();
        assert_eq!(vc.viewport().zoom, 3);
        assert_eq!(surface.calls(), vec![SurfaceCall::PanTo { center: boston() }]);

        vc.pan_to(boston(), Some(40)).unwrap();
        assert_eq!(vc.viewport().zoom, MAX_ZOOM);
        assert_eq!(vc.viewport().center, boston());
    }
}
