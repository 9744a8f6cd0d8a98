// crates/geomark-core/src/surface.rs

//! # Render surface
//!
//! The live map is an external collaborator. It is consumed through
//! [`RenderSurface`] and pushes its own events (`SurfaceReady`,
//! `SurfaceFailed`, `MapClicked`) into the event loop through a
//! [`MapHandle`](crate::runtime::MapHandle).
//!
//! [`HeadlessSurface`] records every call instead of drawing. It backs the
//! CLI and the tests.

use crate::geo::Coordinate;
use crate::markers::{Marker, MarkerDetails};
use crate::search::SearchQuery;
use parking_lot::Mutex;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    /// Dismisses itself; the session keeps working.
    Transient,
    /// Replaces the interface; nothing else is offered.
    Blocking,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Transient,
            message: message.into(),
        }
    }

    pub fn blocking(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Blocking,
            message: message.into(),
        }
    }
}

/// Commands the interaction core issues to the map.
///
/// The marker list and selection are declarative: each call carries the full
/// current state, not a diff.
pub trait RenderSurface: Send + Sync + 'static {
    /// Animate the camera center to `center`.
    fn pan_to(&self, center: Coordinate);

    fn set_zoom(&self, zoom: u8);

    /// Draw `markers` as overlays, later entries on top.
    fn render_markers(&self, markers: &[Marker]);

    /// Show the info overlay for `selection`, or hide it on `None`.
    fn render_selection(&self, selection: Option<&MarkerDetails>);

    fn render_search(&self, _query: &SearchQuery) {}

    fn show_notice(&self, notice: &Notice);
}

/// One recorded [`RenderSurface`] call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum SurfaceCall {
    PanTo { center: Coordinate },
    SetZoom { zoom: u8 },
    RenderMarkers { count: usize },
    RenderSelection { selected: Option<Marker> },
    RenderSearch { query: SearchQuery },
    Notice(Notice),
}

/// A surface that draws nothing and remembers everything.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    calls: Mutex<Vec<SurfaceCall>>,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<SurfaceCall> {
        self.calls.lock().clone()
    }

    /// Every center passed to [`RenderSurface::pan_to`], in order.
    pub fn pans(&self) -> Vec<Coordinate> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                SurfaceCall::PanTo { center } => Some(*center),
                _ => None,
            })
            .collect()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                SurfaceCall::Notice(n) => Some(n.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    fn record(&self, call: SurfaceCall) {
        self.calls.lock().push(call);
    }
}

impl RenderSurface for HeadlessSurface {
    fn pan_to(&self, center: Coordinate) {
        self.record(SurfaceCall::PanTo { center });
    }

    fn set_zoom(&self, zoom: u8) {
        self.record(SurfaceCall::SetZoom { zoom });
    }

    fn render_markers(&self, markers: &[Marker]) {
        self.record(SurfaceCall::RenderMarkers {
            count: markers.len(),
        });
    }

    fn render_selection(&self, selection: Option<&MarkerDetails>) {
        self.record(SurfaceCall::RenderSelection {
            selected: selection.map(|d| d.marker.clone()),
        });
    }

    fn render_search(&self, query: &SearchQuery) {
        self.record(SurfaceCall::RenderSearch {
            query: query.clone(),
        });
    }

    fn show_notice(&self, notice: &Notice) {
        self.record(SurfaceCall::Notice(notice.clone()));
    }
}
