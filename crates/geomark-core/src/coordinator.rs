// crates/geomark-core/src/coordinator.rs

//! # Interaction coordinator
//!
//! Routes typed [`MapEvent`]s into the components that own the state:
//!
//! | event                     | action                                              |
//! |---------------------------|-----------------------------------------------------|
//! | `SurfaceReady`            | `ViewportController::mark_ready`, full render       |
//! | `SurfaceFailed`           | blocking notice, fatal `ProviderUnavailable`        |
//! | `MapClicked(p)`           | `MarkerStore::add(p)`                               |
//! | `MarkerClicked(id)`       | `MarkerStore::select(id)`, reverse lookup if needed |
//! | `InfoClosed`              | `MarkerStore::clear_selection`                      |
//! | `MarkerRemoved(id)`       | `MarkerStore::remove(id)`                           |
//! | `MarkersCleared`          | `MarkerStore::clear`                                |
//! | `LocateRequested`         | positioning task, then `pan_to(pos, locate_zoom)`   |
//! | `SearchEdited(text)`      | `SearchSession::edit_text`, suggestion task         |
//! | `SuggestionSelected(id)`  | `SearchSession::select_suggestion`, resolve task    |
//!
//! Handlers never wait on a provider. Provider work is spawned onto the
//! tokio runtime and comes back as a [`Completion`] through the channel
//! passed to [`InteractionCoordinator::new`]; the event loop hands it to
//! [`InteractionCoordinator::complete`]. All state is therefore mutated from
//! one place, in event order.
//!
//! After `SurfaceFailed` the coordinator is dead: every later event is
//! answered with the same `ProviderUnavailable` error and late completions
//! are dropped.

use crate::config::MapConfig;
use crate::error::{MapError, PositioningError, Result};
use crate::geo::{Coordinate, Viewport};
use crate::geocoding::GeocodeClient;
use crate::markers::{Marker, MarkerDetails, MarkerId, MarkerStore, StoreChanges};
use crate::positioning::PositioningSource;
use crate::search::{
    SearchCompletion, SearchOptions, SearchOutcome, SearchQuery, SearchSession, SearchStatus, SuggestionId,
};
use crate::surface::{Notice, RenderSurface};
use crate::viewport::ViewportController;
use serde::Serialize;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Input events, from the surface or the UI around it.
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    SurfaceReady,
    SurfaceFailed(String),
    MapClicked(Coordinate),
    MarkerClicked(MarkerId),
    InfoClosed,
    MarkerRemoved(MarkerId),
    MarkersCleared,
    LocateRequested,
    SearchEdited(String),
    SuggestionSelected(SuggestionId),
    /// Keyboard pick of the n-th visible suggestion (0-based).
    SuggestionSelectedAt(usize),
}

/// Result of a spawned provider task.
#[derive(Debug)]
pub enum Completion {
    Search(SearchCompletion),
    Located(std::result::Result<Coordinate, PositioningError>),
    AddressResolved { id: MarkerId, result: Result<String> },
}

/// Serialisable view of the whole session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub surface_ready: bool,
    pub viewport: Viewport,
    pub markers: Vec<Marker>,
    pub selection: Option<MarkerDetails>,
    pub search: SearchQuery,
}

#[derive(Debug, Clone)]
struct Settings {
    focus_zoom: u8,
    locate_zoom: u8,
    place_marker_on_search: bool,
    reverse_lookup_on_select: bool,
    request_timeout: Duration,
}

pub struct InteractionCoordinator<S: RenderSurface> {
    markers: MarkerStore,
    viewport: ViewportController<S>,
    search: SearchSession,
    geocoder: Arc<dyn GeocodeClient>,
    positioning: Arc<dyn PositioningSource>,
    settings: Settings,
    completions: mpsc::UnboundedSender<Completion>,
    in_flight: usize,
    // markers with a reverse lookup in flight
    pending_lookups: HashSet<MarkerId>,
    failed: Option<String>,
}

impl<S: RenderSurface> InteractionCoordinator<S> {
    pub fn new(
        config: &MapConfig,
        surface: Arc<S>,
        geocoder: Arc<dyn GeocodeClient>,
        positioning: Arc<dyn PositioningSource>,
        completions: mpsc::UnboundedSender<Completion>,
    ) -> Self {
        let search = SearchSession::new(
            geocoder.clone(),
            SearchOptions {
                bias: config.search_bias,
                debounce: config.debounce(),
                timeout: config.request_timeout(),
            },
        );
        Self {
            markers: MarkerStore::new(),
            viewport: ViewportController::new(surface, config.initial_viewport),
            search,
            geocoder,
            positioning,
            settings: Settings {
                focus_zoom: config.focus_zoom,
                locate_zoom: config.locate_zoom,
                place_marker_on_search: config.place_marker_on_search,
                reverse_lookup_on_select: config.reverse_lookup_on_select,
                request_timeout: config.request_timeout(),
            },
            completions,
            in_flight: 0,
            pending_lookups: HashSet::new(),
            failed: None,
        }
    }

    /// Routes one input event.
    ///
    /// Returns `Err` only for fatal errors; everything else is contained.
    /// Once a fatal error has been returned, every later call returns it again
    /// without touching state.
    ///
    /// # Panics
    ///
    /// Provider work is started with `tokio::spawn`, so this must be called
    /// from within a tokio runtime.
    pub fn handle(&mut self, event: MapEvent) -> Result<()> {
        if let Some(reason) = &self.failed {
            tracing::debug!(?event, "event ignored: map provider unavailable");
            return Err(MapError::ProviderUnavailable(reason.clone()));
        }
        tracing::trace!(?event, "event");
        match event {
            MapEvent::SurfaceReady => {
                if self.viewport.mark_ready() {
                    self.render_all();
                }
            }

            MapEvent::SurfaceFailed(reason) => {
                tracing::error!(%reason, "map provider failed to load");
                self.surface()
                    .show_notice(&Notice::blocking(format!("The map could not be loaded: {reason}")));
                self.failed = Some(reason.clone());
                return Err(MapError::ProviderUnavailable(reason));
            }

            MapEvent::MapClicked(position) => {
                self.markers.add(position);
            }

            MapEvent::MarkerClicked(id) => {
                self.markers.select(id);
                if self.markers.selected_id() == Some(id) {
                    self.lookup_address(id);
                }
            }

            MapEvent::InfoClosed => self.markers.clear_selection(),

            MapEvent::MarkerRemoved(id) => {
                if self.markers.remove(id).is_none() {
                    tracing::debug!(id = %id, "remove ignored: stale marker reference");
                }
            }

            MapEvent::MarkersCleared => self.markers.clear(),

            MapEvent::LocateRequested => self.locate(),

            MapEvent::SearchEdited(text) => {
                if let Some(request) = self.search.edit_text(&text) {
                    let task = self.search.suggest_task(request);
                    self.spawn(async move { Completion::Search(task.await) });
                }
            }

            MapEvent::SuggestionSelected(id) => self.select_suggestion(&id),

            MapEvent::SuggestionSelectedAt(index) => {
                match self.search.query().suggestions.get(index).map(|s| s.id.clone()) {
                    Some(id) => self.select_suggestion(&id),
                    None => tracing::debug!(index, "no suggestion at index"),
                }
            }
        }
        self.flush();
        Ok(())
    }

    /// Applies the result of a spawned provider task.
    pub fn complete(&mut self, completion: Completion) {
        self.in_flight = self.in_flight.saturating_sub(1);
        if self.failed.is_some() {
            tracing::trace!(?completion, "completion dropped: map provider unavailable");
            return;
        }
        match completion {
            Completion::Search(completion) => {
                let resolving = self.search.status() == &SearchStatus::Resolving;
                match self.search.apply(completion) {
                    SearchOutcome::Resolved(best) => {
                        if let Err(e) = self.viewport.pan_to(best.coordinate, Some(self.settings.focus_zoom)) {
                            self.search.fail_resolution(&e);
                            self.notify(format!("Could not show {}: {e}", best.label));
                        } else if self.settings.place_marker_on_search {
                            self.markers.add(best.coordinate);
                        }
                    }
                    // suggestion failures show in the search box; a failed selection gets a notice
                    SearchOutcome::Failed(e) if resolving => self.notify(format!("Search failed: {e}")),
                    SearchOutcome::Failed(_) | SearchOutcome::Updated | SearchOutcome::Ignored => {}
                }
            }

            Completion::Located(Ok(position)) => {
                if let Err(e) = self.viewport.pan_to(position, Some(self.settings.locate_zoom)) {
                    self.notify(format!("Could not show your location: {e}"));
                }
            }

            Completion::Located(Err(e)) => {
                tracing::warn!(error = %e, "locate failed");
                self.notify(format!("Location unavailable: {e}"));
            }

            Completion::AddressResolved { id, result } => {
                self.pending_lookups.remove(&id);
                match result {
                    Ok(address) => {
                        self.markers.set_address(id, address);
                    }
                    Err(e) => tracing::debug!(id = %id, error = %e, "reverse lookup failed"),
                }
            }
        }
        self.flush();
    }

    fn select_suggestion(&mut self, id: &SuggestionId) {
        match self.search.select_suggestion(id) {
            Ok(request) => {
                let task = self.search.resolve_task(request);
                self.spawn(async move { Completion::Search(task.await) });
            }
            Err(e) => tracing::debug!(id = %id, error = %e, "suggestion selection ignored"),
        }
    }

    fn locate(&mut self) {
        let positioning = self.positioning.clone();
        let timeout = self.settings.request_timeout;
        self.spawn(async move {
            let result = match tokio::time::timeout(timeout, positioning.current_position()).await {
                Ok(result) => result,
                Err(_) => Err(PositioningError::Timeout),
            };
            Completion::Located(result)
        });
    }

    fn lookup_address(&mut self, id: MarkerId) {
        if !self.settings.reverse_lookup_on_select
            || self.markers.address(id).is_some()
            || self.pending_lookups.contains(&id)
        {
            return;
        }
        let Some(position) = self.markers.get(id).map(|m| m.position) else {
            return;
        };
        self.pending_lookups.insert(id);
        let geocoder = self.geocoder.clone();
        let timeout = self.settings.request_timeout;
        self.spawn(async move {
            let result = match tokio::time::timeout(timeout, geocoder.reverse(position)).await {
                Ok(result) => result,
                Err(_) => Err(MapError::Timeout(timeout)),
            };
            Completion::AddressResolved { id, result }
        });
    }

    fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = Completion> + Send + 'static,
    {
        self.in_flight += 1;
        let tx = self.completions.clone();
        tokio::spawn(async move {
            if tx.send(task.await).is_err() {
                tracing::trace!("completion dropped: event loop gone");
            }
        });
    }

    fn notify(&self, message: String) {
        if self.viewport.is_ready() {
            self.surface().show_notice(&Notice::transient(message));
        } else {
            tracing::info!(%message, "notice dropped: surface not ready");
        }
    }

    /// Pushes pending store/search changes to the surface.
    fn flush(&mut self) {
        if !self.viewport.is_ready() {
            return;
        }
        let changes = self.markers.take_changes();
        if changes.contains(StoreChanges::MARKERS) {
            self.surface().render_markers(self.markers.markers());
        }
        if changes.contains(StoreChanges::SELECTION) {
            self.surface().render_selection(self.markers.current_details().as_ref());
        }
        if self.search.take_changed() {
            self.surface().render_search(self.search.query());
        }
    }

    fn render_all(&mut self) {
        self.markers.take_changes();
        self.search.take_changed();
        let surface = self.surface();
        surface.render_markers(self.markers.markers());
        surface.render_selection(self.markers.current_details().as_ref());
        surface.render_search(self.search.query());
    }

    fn surface(&self) -> &Arc<S> {
        self.viewport.surface()
    }

    pub fn markers(&self) -> &MarkerStore {
        &self.markers
    }

    pub fn viewport(&self) -> &ViewportController<S> {
        &self.viewport
    }

    pub fn search(&self) -> &SearchSession {
        &self.search
    }

    /// Whether a fatal error has stopped the coordinator.
    pub fn is_failed(&self) -> bool {
        self.failed.is_some()
    }

    /// Provider tasks spawned but not yet completed.
    pub fn pending_tasks(&self) -> usize {
        self.in_flight
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            surface_ready: self.viewport.is_ready(),
            viewport: self.viewport.viewport(),
            markers: self.markers.markers().to_vec(),
            selection: self.markers.current_details(),
            search: self.search.query().clone(),
        }
    }
}
