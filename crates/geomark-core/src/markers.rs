// crates/geomark-core/src/markers.rs

//! # Marker store
//!
//! Owns the ordered marker collection and the single selection slot.
//!
//! Invariants:
//! - Insertion order is render order: the last marker added is drawn on top.
//! - Ids are minted from a per-store counter and never reused, so removing a
//!   marker cannot change another marker's identity.
//! - The selection always refers to a live marker; removing the selected
//!   marker clears it.
//!
//! Mutations record [`StoreChanges`]; the coordinator drains them with
//! [`MarkerStore::take_changes`] and forwards them to the render surface.

use crate::geo::Coordinate;
use bitflags::bitflags;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Opaque marker identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkerId(u64);

impl MarkerId {
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for MarkerId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m{}", self.0)
    }
}

/// A user-placed point annotation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub id: MarkerId,
    pub position: Coordinate,
    pub created_at: DateTime<Utc>,
}

/// What the info overlay shows for the selected marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerDetails {
    pub marker: Marker,
    /// Reverse-geocoded address, once known.
    pub address: Option<String>,
}

bitflags! {
    /// Parts of the store the render layer has not seen yet.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct StoreChanges: u8 {
        const MARKERS = 0b01;
        const SELECTION = 0b10;
    }
}

#[derive(Debug, Default)]
pub struct MarkerStore {
    markers: Vec<Marker>,
    selected: Option<MarkerId>,
    addresses: HashMap<MarkerId, String>,
    next_id: u64,
    changes: StoreChanges,
}

impl MarkerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a marker at `position`. Never fails.
    pub fn add(&mut self, position: Coordinate) -> Marker {
        self.next_id += 1;
        let marker = Marker {
            id: MarkerId(self.next_id),
            position,
            created_at: Utc::now(),
        };
        self.markers.push(marker.clone());
        self.changes |= StoreChanges::MARKERS;
        tracing::debug!(id = %marker.id, position = %position, "marker added");
        marker
    }

    /// Selects `id`. Unknown ids are ignored.
    pub fn select(&mut self, id: MarkerId) {
        if !self.contains(id) {
            tracing::debug!(id = %id, "select ignored: stale marker reference");
            return;
        }
        if self.selected != Some(id) {
            self.selected = Some(id);
            self.changes |= StoreChanges::SELECTION;
            tracing::debug!(id = %id, "marker selected");
        }
    }

    pub fn clear_selection(&mut self) {
        if self.selected.take().is_some() {
            self.changes |= StoreChanges::SELECTION;
            tracing::debug!("selection cleared");
        }
    }

    pub fn current_selection(&self) -> Option<&Marker> {
        self.selected.and_then(|id| self.get(id))
    }

    /// The selected marker with whatever details are known about it.
    pub fn current_details(&self) -> Option<MarkerDetails> {
        self.current_selection().map(|marker| MarkerDetails {
            marker: marker.clone(),
            address: self.addresses.get(&marker.id).cloned(),
        })
    }

    pub fn selected_id(&self) -> Option<MarkerId> {
        self.selected
    }

    /// Removes one marker, clearing the selection if it pointed at it.
    pub fn remove(&mut self, id: MarkerId) -> Option<Marker> {
        let index = self.markers.iter().position(|m| m.id == id)?;
        let removed = self.markers.remove(index);
        self.addresses.remove(&id);
        self.changes |= StoreChanges::MARKERS;
        if self.selected == Some(id) {
            self.selected = None;
            self.changes |= StoreChanges::SELECTION;
        }
        tracing::debug!(id = %id, "marker removed");
        Some(removed)
    }

    /// Removes every marker. Ids keep counting up afterwards.
    pub fn clear(&mut self) {
        if self.markers.is_empty() {
            return;
        }
        self.markers.clear();
        self.addresses.clear();
        self.changes |= StoreChanges::MARKERS;
        if self.selected.take().is_some() {
            self.changes |= StoreChanges::SELECTION;
        }
        tracing::debug!("markers cleared");
    }

    /// Attaches a resolved address. Returns `false` for removed markers.
    pub fn set_address(&mut self, id: MarkerId, address: String) -> bool {
        if !self.contains(id) {
            tracing::debug!(id = %id, "address ignored: stale marker reference");
            return false;
        }
        self.addresses.insert(id, address);
        if self.selected == Some(id) {
            self.changes |= StoreChanges::SELECTION;
        }
        true
    }

    pub fn address(&self, id: MarkerId) -> Option<&str> {
        self.addresses.get(&id).map(String::as_str)
    }

    pub fn get(&self, id: MarkerId) -> Option<&Marker> {
        self.markers.iter().find(|m| m.id == id)
    }

    pub fn contains(&self, id: MarkerId) -> bool {
        self.get(id).is_some()
    }

    /// All markers in insertion order.
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Returns and resets the pending change set.
    pub fn take_changes(&mut self) -> StoreChanges {
        std::mem::take(&mut self.changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    #[test]
    fn keeps_insertion_order_and_exact_positions() {
        let mut store = MarkerStore::new();
        let clicks = [at(42.0, -71.0), at(42.1, -71.1), at(-33.9, 151.2)];
        for c in clicks {
            store.add(c);
        }
        assert_eq!(store.len(), clicks.len());
        for (marker, click) in store.markers().iter().zip(clicks) {
            assert_eq!(marker.position, click);
        }
    }

    #[test]
    fn ids_are_unique_under_rapid_adds() {
        let mut store = MarkerStore::new();
        let ids: Vec<_> = (0..1000).map(|_| store.add(at(0.0, 0.0)).id).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), ids.len());
    }

    #[test]
    fn selecting_unknown_id_is_a_noop() {
        let mut store = MarkerStore::new();
        let m = store.add(at(1.0, 1.0));
        store.select(m.id);
        store.take_changes();

        store.select(MarkerId::from(999));
        assert_eq!(store.selected_id(), Some(m.id));
        assert!(store.take_changes().is_empty());
    }

    #[test]
    fn clear_selection_is_idempotent() {
        let mut store = MarkerStore::new();
        let m = store.add(at(1.0, 1.0));
        store.select(m.id);
        store.clear_selection();
        store.clear_selection();
        assert!(store.current_selection().is_none());
    }

    #[test]
    fn removing_selected_marker_clears_selection() {
        let mut store = MarkerStore::new();
        let a = store.add(at(1.0, 1.0));
        let b = store.add(at(2.0, 2.0));
        store.select(b.id);
        store.take_changes();

        assert_eq!(store.remove(b.id).map(|m| m.id), Some(b.id));
        assert!(store.current_selection().is_none());
        assert_eq!(store.take_changes(), StoreChanges::MARKERS | StoreChanges::SELECTION);

        // survivors keep their identity, new ids do not reuse removed ones
        assert_eq!(store.markers()[0].id, a.id);
        let c = store.add(at(3.0, 3.0));
        assert_ne!(c.id, b.id);
    }

    #[test]
    fn removing_other_marker_keeps_selection() {
        let mut store = MarkerStore::new();
        let a = store.add(at(1.0, 1.0));
        let b = store.add(at(2.0, 2.0));
        store.select(a.id);
        store.remove(b.id);
        assert_eq!(store.current_selection().map(|m| m.id), Some(a.id));
    }

    #[test]
    fn addresses_follow_marker_lifetime() {
        let mut store = MarkerStore::new();
        let a = store.add(at(1.0, 1.0));
        store.select(a.id);
        assert!(store.set_address(a.id, "Somewhere".into()));
        assert_eq!(
            store.current_details().and_then(|d| d.address).as_deref(),
            Some("Somewhere")
        );

        store.clear();
        assert!(store.is_empty());
        assert!(store.current_selection().is_none());
        assert!(!store.set_address(a.id, "Gone".into()));
    }
}
