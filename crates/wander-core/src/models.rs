//! Core data models for the route planner.

use serde::{Deserialize, Serialize};

/// A geographic coordinate in floating point degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// A named stop the route passes through, in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Waypoint {
    pub coordinate: LatLng,
    pub name: String,
    /// Position index within the owning list; see [`renumber`].
    pub ordinal: usize,
    /// Transient UI flag, not part of persisted state.
    #[serde(skip)]
    pub highlight: bool,
}

impl Waypoint {
    pub fn new(coordinate: LatLng, name: impl Into<String>, ordinal: usize) -> Self {
        Self {
            coordinate,
            name: name.into(),
            ordinal,
            highlight: false,
        }
    }
}

/// Restore the `ordinal == index` invariant after a list mutation.
pub fn renumber(waypoints: &mut [Waypoint]) {
    for (index, waypoint) in waypoints.iter_mut().enumerate() {
        waypoint.ordinal = index;
    }
}

/// Insert a waypoint, renumbering positions at or after the change.
pub fn insert_waypoint(waypoints: &mut Vec<Waypoint>, index: usize, waypoint: Waypoint) {
    let index = index.min(waypoints.len());
    waypoints.insert(index, waypoint);
    renumber(waypoints);
}

/// Remove the waypoint at `index`, renumbering the tail.
pub fn remove_waypoint(waypoints: &mut Vec<Waypoint>, index: usize) -> Option<Waypoint> {
    if index >= waypoints.len() {
        return None;
    }
    let removed = waypoints.remove(index);
    renumber(waypoints);
    Some(removed)
}

/// Move the waypoint at `from` to position `to` (drag-reorder).
pub fn move_waypoint(waypoints: &mut Vec<Waypoint>, from: usize, to: usize) {
    if from >= waypoints.len() || to >= waypoints.len() || from == to {
        return;
    }
    let waypoint = waypoints.remove(from);
    waypoints.insert(to, waypoint);
    renumber(waypoints);
}
