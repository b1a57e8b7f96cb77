//! Shareable plan state encoded as a URL query string.
//!
//! Waypoints and the profile travel as URL-safe base64 over JSON; the
//! map view travels as plain `center` and `zoom` parameters. Decoding
//! is lenient per field: a missing or garbled parameter falls back to
//! its default instead of rejecting the whole link.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::models::{renumber, LatLng, Waypoint};
use crate::profile::RoutingProfile;

/// Map viewport carried alongside the plan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapView {
    pub center: LatLng,
    pub zoom: u8,
}

impl Default for MapView {
    fn default() -> Self {
        Self {
            center: LatLng::new(50.0, 9.0),
            zoom: 6,
        }
    }
}

/// Everything a share link restores.
#[derive(Debug, Clone, Default)]
pub struct ShareState {
    pub waypoints: Vec<Waypoint>,
    pub profile: RoutingProfile,
    pub view: MapView,
}

/// Serialize plan state into query-string form, without the leading
/// `?`.
pub fn encode_query(state: &ShareState) -> String {
    let mut parts = Vec::new();
    if !state.waypoints.is_empty() {
        parts.push(format!("waypoints={}", encode_json(&state.waypoints)));
    }
    parts.push(format!("profile={}", encode_json(&state.profile)));
    parts.push(format!(
        "center={},{}",
        state.view.center.lat, state.view.center.lng
    ));
    parts.push(format!("zoom={}", state.view.zoom));
    parts.join("&")
}

/// Restore plan state from a query string (with or without the
/// leading `?`). Unknown parameters are ignored; each known parameter
/// falls back to its default when absent or undecodable.
pub fn decode_query(query: &str) -> ShareState {
    let mut state = ShareState::default();
    for pair in query.trim_start_matches('?').split('&') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        match key {
            "waypoints" => {
                if let Some(waypoints) = decode_json::<Vec<Waypoint>>(key, value) {
                    state.waypoints = waypoints;
                }
            }
            "profile" => {
                if let Some(profile) = decode_json::<RoutingProfile>(key, value) {
                    state.profile = profile;
                }
            }
            "center" => {
                if let Some(center) = parse_center(value) {
                    state.view.center = center;
                } else {
                    tracing::warn!(value, "ignoring malformed center parameter");
                }
            }
            "zoom" => {
                if let Ok(zoom) = value.parse() {
                    state.view.zoom = zoom;
                } else {
                    tracing::warn!(value, "ignoring malformed zoom parameter");
                }
            }
            _ => {}
        }
    }
    // Ordinals from an untrusted link may be stale or duplicated.
    renumber(&mut state.waypoints);
    state
}

fn encode_json<T: Serialize>(value: &T) -> String {
    // Vec and struct serialization cannot fail.
    let json = serde_json::to_string(value).unwrap_or_default();
    URL_SAFE_NO_PAD.encode(json)
}

fn decode_json<T: DeserializeOwned>(key: &str, value: &str) -> Option<T> {
    let decoded = match URL_SAFE_NO_PAD.decode(value) {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::warn!(key, %err, "ignoring undecodable share parameter");
            return None;
        }
    };
    match serde_json::from_slice(&decoded) {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            tracing::warn!(key, %err, "ignoring malformed share parameter");
            None
        }
    }
}

fn parse_center(value: &str) -> Option<LatLng> {
    let (lat, lng) = value.split_once(',')?;
    Some(LatLng::new(lat.trim().parse().ok()?, lng.trim().parse().ok()?))
}
