//! Shared helpers for the wander CLI binaries.

use anyhow::{anyhow, Context, Result};
use wander_core::{LatLng, Waypoint};

/// Parse a `lat,lng[,name]` waypoint argument. The name defaults to
/// the waypoint's 1-based position.
pub fn parse_waypoint(arg: &str, ordinal: usize) -> Result<Waypoint> {
    let mut parts = arg.splitn(3, ',');
    let lat = parts
        .next()
        .ok_or_else(|| anyhow!("empty waypoint argument"))?;
    let lng = parts
        .next()
        .ok_or_else(|| anyhow!("waypoint {arg:?} is missing a longitude"))?;
    let name = parts
        .next()
        .map(str::to_string)
        .unwrap_or_else(|| format!("Waypoint {}", ordinal + 1));

    let lat: f64 = lat
        .trim()
        .parse()
        .with_context(|| format!("invalid latitude in waypoint {arg:?}"))?;
    let lng: f64 = lng
        .trim()
        .parse()
        .with_context(|| format!("invalid longitude in waypoint {arg:?}"))?;
    Ok(Waypoint::new(LatLng::new(lat, lng), name, ordinal))
}
