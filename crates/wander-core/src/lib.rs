//! Wander core - route aggregation and incremental-update engine.
//!
//! Owns the ordered waypoint list, the brouter response parser and the
//! update algorithm that keeps a [`RouteSet`] consistent while edits
//! arrive. The remote routing backend is a trait seam
//! ([`RoutingService`]); see the `wander-brouter` crate for the HTTP
//! implementation.

pub mod models;
pub mod planner;
pub mod profile;
pub mod routeset;
pub mod segment;
pub mod share;

pub use models::{
    insert_waypoint, move_waypoint, remove_waypoint, renumber, LatLng, Waypoint,
};
pub use planner::RoutePlanner;
pub use profile::{RoutingProfile, DEFAULT_PROFILE, REMOTE_PROFILE_PREFIX};
pub use routeset::{RouteSet, RoutingError, RoutingService};
pub use segment::{
    MessageParseError, Position, Route, RouteSegment, SegmentMessage,
};
pub use share::{decode_query, encode_query, MapView, ShareState};
