//! The route aggregate and its incremental update algorithm.

use std::collections::BTreeMap;
use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::models::{LatLng, Waypoint};
use crate::profile::RoutingProfile;
use crate::segment::{Position, Route};

/// Failure of a route update.
#[derive(Debug, Error)]
pub enum RoutingError {
    /// The routing service answered with a non-2xx status.
    #[error("routing service returned {status}: {body}")]
    Service { status: u16, body: String },
    /// The request never completed.
    #[error("failed to reach routing service: {0}")]
    Transport(String),
    /// The update was superseded by a newer one.
    #[error("route update cancelled")]
    Cancelled,
}

/// Remote routing backend seam.
///
/// `fetch_route` returns the raw response body on success so the
/// engine owns response parsing; non-2xx statuses and transport
/// failures surface as [`RoutingError`].
pub trait RoutingService: Send + Sync {
    fn fetch_route(
        &self,
        from: &LatLng,
        to: &LatLng,
        profile: &str,
    ) -> impl Future<Output = Result<String, RoutingError>> + Send;

    fn upload_profile(
        &self,
        name: &str,
        body: &str,
    ) -> impl Future<Output = Result<(), RoutingError>> + Send;
}

/// The (name, body) pair a RouteSet was last computed under. A rename
/// or a body edit both force recomputation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ProfileBasis {
    name: String,
    body: String,
}

impl ProfileBasis {
    fn of(profile: &RoutingProfile) -> Self {
        Self {
            name: profile.name().to_string(),
            body: profile.body().to_string(),
        }
    }
}

/// The full multi-leg path across all waypoints: one [`Route`] per
/// adjacent pair, plus the waypoint list and profile it was computed
/// from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouteSet {
    routes: Vec<Route>,
    waypoints: Vec<Waypoint>,
    profile: Option<ProfileBasis>,
}

impl RouteSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes in pair order; `routes()[i]` connects waypoints `i` and
    /// `i + 1` of the last successful update.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// The waypoint list the routes were computed from.
    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    /// Sum of all route distances in meters.
    pub fn total_distance(&self) -> f64 {
        self.routes.iter().map(Route::distance).sum()
    }

    /// Flattened per-segment geometry across all routes, for map
    /// rendering.
    pub fn all_geometry(&self) -> Vec<Vec<Position>> {
        self.routes
            .iter()
            .flat_map(|route| route.segments.iter().map(|segment| segment.points.clone()))
            .collect()
    }

    /// Distance per surface tag, in meters.
    pub fn surface_breakdown(&self) -> BTreeMap<String, f64> {
        self.breakdown(|segment| segment.message.surface())
    }

    /// Distance per way type, in meters.
    pub fn way_type_breakdown(&self) -> BTreeMap<String, f64> {
        self.breakdown(|segment| segment.message.way_type())
    }

    fn breakdown(&self, key: impl Fn(&crate::segment::RouteSegment) -> &str) -> BTreeMap<String, f64> {
        let mut totals = BTreeMap::new();
        for route in &self.routes {
            for segment in &route.segments {
                *totals.entry(key(segment).to_string()).or_insert(0.0) +=
                    segment.message.distance;
            }
        }
        totals
    }

    /// Flag every segment whose surface or way type equals `label`;
    /// clears the flag everywhere else. An empty label clears all.
    pub fn highlight_matching(&mut self, label: &str) {
        for route in &mut self.routes {
            for segment in &mut route.segments {
                segment.highlight = !label.is_empty()
                    && (segment.message.surface() == label
                        || segment.message.way_type() == label);
            }
        }
    }

    /// Recompute routes for a new waypoint list, reusing every pair
    /// whose endpoints and profile are unchanged.
    pub async fn update<S: RoutingService>(
        &mut self,
        waypoints: Vec<Waypoint>,
        profile: &mut RoutingProfile,
        service: &S,
    ) -> Result<Vec<usize>, RoutingError> {
        self.update_with_cancel(waypoints, profile, service, &CancellationToken::new())
            .await
    }

    /// Like [`RouteSet::update`], bailing out with
    /// [`RoutingError::Cancelled`] when the token fires. Cancellation
    /// is observed before each pair request is issued and again before
    /// its response is applied, so a superseded update never writes a
    /// stale route.
    ///
    /// Per-pair requests are strictly sequential; on a service error
    /// the update aborts immediately, keeping the already-updated
    /// prefix but not the new comparison basis.
    pub async fn update_with_cancel<S: RoutingService>(
        &mut self,
        waypoints: Vec<Waypoint>,
        profile: &mut RoutingProfile,
        service: &S,
        cancel: &CancellationToken,
    ) -> Result<Vec<usize>, RoutingError> {
        let basis = ProfileBasis::of(profile);

        if waypoints.len() < 2 {
            self.routes.clear();
            self.waypoints = waypoints;
            self.profile = Some(basis);
            return Ok(Vec::new());
        }

        // Route slots beyond the new pair count belong to waypoints
        // that no longer exist.
        self.routes.truncate(waypoints.len() - 1);

        let profile_unchanged = self.profile.as_ref() == Some(&basis);
        let mut updated = Vec::new();

        for i in 1..waypoints.len() {
            let slot = i - 1;
            let pair_unchanged = profile_unchanged
                && self.routes.len() > slot
                && self
                    .waypoints
                    .get(slot)
                    .is_some_and(|w| w.coordinate == waypoints[slot].coordinate)
                && self
                    .waypoints
                    .get(i)
                    .is_some_and(|w| w.coordinate == waypoints[i].coordinate);
            if pair_unchanged {
                tracing::debug!(pair = slot, "pair unchanged, reusing route");
                continue;
            }

            if cancel.is_cancelled() {
                return Err(RoutingError::Cancelled);
            }

            // The service must hold the profile by name before a
            // request can reference it.
            if profile.needs_upload() {
                match service
                    .upload_profile(&profile.remote_name(), profile.body())
                    .await
                {
                    Ok(()) => profile.mark_synced(),
                    Err(err) => {
                        tracing::warn!(
                            profile = profile.name(),
                            %err,
                            "profile upload failed, continuing unsynced"
                        );
                    }
                }
            }

            let body = service
                .fetch_route(
                    &waypoints[slot].coordinate,
                    &waypoints[i].coordinate,
                    &profile.remote_name(),
                )
                .await?;

            if cancel.is_cancelled() {
                return Err(RoutingError::Cancelled);
            }

            let route = match Route::from_response(&body) {
                Ok(route) => route,
                Err(err) => {
                    tracing::warn!(pair = slot, %err, "malformed routing response, no route produced");
                    Route::default()
                }
            };
            if self.routes.len() > slot {
                self.routes[slot] = route;
            } else {
                self.routes.push(route);
            }
            updated.push(slot);
        }

        self.waypoints = waypoints;
        self.profile = Some(basis);
        Ok(updated)
    }
}
