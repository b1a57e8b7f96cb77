//! Single-flight coordinator for route updates.
//!
//! Waypoint edits can arrive faster than the routing service answers.
//! The planner serializes updates over one shared [`RouteSet`],
//! cancels any in-flight update when a newer one is requested, and
//! publishes an immutable snapshot after every attempt so observers
//! never see a half-applied state.

use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::models::Waypoint;
use crate::profile::RoutingProfile;
use crate::routeset::{RouteSet, RoutingError, RoutingService};

struct PlannerState {
    routes: RouteSet,
    profile: RoutingProfile,
}

pub struct RoutePlanner<S> {
    service: Arc<S>,
    state: Arc<tokio::sync::Mutex<PlannerState>>,
    snapshots: watch::Sender<RouteSet>,
    in_flight: Mutex<Option<CancellationToken>>,
}

impl<S> RoutePlanner<S>
where
    S: RoutingService + 'static,
{
    pub fn new(service: S, profile: RoutingProfile) -> Self {
        let (snapshots, _) = watch::channel(RouteSet::new());
        Self {
            service: Arc::new(service),
            state: Arc::new(tokio::sync::Mutex::new(PlannerState {
                routes: RouteSet::new(),
                profile,
            })),
            snapshots,
            in_flight: Mutex::new(None),
        }
    }

    /// Receiver of route snapshots. A new snapshot is published after
    /// every completed update attempt, successful or not.
    pub fn subscribe(&self) -> watch::Receiver<RouteSet> {
        self.snapshots.subscribe()
    }

    /// Snapshot of the current routes.
    pub fn current(&self) -> RouteSet {
        self.snapshots.borrow().clone()
    }

    /// Swap the active routing profile. The next update recomputes
    /// every pair against it.
    pub async fn set_profile(&self, profile: RoutingProfile) {
        self.state.lock().await.profile = profile;
    }

    /// Start an update for a new waypoint list, superseding any
    /// in-flight one. The superseded task resolves to
    /// [`RoutingError::Cancelled`].
    pub fn request_update(
        &self,
        waypoints: Vec<Waypoint>,
    ) -> JoinHandle<Result<Vec<usize>, RoutingError>> {
        let token = CancellationToken::new();
        {
            let mut in_flight = match self.in_flight.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if let Some(previous) = in_flight.replace(token.clone()) {
                previous.cancel();
            }
        }

        let service = Arc::clone(&self.service);
        let state = Arc::clone(&self.state);
        let snapshots = self.snapshots.clone();
        tokio::spawn(async move {
            let mut state = state.lock().await;
            let PlannerState { routes, profile } = &mut *state;
            let result = routes
                .update_with_cancel(waypoints, profile, service.as_ref(), &token)
                .await;
            // Publish even on failure: the kept prefix is real state.
            let _ = snapshots.send(routes.clone());
            if let Err(err) = &result {
                tracing::debug!(%err, "route update did not complete");
            }
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LatLng;
    use serde_json::json;
    use tokio::sync::{mpsc, Semaphore};

    /// Backend that parks every fetch on a semaphore and signals when
    /// a fetch has started, so tests control interleaving.
    struct GatedService {
        gate: Arc<Semaphore>,
        started: mpsc::UnboundedSender<()>,
    }

    impl RoutingService for GatedService {
        async fn fetch_route(
            &self,
            _from: &LatLng,
            to: &LatLng,
            _profile: &str,
        ) -> Result<String, RoutingError> {
            let _ = self.started.send(());
            let permit = self
                .gate
                .acquire()
                .await
                .map_err(|err| RoutingError::Transport(err.to_string()))?;
            permit.forget();
            Ok(response_for(to))
        }

        async fn upload_profile(&self, _: &str, _: &str) -> Result<(), RoutingError> {
            Ok(())
        }
    }

    fn response_for(to: &LatLng) -> String {
        let header = [
            "Longitude", "Latitude", "Elevation", "Distance", "CostPerKm", "ElevCost",
            "TurnCost", "NodeCost", "InitialCost", "WayTags", "NodeTags", "Time", "Energy",
        ];
        let message = [
            ((to.lng * 1e6).round() as i64).to_string(),
            ((to.lat * 1e6).round() as i64).to_string(),
            "10".into(),
            "100".into(),
            "0".into(),
            "0".into(),
            "0".into(),
            "0".into(),
            "0".into(),
            "highway=path".into(),
            "".into(),
            "10".into(),
            "0".into(),
        ];
        json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {"messages": [header, message]},
                "geometry": {
                    "type": "LineString",
                    "coordinates": [[to.lng - 0.01, to.lat - 0.01], [to.lng, to.lat]],
                },
            }],
        })
        .to_string()
    }

    fn waypoints(coords: &[(f64, f64)]) -> Vec<Waypoint> {
        coords
            .iter()
            .enumerate()
            .map(|(i, (lat, lng))| Waypoint::new(LatLng::new(*lat, *lng), format!("W{i}"), i))
            .collect()
    }

    #[tokio::test]
    async fn newer_update_supersedes_the_one_in_flight() {
        let gate = Arc::new(Semaphore::new(0));
        let (started, mut started_rx) = mpsc::unbounded_channel();
        let planner = RoutePlanner::new(
            GatedService {
                gate: Arc::clone(&gate),
                started,
            },
            RoutingProfile::builtin("trekking"),
        );

        let first = planner.request_update(waypoints(&[(53.6, 10.0), (53.61, 10.02)]));
        // Wait until the first update is blocked inside its fetch.
        started_rx.recv().await.unwrap();

        let second = planner.request_update(waypoints(&[
            (53.6, 10.0),
            (53.615, 10.025),
            (53.62, 10.05),
        ]));

        // Release all fetches; the first update observes its
        // cancellation when its fetch returns.
        gate.add_permits(8);

        let first_result = first.await.unwrap();
        assert!(matches!(first_result, Err(RoutingError::Cancelled)));

        let second_result = second.await.unwrap();
        assert_eq!(second_result.unwrap(), vec![0, 1]);

        let snapshot = planner.current();
        assert_eq!(snapshot.routes().len(), 2);
        assert_eq!(snapshot.total_distance(), 200.0);
    }

    #[tokio::test]
    async fn snapshots_are_published_to_subscribers() {
        let gate = Arc::new(Semaphore::new(8));
        let (started, _started_rx) = mpsc::unbounded_channel();
        let planner = RoutePlanner::new(
            GatedService { gate, started },
            RoutingProfile::builtin("trekking"),
        );
        let mut receiver = planner.subscribe();
        assert!(receiver.borrow().routes().is_empty());

        planner
            .request_update(waypoints(&[(53.6, 10.0), (53.61, 10.02)]))
            .await
            .unwrap()
            .unwrap();

        receiver.changed().await.unwrap();
        assert_eq!(receiver.borrow().routes().len(), 1);
    }

    #[tokio::test]
    async fn profile_swap_forces_full_recompute() {
        let gate = Arc::new(Semaphore::new(16));
        let (started, _started_rx) = mpsc::unbounded_channel();
        let planner = RoutePlanner::new(
            GatedService { gate, started },
            RoutingProfile::builtin("trekking"),
        );
        let wps = waypoints(&[(53.6, 10.0), (53.61, 10.02), (53.62, 10.05)]);

        let updated = planner.request_update(wps.clone()).await.unwrap().unwrap();
        assert_eq!(updated, vec![0, 1]);

        planner.set_profile(RoutingProfile::builtin("fastbike")).await;
        let updated = planner.request_update(wps).await.unwrap().unwrap();
        assert_eq!(updated, vec![0, 1]);
    }
}
