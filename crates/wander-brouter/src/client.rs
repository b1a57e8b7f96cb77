//! brouter HTTP client.

use std::time::Duration;

use reqwest::Client;
use wander_core::{LatLng, RoutingError, RoutingService};

/// HTTP client for a brouter-compatible routing service.
///
/// `base_url` points at the routing endpoint itself, e.g.
/// `https://brouter.de/brouter`; profile uploads go to
/// `{base_url}/profile/{name}`.
pub struct BrouterClient {
    client: Client,
    base_url: String,
}

impl BrouterClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.into(),
        }
    }

    /// brouter expects `lng,lat` pairs joined by `|`.
    fn lonlats(from: &LatLng, to: &LatLng) -> String {
        format!("{},{}|{},{}", from.lng, from.lat, to.lng, to.lat)
    }
}

impl RoutingService for BrouterClient {
    async fn fetch_route(
        &self,
        from: &LatLng,
        to: &LatLng,
        profile: &str,
    ) -> Result<String, RoutingError> {
        tracing::debug!(profile, "requesting route");
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("lonlats", Self::lonlats(from, to).as_str()),
                ("profile", profile),
                ("alternativeidx", "0"),
                ("format", "geojson"),
            ])
            .send()
            .await
            .map_err(|err| RoutingError::Transport(err.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| RoutingError::Transport(err.to_string()))?;
        if !status.is_success() {
            return Err(RoutingError::Service {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    async fn upload_profile(&self, name: &str, body: &str) -> Result<(), RoutingError> {
        tracing::debug!(name, "uploading profile");
        let response = self
            .client
            .post(format!("{}/profile/{}", self.base_url, name))
            .header("Content-Type", "text/plain;charset=UTF-8")
            .body(body.to_string())
            .send()
            .await
            .map_err(|err| RoutingError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RoutingError::Service {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}
