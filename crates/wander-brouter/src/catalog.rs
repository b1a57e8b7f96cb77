//! Remote catalog of ready-made custom profiles.
//!
//! The catalog is a statically served directory: `profiles.json`
//! holds a JSON array of profile names, and each name has a
//! plain-text `{name}.brf` body next to it.

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use wander_core::RoutingProfile;

#[derive(Debug)]
pub struct ProfileCatalog {
    client: Client,
    base_url: String,
    names: Vec<String>,
}

impl ProfileCatalog {
    /// Download the profile listing from `{base_url}/profiles.json`.
    pub async fn fetch(base_url: &str) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let client = Client::new();
        let url = format!("{base_url}/profiles.json");
        let names: Vec<String> = client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch profile listing from {url}"))?
            .error_for_status()
            .context("Profile listing request failed")?
            .json()
            .await
            .context("Failed to parse profile listing")?;
        tracing::debug!(profiles = names.len(), "loaded profile catalog");
        Ok(Self {
            client,
            base_url,
            names,
        })
    }

    /// Listed profile names, in document order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Fetch a listed profile's body and wrap it as an unsynced
    /// custom profile.
    pub async fn load(&self, name: &str) -> Result<RoutingProfile> {
        if !self.names.iter().any(|listed| listed == name) {
            return Err(anyhow!(
                "profile {name:?} not in catalog (available: {})",
                self.names.join(", ")
            ));
        }
        let url = format!("{}/{name}.brf", self.base_url);
        let body = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch profile body from {url}"))?
            .error_for_status()
            .with_context(|| format!("Profile body request for {name:?} failed"))?
            .text()
            .await
            .context("Failed to read profile body")?;
        Ok(RoutingProfile::custom(name, body))
    }
}
