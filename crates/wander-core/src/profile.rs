//! Routing profiles and their sync state against the remote service.

use serde::{Deserialize, Serialize};

/// Profile assumed when none is configured or shared.
pub const DEFAULT_PROFILE: &str = "trekking";

/// Namespace prefix for uploaded custom profiles, so they never
/// collide with the service's built-in ones.
pub const REMOTE_PROFILE_PREFIX: &str = "wander_";

/// A named scoring configuration for the routing service.
///
/// Built-in profiles live on the service already and are referenced by
/// bare name. Custom bodies must be uploaded under a namespaced remote
/// name before a routing request can reference them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingProfile {
    name: String,
    body: String,
    builtin: bool,
    /// Whether the remote service currently holds this exact body
    /// under the derived name.
    #[serde(skip)]
    synced: bool,
}

impl Default for RoutingProfile {
    fn default() -> Self {
        Self::builtin(DEFAULT_PROFILE)
    }
}

impl RoutingProfile {
    /// A profile body that must be uploaded before use.
    pub fn custom(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: body.into(),
            builtin: false,
            synced: false,
        }
    }

    /// A profile the service ships with; no upload needed.
    pub fn builtin(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: String::new(),
            builtin: true,
            synced: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn is_synced(&self) -> bool {
        self.synced
    }

    /// Name the remote service knows this profile by.
    pub fn remote_name(&self) -> String {
        if self.builtin {
            self.name.clone()
        } else {
            format!("{REMOTE_PROFILE_PREFIX}{}", self.name)
        }
    }

    pub fn needs_upload(&self) -> bool {
        !self.builtin && !self.synced
    }

    /// Replacing the body always invalidates the remote copy.
    pub fn set_body(&mut self, body: impl Into<String>) {
        self.body = body.into();
        self.builtin = false;
        self.synced = false;
    }

    pub fn mark_synced(&mut self) {
        self.synced = true;
    }
}
