//! Wander brouter - HTTP client for brouter-compatible routing
//! services.
//!
//! Implements the `wander_core::RoutingService` seam over the brouter
//! query protocol, plus a catalog loader for ready-made custom
//! profiles.

pub mod catalog;
pub mod client;

pub use catalog::ProfileCatalog;
pub use client::BrouterClient;
