//! # entsoe - ENTSO-e day-ahead prices as sensor entities
//!
//! Periodically retrieves day-ahead electricity prices for one bidding zone
//! from the ENTSO-e Transparency Platform, buckets them into today's and
//! tomorrow's hourly prices in the zone's local time, and republishes them
//! as self-refreshing sensor entities with restart-safe state.
//!
//! ## Architecture
//!
//! Data flows one way:
//!
//! - `areas`: bidding zone registry (codes, names, timezones)
//! - `client`: the `PriceSource` seam and the Transparency Platform client
//! - `coordinator`: periodic refresh, snapshot ownership and degraded mode
//! - `views`: pure derived views over a snapshot
//! - `sensor`: self-scheduling sensor entities
//! - `persistence`: stored sensor state for restoration
//! - `web`: HTTP API over the above
//!
//! Supporting modules:
//!
//! - `config`: YAML configuration and validation
//! - `logging`: structured logging and tracing
//! - `error`: error types
//! - `prices`: price series, snapshot and unit conversion

pub mod areas;
pub mod client;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod logging;
pub mod persistence;
pub mod prices;
pub mod sensor;
pub mod views;
#[cfg(feature = "web")]
pub mod web;

// Re-export commonly used types
pub use areas::AreaConfig;
pub use client::{EntsoeClient, PriceSource};
pub use config::Config;
pub use coordinator::{Coordinator, CoordinatorHandle, RefreshOutcome};
pub use error::{EntsoeError, Result};
pub use prices::{PricePoint, PriceSeries, Snapshot};
