//! Day-ahead price fetching
//!
//! [`PriceSource`] is the single seam between the coordinator and the
//! upstream. [`EntsoeClient`] talks to the Transparency Platform; tests
//! script their own sources.

pub mod document;
mod entsoe;

pub use entsoe::EntsoeClient;

use crate::areas::AreaConfig;
use crate::error::Result;
use crate::prices::PriceSeries;
use chrono::{DateTime, Utc};

/// Fetches raw day-ahead prices (currency per MWh, UTC starts) for an area.
///
/// Implementations report failures as `Auth`, `NoData` or `Transport` and
/// never retry on their own.
#[async_trait::async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch(
        &self,
        area: &AreaConfig,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<PriceSeries>;
}
