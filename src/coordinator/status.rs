use chrono::{DateTime, Utc};
use serde::Serialize;

/// Result of one refresh cycle that did not fail outright
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum RefreshOutcome {
    /// A fresh snapshot replaced the previous one
    Updated,
    /// The fetch failed; still-valid cached prices are served
    Degraded,
    /// The fetch failed before any data was ever obtained
    Unavailable,
    /// The coordinator was torn down while the fetch was in flight
    Discarded,
}

/// Health of the most recent refresh, published next to the snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateStatus {
    /// False after an auth failure or once cached data has expired
    pub last_update_success: bool,
    pub last_error: Option<String>,
    pub last_outcome: Option<RefreshOutcome>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>))]
    pub last_attempt: Option<DateTime<Utc>>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>))]
    pub last_success: Option<DateTime<Utc>>,
}

impl Default for UpdateStatus {
    fn default() -> Self {
        Self {
            last_update_success: true,
            last_error: None,
            last_outcome: None,
            last_attempt: None,
            last_success: None,
        }
    }
}
