//! Error types and handling for the ENTSO-e price bridge
//!
//! This module defines the error types used throughout the application,
//! providing consistent error handling and reporting. The fetch-related
//! variants (`Auth`, `NoData`, `Transport`) form the contract of every
//! [`PriceSource`](crate::client::PriceSource); `StaleDataExpired` is raised by
//! the coordinator when cached prices can no longer be served.

use thiserror::Error;

/// Result type alias for price bridge operations
pub type Result<T> = std::result::Result<T, EntsoeError>;

/// Main error type for the price bridge
#[derive(Debug, Error)]
pub enum EntsoeError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The upstream rejected the API credential (HTTP 401)
    #[error("Authentication error: {message}")]
    Auth { message: String },

    /// The upstream has no data for the requested window (not yet published)
    #[error("No data available: {message}")]
    NoData { message: String },

    /// Network, timeout or protocol failures talking to the upstream
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// Cached prices have expired and no fresh prices could be fetched
    #[error("Stale data expired: {message}")]
    StaleDataExpired { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// File I/O errors
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Validation errors
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// Generic errors with context
    #[error("Error: {message}")]
    Generic { message: String },
}

impl EntsoeError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        EntsoeError::Config {
            message: message.into(),
        }
    }

    /// Create a new authentication error
    pub fn auth<S: Into<String>>(message: S) -> Self {
        EntsoeError::Auth {
            message: message.into(),
        }
    }

    /// Create a new no-data error
    pub fn no_data<S: Into<String>>(message: S) -> Self {
        EntsoeError::NoData {
            message: message.into(),
        }
    }

    /// Create a new transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        EntsoeError::Transport {
            message: message.into(),
        }
    }

    /// Create a new stale-data error
    pub fn stale_data_expired<S: Into<String>>(message: S) -> Self {
        EntsoeError::StaleDataExpired {
            message: message.into(),
        }
    }

    /// Create a new serialization error
    pub fn serialization<S: Into<String>>(message: S) -> Self {
        EntsoeError::Serialization {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(field: S, message: S) -> Self {
        EntsoeError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        EntsoeError::Io {
            message: message.into(),
        }
    }

    /// Create a new generic error
    pub fn generic<S: Into<String>>(message: S) -> Self {
        EntsoeError::Generic {
            message: message.into(),
        }
    }

    /// Whether this error marks the update cycle as failed for the platform.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            EntsoeError::Auth { .. } | EntsoeError::StaleDataExpired { .. }
        )
    }

    /// Whether this error allows serving previously fetched prices.
    pub fn is_recoverable_fetch_failure(&self) -> bool {
        matches!(
            self,
            EntsoeError::NoData { .. } | EntsoeError::Transport { .. }
        )
    }
}

impl From<std::io::Error> for EntsoeError {
    fn from(err: std::io::Error) -> Self {
        EntsoeError::io(err.to_string())
    }
}

impl From<serde_yaml::Error> for EntsoeError {
    fn from(err: serde_yaml::Error) -> Self {
        EntsoeError::serialization(err.to_string())
    }
}

impl From<serde_json::Error> for EntsoeError {
    fn from(err: serde_json::Error) -> Self {
        EntsoeError::serialization(err.to_string())
    }
}

impl From<reqwest::Error> for EntsoeError {
    fn from(err: reqwest::Error) -> Self {
        if err.status() == Some(reqwest::StatusCode::UNAUTHORIZED) {
            return EntsoeError::auth("Unauthorized: please check your API key");
        }
        EntsoeError::transport(err.to_string())
    }
}

impl From<quick_xml::DeError> for EntsoeError {
    fn from(err: quick_xml::DeError) -> Self {
        EntsoeError::transport(format!("malformed document: {}", err))
    }
}

impl From<chrono::ParseError> for EntsoeError {
    fn from(err: chrono::ParseError) -> Self {
        EntsoeError::validation("datetime".to_string(), err.to_string())
    }
}
