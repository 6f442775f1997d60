//! Error types for the Yahoo Finance snapshot adapter.

use thiserror::Error;
use wheel_advisor_core::WheelError;

/// Errors that can occur when fetching snapshots.
#[derive(Debug, Error)]
pub enum YahooError {
    /// Symbol contains characters the API does not accept.
    #[error("invalid symbol: {0}")]
    InvalidSymbol(String),

    /// API request failed.
    #[error("API error: {status_code} - {message}")]
    Api {
        /// HTTP status code.
        status_code: u16,
        /// Error message from API.
        message: String,
    },

    /// Network error.
    #[error("network error: {0}")]
    Network(String),

    /// Request timeout.
    #[error("request timeout: {0}")]
    Timeout(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl YahooError {
    /// Creates an API error from status code and message.
    pub fn api(status_code: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status_code,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for YahooError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for YahooError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<YahooError> for WheelError {
    fn from(err: YahooError) -> Self {
        match err {
            YahooError::InvalidSymbol(symbol) => WheelError::InvalidInput(symbol),
            other => WheelError::Provider(other.to_string()),
        }
    }
}

/// Result type alias for snapshot operations.
pub type Result<T> = std::result::Result<T, YahooError>;
