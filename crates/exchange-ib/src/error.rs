//! Error types for the IB gateway adapter.

use thiserror::Error;
use wheel_advisor_core::WheelError;

/// Errors that can occur when talking to the IB gateway.
#[derive(Debug, Error)]
pub enum IbError {
    /// No gateway session has been opened.
    #[error("gateway session not open")]
    NotConnected,

    /// Gateway answered with a non-success status.
    #[error("gateway error: {status_code} - {message}")]
    Api {
        /// HTTP status code.
        status_code: u16,
        /// Response body.
        message: String,
    },

    /// Network error.
    #[error("network error: {0}")]
    Network(String),

    /// Request timeout.
    #[error("request timeout: {0}")]
    Timeout(String),

    /// Response body did not match the expected shape.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Contract specification the gateway cannot express.
    #[error("contract error: {0}")]
    Contract(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl IbError {
    /// Creates an API error from status code and message.
    pub fn api(status_code: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status_code,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for IbError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::Network(format!("connection failed: {err}"))
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for IbError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<IbError> for WheelError {
    fn from(err: IbError) -> Self {
        match err {
            IbError::NotConnected => WheelError::ConnectionFailed(err.to_string()),
            IbError::Contract(msg) => WheelError::Unqualified(msg),
            other => WheelError::Provider(other.to_string()),
        }
    }
}

/// Result type alias for gateway operations.
pub type Result<T> = std::result::Result<T, IbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = IbError::api(401, "not authenticated");
        assert!(err.to_string().contains("401"));
        assert!(err.to_string().contains("not authenticated"));
    }

    #[test]
    fn test_conversion_into_wheel_error() {
        assert!(matches!(
            WheelError::from(IbError::NotConnected),
            WheelError::ConnectionFailed(_)
        ));
        assert_eq!(
            WheelError::from(IbError::Contract("XYZ 20260320 90 P".into())),
            WheelError::Unqualified("XYZ 20260320 90 P".into())
        );
        assert!(matches!(
            WheelError::from(IbError::Timeout("5s".into())),
            WheelError::Provider(_)
        ));
    }
}
