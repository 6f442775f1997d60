//! Error taxonomy shared by every resolver and entry point.
//!
//! Provider adapters convert their own failures into [`WheelError`] at the
//! trait boundary, so nothing raw crosses a component edge.

use thiserror::Error;

/// Errors surfaced by market-data acquisition and the decision engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WheelError {
    /// A broker session could not be established.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Neither provider produced a usable price.
    #[error("no price data for {symbol}")]
    NoPriceData {
        /// Requested underlying symbol.
        symbol: String,
    },

    /// The option chain was empty or could not be resolved.
    #[error("no option data for {symbol}: {reason}")]
    NoOptionData {
        /// Requested underlying symbol.
        symbol: String,
        /// What was missing.
        reason: String,
    },

    /// The broker rejected a contract specification.
    #[error("contract could not be qualified: {0}")]
    Unqualified(String),

    /// Unexpected provider failure, original cause kept as text.
    #[error("provider error: {0}")]
    Provider(String),

    /// Caller supplied an argument the engine cannot use.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl WheelError {
    /// Creates a no-price error for a symbol.
    pub fn no_price(symbol: impl Into<String>) -> Self {
        Self::NoPriceData {
            symbol: symbol.into(),
        }
    }

    /// Creates a no-option-data error.
    pub fn no_option_data(symbol: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::NoOptionData {
            symbol: symbol.into(),
            reason: reason.into(),
        }
    }

    /// Wraps an unexpected provider failure.
    pub fn provider(cause: impl std::fmt::Display) -> Self {
        Self::Provider(cause.to_string())
    }

    /// Creates a connection failure.
    pub fn connection_failed(cause: impl std::fmt::Display) -> Self {
        Self::ConnectionFailed(cause.to_string())
    }

    /// Returns true when the failure should send a price lookup to the
    /// secondary provider instead of ending the request.
    #[must_use]
    pub fn is_fallback_trigger(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed(_) | Self::Unqualified(_) | Self::Provider(_)
        )
    }
}

/// Result alias for wheel advisor operations.
pub type Result<T> = std::result::Result<T, WheelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_price_display() {
        let err = WheelError::no_price("XYZ");
        assert_eq!(err.to_string(), "no price data for XYZ");
    }

    #[test]
    fn test_no_option_data_display() {
        let err = WheelError::no_option_data("XYZ", "empty put chain");
        assert!(err.to_string().contains("XYZ"));
        assert!(err.to_string().contains("empty put chain"));
    }

    #[test]
    fn test_provider_keeps_cause() {
        let err = WheelError::provider("socket reset by peer");
        assert_eq!(
            err,
            WheelError::Provider("socket reset by peer".to_string())
        );
    }

    #[test]
    fn test_fallback_triggers() {
        assert!(WheelError::connection_failed("refused").is_fallback_trigger());
        assert!(WheelError::Unqualified("XYZ".into()).is_fallback_trigger());
        assert!(WheelError::provider("boom").is_fallback_trigger());
        assert!(!WheelError::no_price("XYZ").is_fallback_trigger());
        assert!(!WheelError::InvalidInput("otm".into()).is_fallback_trigger());
    }
}
