//! Error types for the spread arbitrage system

use thiserror::Error;

use crate::types::Venue;

/// Main error type for the arbitrage system
#[derive(Error, Debug)]
pub enum ArbitrageError {
    /// The observation's source format is not a recognized encoding.
    #[error("Invalid price format: {0}")]
    InvalidPriceFormat(String),

    /// Decoding produced a value that is zero, negative or non-finite.
    #[error("Non-positive price from {venue}: {value}")]
    NonPositivePrice { venue: Venue, value: f64 },

    /// A positive price too large or too small to hold as a `Decimal`.
    #[error("Price from {venue} outside the representable range: {value}")]
    PriceOutOfRange { venue: Venue, value: f64 },

    /// The evaluator (or a request builder) was handed inputs it cannot use.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Price fetch error: {0}")]
    PriceFetch(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Rate limited by {0}")]
    RateLimited(String),
}

impl ArbitrageError {
    /// Whether the failure is transient and the underlying fetch may be retried.
    ///
    /// Validation failures describe a malformed observation and never are.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ArbitrageError::PriceFetch(_) | ArbitrageError::Http(_) | ArbitrageError::RateLimited(_)
        )
    }

    /// Whether this is one of the local validation failures raised by the core.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ArbitrageError::InvalidPriceFormat(_)
                | ArbitrageError::NonPositivePrice { .. }
                | ArbitrageError::PriceOutOfRange { .. }
                | ArbitrageError::InvalidInput(_)
        )
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for ArbitrageError {
    fn from(e: reqwest::Error) -> Self {
        ArbitrageError::Http(e.to_string())
    }
}

/// Result type alias for arbitrage operations
pub type ArbitrageResult<T> = Result<T, ArbitrageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_kinds() {
        assert!(ArbitrageError::PriceFetch("timeout".into()).is_retryable());
        assert!(ArbitrageError::RateLimited("coingecko".into()).is_retryable());
        assert!(!ArbitrageError::InvalidInput("zero".into()).is_retryable());
        assert!(!ArbitrageError::NonPositivePrice {
            venue: Venue::B,
            value: 0.0
        }
        .is_retryable());
    }

    #[test]
    fn test_validation_kinds() {
        assert!(ArbitrageError::InvalidPriceFormat("x".into()).is_validation());
        assert!(ArbitrageError::PriceOutOfRange {
            venue: Venue::A,
            value: 1e29
        }
        .is_validation());
        assert!(!ArbitrageError::Config("x".into()).is_validation());
    }

    #[test]
    fn test_error_display() {
        let err = ArbitrageError::NonPositivePrice {
            venue: Venue::A,
            value: -1.0,
        };
        assert_eq!(err.to_string(), "Non-positive price from Venue A: -1");

        let err = ArbitrageError::PriceOutOfRange {
            venue: Venue::B,
            value: 1e29,
        };
        assert!(!err.to_string().contains("Non-positive"));
    }
}
