//! FX engine error types.

use ratewise_common::CurrencyPair;
use thiserror::Error;

/// Errors that can occur while resolving rates and converting amounts.
#[derive(Debug, Error)]
pub enum FxError {
    /// Empty base or quote currency code.
    #[error("Invalid currency code: {0}")]
    InvalidCurrencyCode(String),

    /// Negative, NaN, infinite or unrepresentable amount.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Missing API key or unusable configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A request could not be constructed from the given input.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Transport-level failure (timeout, DNS, connection reset).
    #[error("Network error: {0}")]
    Network(String),

    /// Remote source answered with a non-success status.
    #[error("HTTP status {status}")]
    Http { status: u16 },

    /// Response body was not the JSON we expected.
    #[error("Malformed response: {0}")]
    Decode(String),

    /// Well-formed response that lacks a usable rate.
    #[error("Data error: {0}")]
    Data(String),

    /// Every allowed attempt failed with a retryable error.
    #[error("Gave up after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: Box<FxError> },

    /// The caller cancelled the operation.
    #[error("Operation cancelled")]
    Cancelled,

    /// Fetching failed and there is no cached rate to fall back to.
    #[error("No cached rate available for {pair}: {source}")]
    NoCacheAvailable {
        pair: CurrencyPair,
        #[source]
        source: Box<FxError>,
    },

    /// The rate or history store malfunctioned.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl FxError {
    /// Check if this error is worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            FxError::Network(_) => true,
            FxError::Http { status } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Get a stable error code for display and logs.
    pub fn error_code(&self) -> &'static str {
        match self {
            FxError::InvalidCurrencyCode(_) => "INVALID_CURRENCY_CODE",
            FxError::InvalidAmount(_) => "INVALID_AMOUNT",
            FxError::Configuration(_) => "CONFIGURATION_ERROR",
            FxError::InvalidRequest(_) => "INVALID_REQUEST",
            FxError::Network(_) => "NETWORK_ERROR",
            FxError::Http { .. } => "HTTP_ERROR",
            FxError::Decode(_) => "DECODE_ERROR",
            FxError::Data(_) => "DATA_ERROR",
            FxError::RetriesExhausted { .. } => "RETRIES_EXHAUSTED",
            FxError::Cancelled => "CANCELLED",
            FxError::NoCacheAvailable { .. } => "NO_CACHE_AVAILABLE",
            FxError::Storage(_) => "STORAGE_ERROR",
        }
    }
}

impl From<serde_json::Error> for FxError {
    fn from(e: serde_json::Error) -> Self {
        FxError::Decode(e.to_string())
    }
}

/// Result type for FX operations.
pub type FxResult<T> = Result<T, FxError>;
