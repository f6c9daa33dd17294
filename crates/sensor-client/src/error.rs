//! Reading Provider Error Types

use thiserror::Error;

/// Errors that can occur while fetching a pressure reading
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Transport failure (connect, DNS, timeout)
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Upstream answered with a non-success status
    #[error("Upstream returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// Payload could not be decoded
    #[error("Malformed payload: {0}")]
    Payload(String),

    /// Timestamp field is not a valid ISO-8601 instant
    #[error("Invalid timestamp {value:?}: {reason}")]
    Timestamp { value: String, reason: String },

    /// Pressure value outside the plausible range
    #[error("Pressure {value} hPa is out of range [{min}, {max}]")]
    OutOfRange { value: f64, min: f64, max: f64 },
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::Payload(err.to_string())
    }
}
