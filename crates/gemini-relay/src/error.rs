//! Error types for gemini-relay

use reqwest::StatusCode;
use thiserror::Error;

/// Main error type for relay operations
#[derive(Error, Debug)]
pub enum RelayError {
    /// Malformed request data or an unrecognized safety setting
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration errors (missing credential, bad base URL, unreadable file)
    #[error("Configuration error: {0}")]
    Config(String),

    /// The provider answered with a non-success status
    #[error("Upstream error: {status}")]
    Upstream { status: StatusCode, body: String },

    /// Transport failure talking to the provider
    #[error("Network error: {0}")]
    Network(String),

    /// Failure while consuming the provider's chunk stream
    #[error("Stream error: {0}")]
    Stream(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl RelayError {
    /// Get the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            RelayError::Validation(_) => "validation",
            RelayError::Config(_) => "config",
            RelayError::Upstream { .. } => "upstream",
            RelayError::Network(_) => "network",
            RelayError::Stream(_) => "stream",
            RelayError::Io(_) => "io",
            RelayError::Serialization(_) => "serialization",
        }
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RelayError::Network(format!("Request timed out: {e}"))
        } else if e.is_connect() {
            RelayError::Network(format!("Failed to connect to provider: {e}"))
        } else {
            RelayError::Network(format!("Request failed: {e}"))
        }
    }
}

/// Result type alias for relay operations
pub type Result<T> = std::result::Result<T, RelayError>;
