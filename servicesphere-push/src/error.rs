//! Push delivery error types.

use thiserror::Error;

/// Result type for push operations.
pub type Result<T> = std::result::Result<T, PushError>;

/// Push delivery errors.
#[derive(Debug, Error)]
pub enum PushError {
    /// Device token rejected as malformed.
    #[error("Invalid device token: {0}")]
    InvalidToken(String),

    /// Device unregistered.
    #[error("Device unregistered: {0}")]
    Unregistered(String),

    /// Authentication error.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Rate limited.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Provider error.
    #[error("Provider error: {0}")]
    Provider(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network error.
    #[error("Network error: {0}")]
    Network(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Timeout error.
    #[error("Operation timed out")]
    Timeout,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PushError {
    /// Check if this error means the stored token should be discarded.
    pub fn should_remove_device(&self) -> bool {
        matches!(self, Self::Unregistered(_) | Self::InvalidToken(_))
    }
}

impl From<reqwest::Error> for PushError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Network(err.to_string())
        } else {
            Self::Provider(err.to_string())
        }
    }
}

impl From<serde_json::Error> for PushError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
