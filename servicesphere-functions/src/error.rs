//! Runtime error types.

use servicesphere_firestore::FirestoreError;
use servicesphere_push::PushError;
use thiserror::Error;

use crate::config::ConfigError;

/// Result type for runtime operations.
pub type Result<T> = std::result::Result<T, FunctionError>;

/// Runtime errors.
#[derive(Debug, Error)]
pub enum FunctionError {
    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Trigger payload could not be decoded.
    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    /// Firestore client setup failed.
    #[error("Firestore error: {0}")]
    Firestore(#[from] FirestoreError),

    /// Push client setup failed.
    #[error("Push error: {0}")]
    Push(#[from] PushError),

    /// Server error.
    #[error("Server error: {0}")]
    Server(String),
}

impl From<serde_json::Error> for FunctionError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidEvent(err.to_string())
    }
}
