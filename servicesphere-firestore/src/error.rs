//! Firestore error types.

use servicesphere_notify::NotifyError;
use thiserror::Error;

/// Result type for Firestore operations.
pub type Result<T> = std::result::Result<T, FirestoreError>;

/// Firestore errors.
#[derive(Debug, Error)]
pub enum FirestoreError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Authentication error.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Project ID not specified.
    #[error("GCP project ID not specified")]
    ProjectNotSpecified,

    /// The API answered with an error status.
    #[error("Firestore returned {status}: {message}")]
    Service {
        /// HTTP status code.
        status: u16,
        /// Response body.
        message: String,
    },

    /// Network error.
    #[error("Network error: {0}")]
    Network(String),

    /// A typed value or document could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for FirestoreError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

#[cfg(feature = "auth")]
impl From<gcp_auth::Error> for FirestoreError {
    fn from(err: gcp_auth::Error) -> Self {
        Self::Auth(err.to_string())
    }
}

impl From<FirestoreError> for NotifyError {
    fn from(err: FirestoreError) -> Self {
        NotifyError::ProfileStore(err.to_string())
    }
}
