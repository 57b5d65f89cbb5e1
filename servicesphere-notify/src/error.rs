//! Notifier error types.

use servicesphere_push::PushError;
use thiserror::Error;

/// Result type for notifier operations.
pub type Result<T> = std::result::Result<T, NotifyError>;

/// Reasons a notification was not sent.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// One side of the transition is absent.
    #[error("Transition is missing its {0} snapshot")]
    MissingSnapshot(&'static str),

    /// The job carries no customer id.
    #[error("Job has no customer id")]
    MissingRecipient,

    /// No profile exists for the customer.
    #[error("No profile for user: {0}")]
    ProfileNotFound(String),

    /// The profile has no delivery token.
    #[error("No FCM token for user: {0}")]
    MissingRecipientToken(String),

    /// The profile store failed.
    #[error("Profile store error: {0}")]
    ProfileStore(String),

    /// The push transport failed.
    #[error("Delivery failed: {0}")]
    Delivery(#[from] PushError),
}

impl NotifyError {
    /// The push transport rejected the device token as invalid or unregistered.
    pub fn is_stale_token(&self) -> bool {
        matches!(self, Self::Delivery(e) if e.should_remove_device())
    }
}
