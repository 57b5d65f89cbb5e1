//! In-memory push provider (for testing/development).

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::info;

use crate::{Notification, Platform, PushError, PushProvider, Result};

/// A notification accepted by [`MemoryPushProvider`].
#[derive(Debug, Clone, PartialEq)]
pub struct SentNotification {
    /// Target device token.
    pub token: String,
    /// Delivered content.
    pub notification: Notification,
}

/// Push provider that records sends instead of performing them.
///
/// Used by tests and by the runtime's dry-run mode. Can be switched into a
/// failing mode to exercise delivery error paths.
#[derive(Clone, Default)]
pub struct MemoryPushProvider {
    sent: Arc<Mutex<Vec<SentNotification>>>,
    failure: Arc<Mutex<Option<String>>>,
}

impl MemoryPushProvider {
    /// Create a new recording provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider whose every send fails with the given message.
    pub fn failing(message: impl Into<String>) -> Self {
        let provider = Self::new();
        provider.fail_with(message);
        provider
    }

    /// Make subsequent sends fail.
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.failure.lock() = Some(message.into());
    }

    /// Make subsequent sends succeed again.
    pub fn recover(&self) {
        *self.failure.lock() = None;
    }

    /// Notifications accepted so far.
    pub fn sent(&self) -> Vec<SentNotification> {
        self.sent.lock().clone()
    }

    /// Number of notifications accepted so far.
    pub fn sent_count(&self) -> usize {
        self.sent.lock().len()
    }

}

#[async_trait]
impl PushProvider for MemoryPushProvider {
    async fn send(&self, token: &str, notification: &Notification) -> Result<()> {
        if let Some(message) = self.failure.lock().clone() {
            return Err(PushError::Provider(message));
        }

        info!(token = %token, title = %notification.title, "Recorded push notification");

        self.sent.lock().push(SentNotification {
            token: token.to_string(),
            notification: notification.clone(),
        });
        Ok(())
    }

    fn platform(&self) -> Platform {
        Platform::Memory
    }
}
