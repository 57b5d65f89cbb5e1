//! Push provider trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Notification, Result};

/// Platform type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Firebase Cloud Messaging (Android and iOS through Firebase).
    Fcm,
    /// In-process provider, nothing leaves the host.
    Memory,
}

/// Push provider trait.
///
/// Implementations own their transport client; callers construct them once and
/// share them behind an `Arc`.
#[async_trait]
pub trait PushProvider: Send + Sync {
    /// Send a notification to a device token.
    async fn send(&self, token: &str, notification: &Notification) -> Result<()>;

    /// Get the platform this provider handles.
    fn platform(&self) -> Platform;
}
