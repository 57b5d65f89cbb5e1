//! Delivery adapter over a push provider.

use servicesphere_push::{Notification, PushProvider};
use std::sync::Arc;
use tracing::debug;

use crate::{NotificationIntent, Result};

/// Sound played on the device.
pub const DEFAULT_SOUND: &str = "default";

/// Click action the Flutter app routes on.
pub const CLICK_ACTION: &str = "FLUTTER_NOTIFICATION_CLICK";

/// Submits intents to the push transport.
#[derive(Clone)]
pub struct DeliveryAdapter {
    provider: Arc<dyn PushProvider>,
}

impl DeliveryAdapter {
    /// Create an adapter over a provider.
    pub fn new(provider: Arc<dyn PushProvider>) -> Self {
        Self { provider }
    }

    /// Build the push payload for an intent.
    ///
    /// The data section carries `click_action` and every metadata entry
    /// (notably `jobId`).
    pub fn payload(intent: &NotificationIntent) -> Notification {
        let mut notification = Notification::new(&intent.title, &intent.body)
            .sound(DEFAULT_SOUND)
            .click_action(CLICK_ACTION)
            .data("click_action", CLICK_ACTION);

        for (key, value) in &intent.metadata {
            notification = notification.data(key, value);
        }

        notification
    }

    /// Send one intent to one device. Single attempt.
    pub async fn deliver(&self, token: &str, intent: &NotificationIntent) -> Result<()> {
        let notification = Self::payload(intent);
        debug!(
            kind = %intent.kind,
            platform = ?self.provider.platform(),
            "Submitting notification"
        );
        self.provider.send(token, &notification).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{JobRecord, NotifyError, Transition, map_transition};
    use servicesphere_push::MemoryPushProvider;

    fn completed_intent() -> NotificationIntent {
        let t = Transition::new(
            JobRecord::with_status("accepted"),
            JobRecord::with_status("completed").for_customer("cust-1"),
        );
        map_transition(&t, "job-77").unwrap()
    }

    #[test]
    fn test_payload_fixed_fields() {
        let payload = DeliveryAdapter::payload(&completed_intent());

        assert_eq!(payload.title, "Job Completed 🎉");
        assert_eq!(payload.sound.as_deref(), Some("default"));
        assert_eq!(
            payload.data.get("click_action").map(String::as_str),
            Some("FLUTTER_NOTIFICATION_CLICK")
        );
        assert_eq!(payload.data.get("jobId").map(String::as_str), Some("job-77"));
    }

    #[tokio::test]
    async fn test_deliver_sends_once() {
        let provider = MemoryPushProvider::new();
        let adapter = DeliveryAdapter::new(Arc::new(provider.clone()));

        adapter.deliver("tok", &completed_intent()).await.unwrap();

        let sent = provider.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].token, "tok");
    }

    #[tokio::test]
    async fn test_deliver_maps_transport_error() {
        let adapter = DeliveryAdapter::new(Arc::new(MemoryPushProvider::failing("503")));
        let err = adapter.deliver("tok", &completed_intent()).await.unwrap_err();
        assert!(matches!(err, NotifyError::Delivery(_)));
    }
}
