//! Per-update notification handler.

use serde::Serialize;
use servicesphere_push::PushProvider;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::{
    DeliveryAdapter, IntentKind, JobRecord, ProfileStore, RecipientLookup, Transition,
    map_transition, rules,
};

/// Outcome of handling one job update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Dispatch {
    /// One side of the transition was absent.
    MissingSnapshot,
    /// No rule matched.
    NoNotification,
    /// The recipient could not be resolved to a delivery token.
    NoRecipient {
        /// Intent that was computed but not sent.
        kind: IntentKind,
        /// Why the lookup failed.
        reason: String,
    },
    /// The push transport accepted the notification.
    Sent {
        /// Intent that was sent.
        kind: IntentKind,
        /// Customer notified.
        user_id: String,
    },
    /// The push transport failed; the failure was swallowed.
    DeliveryFailed {
        /// Intent that was attempted.
        kind: IntentKind,
        /// Transport error.
        reason: String,
        /// The stored token was rejected and should be replaced by the app.
        stale_token: bool,
    },
}

impl Dispatch {
    /// Whether a notification reached the push transport.
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent { .. })
    }

    /// Intent kind computed for the update, if any.
    pub fn kind(&self) -> Option<IntentKind> {
        match self {
            Self::NoRecipient { kind, .. }
            | Self::Sent { kind, .. }
            | Self::DeliveryFailed { kind, .. } => Some(*kind),
            Self::MissingSnapshot | Self::NoNotification => None,
        }
    }
}

/// Watches job updates and notifies the customer.
///
/// Stateless across invocations; the profile store and push provider are
/// constructed by the caller and shared.
#[derive(Clone)]
pub struct StatusNotifier {
    recipients: RecipientLookup,
    delivery: DeliveryAdapter,
}

impl StatusNotifier {
    /// Create a notifier over a profile store and a push provider.
    pub fn new(profiles: Arc<dyn ProfileStore>, provider: Arc<dyn PushProvider>) -> Self {
        Self {
            recipients: RecipientLookup::new(profiles),
            delivery: DeliveryAdapter::new(provider),
        }
    }

    /// Handle one update of job `job_id`.
    ///
    /// Never fails: every error path is logged and reported as a [`Dispatch`].
    pub async fn handle(
        &self,
        before: Option<JobRecord>,
        after: Option<JobRecord>,
        job_id: &str,
    ) -> Dispatch {
        let transition = match Transition::from_snapshots(before, after) {
            Ok(transition) => transition,
            Err(e) => {
                info!(job_id = %job_id, error = %e, "No data found");
                return Dispatch::MissingSnapshot;
            }
        };

        self.handle_transition(&transition, job_id).await
    }

    /// Handle an already-assembled transition.
    pub async fn handle_transition(&self, transition: &Transition, job_id: &str) -> Dispatch {
        let matched = rules::matching(transition);
        if matched.len() > 1 {
            debug!(
                job_id = %job_id,
                matched = ?matched,
                "Several rules matched, keeping the first"
            );
        }

        let Some(intent) = map_transition(transition, job_id) else {
            debug!(job_id = %job_id, "No notification for transition");
            return Dispatch::NoNotification;
        };

        let customer_id = intent.target_user_id.as_deref();
        let token = match self.recipients.resolve_token(customer_id).await {
            Ok(token) => token,
            Err(e) => {
                warn!(
                    job_id = %job_id,
                    customer_id = ?customer_id,
                    kind = %intent.kind,
                    error = %e,
                    "Recipient has no usable delivery token"
                );
                return Dispatch::NoRecipient {
                    kind: intent.kind,
                    reason: e.to_string(),
                };
            }
        };

        let user_id = customer_id.unwrap_or_default().to_string();
        match self.delivery.deliver(&token, &intent).await {
            Ok(()) => {
                info!(job_id = %job_id, user_id = %user_id, kind = %intent.kind, "Notification sent");
                Dispatch::Sent {
                    kind: intent.kind,
                    user_id,
                }
            }
            Err(e) => {
                let stale_token = e.is_stale_token();
                if stale_token {
                    warn!(job_id = %job_id, user_id = %user_id, error = %e, "Stored device token is no longer valid");
                } else {
                    error!(job_id = %job_id, user_id = %user_id, error = %e, "Error sending notification");
                }
                Dispatch::DeliveryFailed {
                    kind: intent.kind,
                    reason: e.to_string(),
                    stale_token,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryProfileStore;
    use async_trait::async_trait;
    use servicesphere_push::{MemoryPushProvider, Notification, Platform, PushError};

    struct UnregisteredProvider;

    #[async_trait]
    impl PushProvider for UnregisteredProvider {
        async fn send(&self, token: &str, _: &Notification) -> servicesphere_push::Result<()> {
            Err(PushError::Unregistered(token.to_string()))
        }

        fn platform(&self) -> Platform {
            Platform::Memory
        }
    }

    #[tokio::test]
    async fn test_unregistered_token_is_flagged_stale() {
        let notifier = StatusNotifier::new(
            Arc::new(MemoryProfileStore::new().with_token("cust-1", "old-token")),
            Arc::new(UnregisteredProvider),
        );

        let outcome = notifier
            .handle(
                Some(JobRecord::with_status("accepted").for_customer("cust-1")),
                Some(JobRecord::with_status("completed").for_customer("cust-1")),
                "job-1",
            )
            .await;

        assert!(matches!(
            outcome,
            Dispatch::DeliveryFailed { kind: IntentKind::JobCompleted, stale_token: true, .. }
        ));
    }

    #[tokio::test]
    async fn test_transport_outage_is_not_stale() {
        let notifier = StatusNotifier::new(
            Arc::new(MemoryProfileStore::new().with_token("cust-1", "tok")),
            Arc::new(MemoryPushProvider::failing("503")),
        );

        let outcome = notifier
            .handle(
                Some(JobRecord::with_status("accepted").for_customer("cust-1")),
                Some(JobRecord::with_status("completed").for_customer("cust-1")),
                "job-1",
            )
            .await;

        assert!(matches!(outcome, Dispatch::DeliveryFailed { stale_token: false, .. }));
    }

    #[test]
    fn test_dispatch_serialization() {
        let json = serde_json::to_value(Dispatch::Sent {
            kind: IntentKind::JobAccepted,
            user_id: "cust-1".to_string(),
        })
        .unwrap();
        assert_eq!(json["outcome"], "sent");
        assert_eq!(json["kind"], "job_accepted");
        assert_eq!(json["user_id"], "cust-1");

        let json = serde_json::to_value(Dispatch::NoNotification).unwrap();
        assert_eq!(json["outcome"], "no_notification");
    }

    #[tokio::test]
    async fn test_missing_snapshot_skips_everything() {
        let provider = MemoryPushProvider::new();
        let notifier = StatusNotifier::new(
            Arc::new(MemoryProfileStore::new().with_token("c", "t")),
            Arc::new(provider.clone()),
        );

        let outcome = notifier
            .handle(None, Some(JobRecord::with_status("completed")), "j")
            .await;

        assert_eq!(outcome, Dispatch::MissingSnapshot);
        assert_eq!(outcome.kind(), None);
        assert_eq!(provider.sent_count(), 0);
    }
}
