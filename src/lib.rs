// ServiceSphere notifier - push notifications for job status changes
//
// This library classifies job document updates into customer notifications,
// resolves the customer's device token and delivers through FCM.

// Re-export the notification core
pub use servicesphere_notify::*;

// Re-export push delivery
pub use servicesphere_push as push;

// Re-export optional crates
#[cfg(feature = "firestore")]
pub use servicesphere_firestore as firestore;

#[cfg(feature = "runtime")]
pub use servicesphere_functions as functions;

// Prelude for common imports
pub mod prelude {
    pub use crate::{
        Dispatch, IntentKind, JobRecord, JobStatus, MemoryProfileStore, NotificationIntent,
        ProfileStore, RecipientProfile, StatusNotifier, Transition, map_transition,
    };
    pub use servicesphere_push::{MemoryPushProvider, Notification, PushError, PushProvider};
}
