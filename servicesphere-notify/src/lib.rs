//! # ServiceSphere Notify
//!
//! Turns job status transitions into push notifications.
//!
//! A job update arrives as a before/after pair of [`JobRecord`] snapshots. The
//! ordered rule table in [`rules`] classifies the [`Transition`]; the first
//! matching rule yields a [`NotificationIntent`]. The [`StatusNotifier`] then
//! resolves the customer's delivery token and hands the intent to the push
//! provider. Every failure degrades to "not sent" and is reported as a
//! [`Dispatch`] outcome, never as an error.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use servicesphere_notify::{JobRecord, MemoryProfileStore, StatusNotifier};
//! use servicesphere_push::MemoryPushProvider;
//! use std::sync::Arc;
//!
//! let profiles = MemoryProfileStore::new().with_token("cust-1", "device-token");
//! let notifier = StatusNotifier::new(Arc::new(profiles), Arc::new(MemoryPushProvider::new()));
//!
//! let before: JobRecord = serde_json::from_value(serde_json::json!({
//!     "status": "requested", "customerId": "cust-1"
//! }))?;
//! let after: JobRecord = serde_json::from_value(serde_json::json!({
//!     "status": "pending_approval", "customerId": "cust-1", "price": 500
//! }))?;
//!
//! let outcome = notifier.handle(Some(before), Some(after), "job-42").await;
//! assert!(outcome.is_sent());
//! ```

mod delivery;
mod error;
mod intent;
mod job;
mod notifier;
mod recipient;
pub mod rules;

pub use delivery::{CLICK_ACTION, DEFAULT_SOUND, DeliveryAdapter};
pub use error::{NotifyError, Result};
pub use intent::{IntentKind, NotificationIntent, map_transition};
pub use job::{JobRecord, JobStatus, Transition, format_amount};
pub use notifier::{Dispatch, StatusNotifier};
pub use recipient::{MemoryProfileStore, ProfileStore, RecipientLookup, RecipientProfile};
