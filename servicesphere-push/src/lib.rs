//! # ServiceSphere Push
//!
//! Push delivery for the ServiceSphere job notifier.
//!
//! ## Features
//!
//! - **FCM**: Firebase Cloud Messaging HTTP v1 client
//! - **Memory**: recording provider for tests and dry runs
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use servicesphere_push::{FcmConfig, FcmProvider, Notification, PushProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = FcmConfig::from_service_account("path/to/service-account.json")?;
//!     let provider = FcmProvider::new(config).await?;
//!
//!     let notification = Notification::new("Job Completed 🎉", "Your service is done.")
//!         .sound("default")
//!         .data("jobId", "job-42");
//!
//!     provider.send("device-token", &notification).await?;
//!     Ok(())
//! }
//! ```

mod error;
mod memory;
mod notification;
mod provider;

#[cfg(feature = "fcm")]
mod fcm;

pub use error::{PushError, Result};
pub use memory::{MemoryPushProvider, SentNotification};
pub use notification::Notification;
pub use provider::{Platform, PushProvider};

#[cfg(feature = "fcm")]
pub use fcm::{FcmAuth, FcmConfig, FcmCredentials, FcmProvider};

/// Prelude for common imports.
///
/// ```
/// use servicesphere_push::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{PushError, Result};
    pub use crate::memory::MemoryPushProvider;
    pub use crate::notification::Notification;
    pub use crate::provider::{Platform, PushProvider};

    #[cfg(feature = "fcm")]
    pub use crate::fcm::{FcmConfig, FcmProvider};
}
