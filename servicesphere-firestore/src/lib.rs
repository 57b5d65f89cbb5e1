//! # ServiceSphere Firestore
//!
//! Minimal Firestore access over the REST API.
//!
//! - [`Document`] and [`value`] decode Firestore's typed-value JSON into plain
//!   JSON, used both for documents fetched here and for trigger event payloads.
//! - [`FirestoreClient`] reads single documents.
//! - [`FirestoreProfileStore`] implements the notifier's profile lookup over the
//!   `users` collection.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use servicesphere_firestore::{FirestoreClient, FirestoreConfig, FirestoreProfileStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = FirestoreConfig::builder().project_id("my-project").build();
//!     let client = FirestoreClient::new(config).await?;
//!     let profiles = FirestoreProfileStore::new(client);
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod document;
mod error;
mod profiles;
pub mod value;

pub use client::FirestoreClient;
pub use config::{CredentialsSource, FirestoreConfig, FirestoreConfigBuilder};
pub use document::{Document, DocumentPath};
pub use error::{FirestoreError, Result};
pub use profiles::FirestoreProfileStore;
