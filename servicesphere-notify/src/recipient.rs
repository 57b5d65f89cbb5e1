//! Recipient profiles and token lookup.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::{NotifyError, Result};

/// A customer's push-delivery profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipientProfile {
    /// Customer id the profile belongs to.
    pub user_id: String,
    /// Device token registered by the app.
    #[serde(default)]
    pub fcm_token: Option<String>,
}

impl RecipientProfile {
    /// Create a profile without a token.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            fcm_token: None,
        }
    }

    /// Set the device token.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.fcm_token = Some(token.into());
        self
    }

    /// Usable delivery token. Empty tokens are treated as missing.
    pub fn delivery_token(&self) -> Option<&str> {
        self.fcm_token.as_deref().filter(|t| !t.is_empty())
    }
}

/// Profile store trait.
///
/// Implement this trait to provide profile lookup from a backing store
/// (Firestore, a cache, an in-memory map).
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetch the profile for a customer. `Ok(None)` means no such profile.
    async fn fetch_profile(&self, customer_id: &str) -> Result<Option<RecipientProfile>>;
}

/// In-memory profile store (for testing/development).
#[derive(Clone, Default)]
pub struct MemoryProfileStore {
    profiles: Arc<RwLock<HashMap<String, RecipientProfile>>>,
    failure: Arc<RwLock<Option<String>>>,
}

impl MemoryProfileStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a profile with a token.
    pub fn with_token(self, user_id: &str, token: &str) -> Self {
        self.insert(RecipientProfile::new(user_id).token(token));
        self
    }

    /// Add or replace a profile.
    pub fn insert(&self, profile: RecipientProfile) {
        self.profiles
            .write()
            .insert(profile.user_id.clone(), profile);
    }

    /// Make subsequent lookups fail with a store error.
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.failure.write() = Some(message.into());
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn fetch_profile(&self, customer_id: &str) -> Result<Option<RecipientProfile>> {
        if let Some(message) = self.failure.read().clone() {
            return Err(NotifyError::ProfileStore(message));
        }
        Ok(self.profiles.read().get(customer_id).cloned())
    }
}

/// Resolves a customer id to a delivery token.
#[derive(Clone)]
pub struct RecipientLookup {
    store: Arc<dyn ProfileStore>,
}

impl RecipientLookup {
    /// Create a lookup over a profile store.
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        Self { store }
    }

    /// Resolve the delivery token for `customer_id`. Single attempt, no retry.
    pub async fn resolve_token(&self, customer_id: Option<&str>) -> Result<String> {
        let customer_id = customer_id
            .filter(|id| !id.is_empty())
            .ok_or(NotifyError::MissingRecipient)?;

        let profile = self
            .store
            .fetch_profile(customer_id)
            .await?
            .ok_or_else(|| NotifyError::ProfileNotFound(customer_id.to_string()))?;

        profile
            .delivery_token()
            .map(str::to_string)
            .ok_or_else(|| NotifyError::MissingRecipientToken(customer_id.to_string()))
    }
}
