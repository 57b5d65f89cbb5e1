//! Firestore-backed recipient profile store.

use async_trait::async_trait;
use servicesphere_notify::{ProfileStore, RecipientProfile};
use tracing::debug;

use crate::{Document, FirestoreClient};

/// Default collection holding user profiles.
pub const DEFAULT_USERS_COLLECTION: &str = "users";

/// Default field holding the FCM registration token.
pub const DEFAULT_TOKEN_FIELD: &str = "fcmToken";

/// Looks up recipient profiles in a Firestore collection.
#[derive(Clone)]
pub struct FirestoreProfileStore {
    client: FirestoreClient,
    collection: String,
    token_field: String,
}

impl FirestoreProfileStore {
    /// Create a store over the `users` collection reading `fcmToken`.
    pub fn new(client: FirestoreClient) -> Self {
        Self {
            client,
            collection: DEFAULT_USERS_COLLECTION.to_string(),
            token_field: DEFAULT_TOKEN_FIELD.to_string(),
        }
    }

    /// Read profiles from another collection.
    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// Read the token from another field.
    pub fn token_field(mut self, field: impl Into<String>) -> Self {
        self.token_field = field.into();
        self
    }

    /// Build a profile from a fetched user document.
    ///
    /// A token field that is missing, null or not a string yields a profile
    /// without a token.
    pub fn profile_from_document(
        &self,
        customer_id: &str,
        document: &Document,
    ) -> crate::Result<RecipientProfile> {
        let token = document
            .field(&self.token_field)?
            .and_then(|value| value.as_str().map(str::to_string));

        Ok(RecipientProfile {
            user_id: customer_id.to_string(),
            fcm_token: token,
        })
    }
}

#[async_trait]
impl ProfileStore for FirestoreProfileStore {
    async fn fetch_profile(
        &self,
        customer_id: &str,
    ) -> servicesphere_notify::Result<Option<RecipientProfile>> {
        let Some(document) = self.client.get_document(&self.collection, customer_id).await? else {
            debug!(customer_id = %customer_id, "User document not found");
            return Ok(None);
        };

        Ok(Some(self.profile_from_document(customer_id, &document)?))
    }
}
