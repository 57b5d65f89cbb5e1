//! Firestore REST client.

use reqwest::{Client, StatusCode};
use std::sync::Arc;
use tracing::{debug, info};

use crate::{CredentialsSource, Document, FirestoreConfig, FirestoreError, Result};

#[cfg(feature = "auth")]
const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";

/// Bearer token the emulator accepts as an admin identity.
const EMULATOR_TOKEN: &str = "owner";

enum Auth {
    None,
    Static(String),
    #[cfg(feature = "auth")]
    Provider(Arc<dyn gcp_auth::TokenProvider>),
}

/// Reads documents over the Firestore REST API.
///
/// Cheap to clone; clones share the HTTP connection pool and token provider.
#[derive(Clone)]
pub struct FirestoreClient {
    config: Arc<FirestoreConfig>,
    http: Client,
    auth: Arc<Auth>,
    project_id: Arc<str>,
    documents_url: Arc<str>,
}

impl FirestoreClient {
    /// Create a client. Resolves credentials eagerly.
    pub async fn new(config: FirestoreConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| FirestoreError::Config(e.to_string()))?;

        let auth = Self::resolve_auth(&config).await?;
        let project_id = match &config.project_id {
            Some(project) => project.clone(),
            None => Self::discover_project(&auth).await?,
        };
        let documents_url: Arc<str> = config.documents_url(&project_id).into();

        info!(
            project = %project_id,
            database = %config.database_id,
            emulator = config.uses_emulator(),
            "Firestore client initialized"
        );

        Ok(Self {
            config: Arc::new(config),
            http,
            auth: Arc::new(auth),
            project_id: project_id.into(),
            documents_url,
        })
    }

    async fn resolve_auth(config: &FirestoreConfig) -> Result<Auth> {
        if config.uses_emulator() {
            return Ok(Auth::Static(EMULATOR_TOKEN.to_string()));
        }

        match &config.credentials {
            CredentialsSource::Anonymous => Ok(Auth::None),
            CredentialsSource::AccessToken(token) => Ok(Auth::Static(token.clone())),
            #[cfg(feature = "auth")]
            CredentialsSource::ApplicationDefault => Ok(Auth::Provider(gcp_auth::provider().await?)),
            #[cfg(feature = "auth")]
            CredentialsSource::ServiceAccountFile(path) => {
                let account = gcp_auth::CustomServiceAccount::from_file(path)?;
                Ok(Auth::Provider(Arc::new(account)))
            }
            #[cfg(not(feature = "auth"))]
            other => Err(FirestoreError::Config(format!(
                "credentials {:?} require the `auth` feature",
                other
            ))),
        }
    }

    async fn discover_project(auth: &Auth) -> Result<String> {
        match auth {
            #[cfg(feature = "auth")]
            Auth::Provider(provider) => Ok(provider.project_id().await?.to_string()),
            _ => Err(FirestoreError::ProjectNotSpecified),
        }
    }

    async fn bearer_token(&self) -> Result<Option<String>> {
        match self.auth.as_ref() {
            Auth::None => Ok(None),
            Auth::Static(token) => Ok(Some(token.clone())),
            #[cfg(feature = "auth")]
            Auth::Provider(provider) => {
                let token = provider.token(&[DATASTORE_SCOPE]).await?;
                Ok(Some(token.as_str().to_string()))
            }
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &FirestoreConfig {
        &self.config
    }

    /// Project the client reads from, configured or discovered.
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// URL of a document. Every path segment is percent-encoded.
    pub fn document_url(&self, collection: &str, id: &str) -> String {
        let mut url = self.documents_url.to_string();
        for segment in collection.split('/').chain(std::iter::once(id)) {
            url.push('/');
            url.push_str(&urlencoding::encode(segment));
        }
        url
    }

    /// Fetch one document. `Ok(None)` when it does not exist.
    pub async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        if !is_valid_segment(id) || id.contains('/') {
            return Err(FirestoreError::Config(format!("invalid document id: {:?}", id)));
        }
        if !collection.split('/').all(is_valid_segment) {
            return Err(FirestoreError::Config(format!(
                "invalid collection path: {:?}",
                collection
            )));
        }

        let url = self.document_url(collection, id);
        debug!(collection = %collection, id = %id, "Fetching Firestore document");

        let mut request = self.http.get(&url);
        if let Some(token) = self.bearer_token().await? {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(FirestoreError::Service {
                status: status.as_u16(),
                message,
            });
        }

        Ok(Some(response.json().await?))
    }
}

// Dot segments would be collapsed by URL normalization.
fn is_valid_segment(segment: &str) -> bool {
    !matches!(segment, "" | "." | "..")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_emulator_client_needs_no_credentials() {
        let config = FirestoreConfig::builder()
            .project_id("demo-servicesphere")
            .emulator_host("localhost:8081")
            .build();

        let client = FirestoreClient::new(config).await.unwrap();
        assert_eq!(
            client.document_url("users", "u1"),
            "http://localhost:8081/v1/projects/demo-servicesphere/databases/(default)/documents/users/u1"
        );
        assert_eq!(
            client.bearer_token().await.unwrap().as_deref(),
            Some(EMULATOR_TOKEN)
        );
    }

    #[tokio::test]
    async fn test_anonymous_without_project_fails() {
        let config = FirestoreConfig::builder()
            .credentials(CredentialsSource::Anonymous)
            .build();

        assert!(matches!(
            FirestoreClient::new(config).await,
            Err(FirestoreError::ProjectNotSpecified)
        ));
    }

    #[tokio::test]
    async fn test_invalid_document_id_rejected() {
        let config = FirestoreConfig::builder()
            .project_id("p")
            .access_token("tok")
            .build();
        let client = FirestoreClient::new(config).await.unwrap();

        assert!(matches!(
            client.get_document("users", "a/b").await,
            Err(FirestoreError::Config(_))
        ));
        for id in ["", ".", ".."] {
            assert!(matches!(
                client.get_document("users", id).await,
                Err(FirestoreError::Config(_))
            ));
        }
        assert!(matches!(
            client.get_document("users/../admins", "u1").await,
            Err(FirestoreError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_document_url_escapes_segments() {
        let config = FirestoreConfig::builder()
            .project_id("p")
            .emulator_host("localhost:8081")
            .build();
        let client = FirestoreClient::new(config).await.unwrap();
        let base = "http://localhost:8081/v1/projects/p/databases/(default)/documents";

        assert_eq!(
            client.document_url("users", "victim#frag"),
            format!("{}/users/victim%23frag", base)
        );
        assert_eq!(
            client.document_url("users", "victim?x=1"),
            format!("{}/users/victim%3Fx%3D1", base)
        );
        assert_eq!(
            client.document_url("regions/blr/users", "u 1"),
            format!("{}/regions/blr/users/u%201", base)
        );
    }
}
