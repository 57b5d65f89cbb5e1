//! Firestore configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Credentials source for Firestore authentication.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialsSource {
    /// Use Application Default Credentials (metadata server on Cloud Run/Functions).
    #[default]
    ApplicationDefault,
    /// Use service account JSON file.
    ServiceAccountFile(String),
    /// Use explicit access token.
    AccessToken(String),
    /// Send no credentials (emulator).
    Anonymous,
}

/// Firestore client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirestoreConfig {
    /// GCP project ID.
    pub project_id: Option<String>,
    /// Database ID.
    #[serde(default = "default_database")]
    pub database_id: String,
    /// Credentials source.
    #[serde(default)]
    pub credentials: CredentialsSource,
    /// Emulator host (`host:port`); when set, requests go there unauthenticated.
    pub emulator_host: Option<String>,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_database() -> String {
    "(default)".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for FirestoreConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            database_id: default_database(),
            credentials: CredentialsSource::ApplicationDefault,
            emulator_host: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl FirestoreConfig {
    /// Create a builder.
    pub fn builder() -> FirestoreConfigBuilder {
        FirestoreConfigBuilder::new()
    }

    /// Request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Whether requests target the emulator.
    pub fn uses_emulator(&self) -> bool {
        self.emulator_host.is_some()
    }

    /// Base URL of the documents API for this project and database.
    pub fn documents_url(&self, project_id: &str) -> String {
        let origin = match &self.emulator_host {
            Some(host) if host.starts_with("http") => host.trim_end_matches('/').to_string(),
            Some(host) => format!("http://{}", host),
            None => "https://firestore.googleapis.com".to_string(),
        };
        format!(
            "{}/v1/projects/{}/databases/{}/documents",
            origin, project_id, self.database_id
        )
    }
}

/// Builder for Firestore configuration.
#[derive(Default)]
pub struct FirestoreConfigBuilder {
    config: FirestoreConfig,
}

impl FirestoreConfigBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the project ID.
    pub fn project_id(mut self, project_id: impl Into<String>) -> Self {
        self.config.project_id = Some(project_id.into());
        self
    }

    /// Set the database ID.
    pub fn database_id(mut self, database_id: impl Into<String>) -> Self {
        self.config.database_id = database_id.into();
        self
    }

    /// Set the credentials source.
    pub fn credentials(mut self, credentials: CredentialsSource) -> Self {
        self.config.credentials = credentials;
        self
    }

    /// Use service account file.
    pub fn service_account_file(self, path: impl Into<String>) -> Self {
        self.credentials(CredentialsSource::ServiceAccountFile(path.into()))
    }

    /// Use a static access token.
    pub fn access_token(self, token: impl Into<String>) -> Self {
        self.credentials(CredentialsSource::AccessToken(token.into()))
    }

    /// Set emulator host.
    pub fn emulator_host(mut self, host: impl Into<String>) -> Self {
        self.config.emulator_host = Some(host.into());
        self
    }

    /// Set the request timeout in seconds.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> FirestoreConfig {
        self.config
    }
}
