//! Builds the notifier and its clients from [`FunctionConfig`].

use servicesphere_firestore::{FirestoreClient, FirestoreConfig, FirestoreProfileStore};
use servicesphere_notify::StatusNotifier;
use servicesphere_push::{FcmConfig, FcmProvider, MemoryPushProvider, PushProvider};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::{FunctionConfig, Result};

/// Firestore client settings derived from the runtime config.
pub fn firestore_config(config: &FunctionConfig) -> FirestoreConfig {
    let mut builder = FirestoreConfig::builder()
        .database_id(config.database_id.clone())
        .timeout_secs(config.request_timeout_secs);

    if let Some(project) = &config.project_id {
        builder = builder.project_id(project.clone());
    }
    if let Some(host) = &config.emulator_host {
        builder = builder.emulator_host(host.clone());
    }
    if let Some(file) = &config.credentials_file {
        builder = builder.service_account_file(file.clone());
    }

    builder.build()
}

/// FCM settings, or `None` when notifications are only recorded.
pub fn fcm_config(config: &FunctionConfig, project_id: &str) -> Result<Option<FcmConfig>> {
    if config.dry_run {
        return Ok(None);
    }

    let project = config.project_id.as_deref().unwrap_or(project_id);
    let fcm = if let Some(token) = &config.fcm_access_token {
        FcmConfig::with_access_token(project, token.clone())
    } else if let Some(file) = &config.credentials_file {
        FcmConfig::from_service_account(file)?
    } else {
        FcmConfig::application_default(project)
    };

    let fcm = match &config.fcm_endpoint {
        Some(endpoint) => fcm.endpoint(endpoint.clone()),
        None => fcm,
    };

    Ok(Some(fcm.timeout(Duration::from_secs(config.request_timeout_secs))))
}

/// Build the push provider for `project_id`.
pub async fn push_provider(
    config: &FunctionConfig,
    project_id: &str,
) -> Result<Arc<dyn PushProvider>> {
    match fcm_config(config, project_id)? {
        Some(fcm) => {
            info!(project = %fcm.project_id, "Using FCM push provider");
            Ok(Arc::new(FcmProvider::new(fcm).await?))
        }
        None => {
            warn!("Dry run: notifications are recorded, not sent");
            Ok(Arc::new(MemoryPushProvider::new()))
        }
    }
}

/// Build a notifier over Firestore profiles and FCM delivery.
pub async fn build_notifier(config: &FunctionConfig) -> Result<StatusNotifier> {
    let client = FirestoreClient::new(firestore_config(config)).await?;
    let project_id = client.project_id().to_string();

    let profiles = FirestoreProfileStore::new(client)
        .collection(config.users_collection.clone())
        .token_field(config.token_field.clone());
    let provider = push_provider(config, &project_id).await?;

    Ok(StatusNotifier::new(Arc::new(profiles), provider))
}

#[cfg(test)]
mod tests {
    use super::*;
    use servicesphere_firestore::CredentialsSource;
    use servicesphere_push::FcmAuth;

    #[test]
    fn test_firestore_config_mapping() {
        let config = FunctionConfig {
            project_id: Some("servicesphere".to_string()),
            emulator_host: Some("localhost:8081".to_string()),
            credentials_file: Some("/secrets/sa.json".to_string()),
            request_timeout_secs: 3,
            ..Default::default()
        };

        let firestore = firestore_config(&config);
        assert_eq!(firestore.project_id.as_deref(), Some("servicesphere"));
        assert!(firestore.uses_emulator());
        assert_eq!(
            firestore.credentials,
            CredentialsSource::ServiceAccountFile("/secrets/sa.json".to_string())
        );
        assert_eq!(firestore.timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_dry_run_has_no_fcm() {
        let config = FunctionConfig {
            dry_run: true,
            fcm_access_token: Some("ignored".to_string()),
            ..Default::default()
        };
        assert!(fcm_config(&config, "p").unwrap().is_none());
    }

    #[test]
    fn test_static_token_and_endpoint() {
        let config = FunctionConfig {
            project_id: Some("configured".to_string()),
            fcm_access_token: Some("ya29.local".to_string()),
            fcm_endpoint: Some("http://127.0.0.1:9099/".to_string()),
            ..Default::default()
        };

        let fcm = fcm_config(&config, "discovered").unwrap().unwrap();
        assert_eq!(fcm.project_id, "configured");
        assert!(matches!(fcm.auth, FcmAuth::AccessToken(ref t) if t == "ya29.local"));
        assert_eq!(
            fcm.send_url(),
            "http://127.0.0.1:9099/v1/projects/configured/messages:send"
        );
    }

    #[test]
    fn test_application_default_uses_discovered_project() {
        let fcm = fcm_config(&FunctionConfig::default(), "discovered")
            .unwrap()
            .unwrap();
        assert_eq!(fcm.project_id, "discovered");
        assert!(matches!(fcm.auth, FcmAuth::ApplicationDefault));
    }

    #[test]
    fn test_missing_service_account_file() {
        let config = FunctionConfig {
            credentials_file: Some("/nonexistent/servicesphere-sa.json".to_string()),
            ..Default::default()
        };
        assert!(fcm_config(&config, "p").is_err());
    }
}
