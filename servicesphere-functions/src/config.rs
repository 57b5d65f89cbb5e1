//! Runtime configuration.
//!
//! Sources, lowest precedence first: built-in defaults, an optional TOML file
//! named by `SERVICESPHERE_CONFIG`, then environment variables (a `.env` file is
//! loaded into the environment first). `SERVICESPHERE_*` variables override the
//! standard Google/Cloud Run ones (`PORT`, `GOOGLE_CLOUD_PROJECT`, ...).

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "SERVICESPHERE";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A config file could not be read.
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    /// A config file could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// A value could not be parsed.
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue {
        /// Variable name.
        key: String,
        /// Offending value.
        value: String,
    },

    /// The assembled configuration is unusable.
    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Notifier runtime configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FunctionConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// GCP project ID.
    pub project_id: Option<String>,
    /// Firestore database ID.
    pub database_id: String,
    /// Collection whose updates trigger notifications.
    pub jobs_collection: String,
    /// Collection holding recipient profiles.
    pub users_collection: String,
    /// Profile field holding the FCM token.
    pub token_field: String,
    /// Firestore emulator host.
    pub emulator_host: Option<String>,
    /// Service account JSON used for Firestore and FCM.
    pub credentials_file: Option<String>,
    /// FCM API base URL override.
    pub fcm_endpoint: Option<String>,
    /// Static FCM access token (local testing).
    pub fcm_access_token: Option<String>,
    /// Record notifications instead of sending them.
    pub dry_run: bool,
    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_level: String,
    /// Timeout for outbound Firestore and FCM calls.
    pub request_timeout_secs: u64,
    /// Largest accepted event body.
    pub max_body_bytes: usize,
}

impl Default for FunctionConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            project_id: None,
            database_id: "(default)".to_string(),
            jobs_collection: "serviceRequests".to_string(),
            users_collection: "users".to_string(),
            token_field: "fcmToken".to_string(),
            emulator_host: None,
            credentials_file: None,
            fcm_endpoint: None,
            fcm_access_token: None,
            dry_run: false,
            log_level: "info".to_string(),
            request_timeout_secs: 10,
            max_body_bytes: 1024 * 1024,
        }
    }
}

impl FunctionConfig {
    /// Load from the process environment (and `.env`), then validate.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let mut config = match std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file; missing keys take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::LoadError(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Parse TOML.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Overlay environment variables read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let prefixed = |name: &str| lookup(&format!("{}_{}", ENV_PREFIX, name));

        // Standard platform variables first so prefixed ones win.
        if let Some(port) = lookup("PORT") {
            self.port = parse("PORT", &port)?;
        }
        if let Some(project) = ["GOOGLE_CLOUD_PROJECT", "GCP_PROJECT", "GCLOUD_PROJECT"]
            .iter()
            .find_map(|key| lookup(key))
        {
            self.project_id = Some(project);
        }
        if let Some(host) = lookup("FIRESTORE_EMULATOR_HOST") {
            self.emulator_host = Some(host);
        }
        if let Some(file) = lookup("GOOGLE_APPLICATION_CREDENTIALS") {
            self.credentials_file = Some(file);
        }

        if let Some(v) = prefixed("HOST") {
            self.host = v;
        }
        if let Some(v) = prefixed("PORT") {
            self.port = parse("SERVICESPHERE_PORT", &v)?;
        }
        if let Some(v) = prefixed("PROJECT_ID") {
            self.project_id = Some(v);
        }
        if let Some(v) = prefixed("DATABASE_ID") {
            self.database_id = v;
        }
        if let Some(v) = prefixed("JOBS_COLLECTION") {
            self.jobs_collection = v;
        }
        if let Some(v) = prefixed("USERS_COLLECTION") {
            self.users_collection = v;
        }
        if let Some(v) = prefixed("TOKEN_FIELD") {
            self.token_field = v;
        }
        if let Some(v) = prefixed("CREDENTIALS_FILE") {
            self.credentials_file = Some(v);
        }
        if let Some(v) = prefixed("FCM_ENDPOINT") {
            self.fcm_endpoint = Some(v);
        }
        if let Some(v) = prefixed("FCM_ACCESS_TOKEN") {
            self.fcm_access_token = Some(v);
        }
        if let Some(v) = prefixed("DRY_RUN") {
            self.dry_run = parse_bool("SERVICESPHERE_DRY_RUN", &v)?;
        }
        if let Some(v) = prefixed("LOG_LEVEL") {
            self.log_level = v;
        }
        if let Some(v) = prefixed("REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = parse("SERVICESPHERE_REQUEST_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = prefixed("MAX_BODY_BYTES") {
            self.max_body_bytes = parse("SERVICESPHERE_MAX_BODY_BYTES", &v)?;
        }

        Ok(())
    }

    /// Check the configuration is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("jobs_collection", &self.jobs_collection),
            ("users_collection", &self.users_collection),
            ("token_field", &self.token_field),
            ("database_id", &self.database_id),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!("{} must not be empty", name)));
            }
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "request_timeout_secs must be positive".to_string(),
            ));
        }

        if !self.dry_run && self.fcm_access_token.is_some() && self.project_id.is_none() {
            return Err(ConfigError::ValidationError(
                "project_id is required with a static FCM access token".to_string(),
            ));
        }

        Ok(())
    }

    /// Get the bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind_address()
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                key: "host".to_string(),
                value: self.host.clone(),
            })
    }
}

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = FunctionConfig::default();
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.jobs_collection, "serviceRequests");
        assert_eq!(config.users_collection, "users");
        assert_eq!(config.token_field, "fcmToken");
        assert!(!config.dry_run);
    }

    #[test]
    fn test_platform_variables() {
        let mut config = FunctionConfig::default();
        config
            .apply_env(env(&[
                ("PORT", "9090"),
                ("GCLOUD_PROJECT", "servicesphere-prod"),
                ("FIRESTORE_EMULATOR_HOST", "localhost:8081"),
            ]))
            .unwrap();

        assert_eq!(config.port, 9090);
        assert_eq!(config.project_id.as_deref(), Some("servicesphere-prod"));
        assert_eq!(config.emulator_host.as_deref(), Some("localhost:8081"));
    }

    #[test]
    fn test_prefixed_variables_win() {
        let mut config = FunctionConfig::default();
        config
            .apply_env(env(&[
                ("PORT", "9090"),
                ("SERVICESPHERE_PORT", "7000"),
                ("GOOGLE_CLOUD_PROJECT", "from-platform"),
                ("SERVICESPHERE_PROJECT_ID", "from-prefix"),
                ("SERVICESPHERE_DRY_RUN", "true"),
                ("SERVICESPHERE_USERS_COLLECTION", "customers"),
            ]))
            .unwrap();

        assert_eq!(config.port, 7000);
        assert_eq!(config.project_id.as_deref(), Some("from-prefix"));
        assert!(config.dry_run);
        assert_eq!(config.users_collection, "customers");
    }

    #[test]
    fn test_invalid_numbers_rejected() {
        let mut config = FunctionConfig::default();
        let err = config.apply_env(env(&[("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "PORT"));

        let err = config
            .apply_env(env(&[("SERVICESPHERE_DRY_RUN", "maybe")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_toml_with_partial_keys() {
        let config = FunctionConfig::from_toml_str(
            r#"
            project_id = "servicesphere-dev"
            jobs_collection = "jobs"
            dry_run = true
            "#,
        )
        .unwrap();

        assert_eq!(config.project_id.as_deref(), Some("servicesphere-dev"));
        assert_eq!(config.jobs_collection, "jobs");
        assert!(config.dry_run);
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_bad_toml() {
        assert!(matches!(
            FunctionConfig::from_toml_str("port = \"not a number\""),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_validation() {
        assert!(FunctionConfig::default().validate().is_ok());

        let static_token = FunctionConfig {
            fcm_access_token: Some("ya29.token".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            static_token.validate(),
            Err(ConfigError::ValidationError(_))
        ));

        let with_project = FunctionConfig {
            project_id: Some("p".to_string()),
            ..static_token.clone()
        };
        assert!(with_project.validate().is_ok());

        let dry = FunctionConfig {
            dry_run: true,
            ..static_token
        };
        assert!(dry.validate().is_ok());

        let empty_collection = FunctionConfig {
            jobs_collection: " ".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            empty_collection.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_socket_addr() {
        let config = FunctionConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            ..Default::default()
        };
        assert_eq!(config.socket_addr().unwrap().port(), 3000);

        let bad = FunctionConfig {
            host: "not a host".to_string(),
            ..Default::default()
        };
        assert!(bad.socket_addr().is_err());
    }
}
