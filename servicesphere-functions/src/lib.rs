//! # ServiceSphere Functions
//!
//! Hosts the job notifier on Cloud Run or Cloud Functions (2nd gen).
//!
//! Firestore `document.updated` events for the jobs collection arrive over HTTP
//! (Eventarc CloudEvents, or the legacy background-function envelope), are
//! decoded into before/after job snapshots and handed to the
//! [`StatusNotifier`](servicesphere_notify::StatusNotifier).
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use servicesphere_functions::{FunctionConfig, NotifierRuntime, init_tracing_with_level};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = FunctionConfig::load()?;
//!     init_tracing_with_level(&config.log_level);
//!
//!     NotifierRuntime::from_config(config).await?.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Deployment
//!
//! ```bash
//! gcloud run deploy servicesphere-notifier --image gcr.io/PROJECT_ID/servicesphere-notifier
//!
//! gcloud eventarc triggers create job-updates \
//!     --destination-run-service servicesphere-notifier \
//!     --event-filters type=google.cloud.firestore.document.v1.updated \
//!     --event-filters database='(default)' \
//!     --event-filters-path-pattern document='serviceRequests/{jobId}' \
//!     --event-data-content-type application/json
//! ```

pub mod bootstrap;
mod config;
mod error;
mod event;
mod health;
mod runtime;

pub use config::{ConfigError, ENV_PREFIX, FunctionConfig};
pub use error::{FunctionError, Result};
pub use event::{DocumentEventData, DocumentMask, TriggerEvent};
pub use health::{HealthCheck, HealthReport, HealthStatus};
pub use runtime::{EventResponse, NotifierRuntime};

/// Initialize tracing for Cloud Logging with the default `info` filter.
///
/// `RUST_LOG` takes precedence when set.
pub fn init_tracing() {
    init_tracing_with_level("info");
}

/// Initialize tracing, falling back to `level` when `RUST_LOG` is unset.
///
/// On Cloud Run (`K_SERVICE` set) events are written in the Stackdriver
/// format; elsewhere as JSON lines.
pub fn init_tracing_with_level(level: &str) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    if is_cloud_run() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    }
}

/// Check if running on Cloud Run.
pub fn is_cloud_run() -> bool {
    std::env::var("K_SERVICE").is_ok()
}

/// Wait for SIGTERM or SIGINT.
///
/// Cloud Run sends SIGTERM when scaling down or deploying new revisions.
pub async fn wait_for_shutdown() {
    use tokio::signal::unix::{SignalKind, signal};

    let (mut sigterm, mut sigint) =
        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(term), Ok(int)) => (term, int),
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!(error = %e, "Signal handlers unavailable, waiting for Ctrl-C");
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!(error = %e, "Failed to listen for Ctrl-C");
                }
                return;
            }
        };

    tokio::select! {
        _ = sigterm.recv() => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
        _ = sigint.recv() => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        }
    }
}
