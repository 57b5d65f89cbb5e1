//! Liveness/readiness reporting for `GET /health`.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

/// Health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Serving events.
    Healthy,
    /// Serving, with a degraded dependency.
    Degraded,
    /// Not serving (shutting down).
    Unhealthy,
}

impl HealthStatus {
    /// Whether the instance can accept traffic.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Healthy | Self::Degraded)
    }
}

/// Body of a health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    /// Overall status.
    pub status: HealthStatus,
    /// Cloud Run service name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    /// Cloud Run revision name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    /// Seconds since startup.
    pub uptime_seconds: u64,
    /// Whether notifications are recorded instead of sent.
    pub dry_run: bool,
}

/// Tracks instance health across requests.
#[derive(Clone)]
pub struct HealthCheck {
    start_time: Instant,
    dry_run: bool,
    status: Arc<RwLock<HealthStatus>>,
}

impl HealthCheck {
    /// Start healthy.
    pub fn new(dry_run: bool) -> Self {
        Self {
            start_time: Instant::now(),
            dry_run,
            status: Arc::new(RwLock::new(HealthStatus::Healthy)),
        }
    }

    /// Override the status.
    pub async fn set_status(&self, status: HealthStatus) {
        *self.status.write().await = status;
    }

    /// Mark as unhealthy (for graceful shutdown).
    pub async fn mark_unhealthy(&self) {
        self.set_status(HealthStatus::Unhealthy).await;
    }

    /// Current report.
    pub async fn check(&self) -> HealthReport {
        HealthReport {
            status: *self.status.read().await,
            service: std::env::var("K_SERVICE").ok(),
            revision: std::env::var("K_REVISION").ok(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            dry_run: self.dry_run,
        }
    }
}
