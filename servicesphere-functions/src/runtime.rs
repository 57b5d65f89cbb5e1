//! HTTP runtime: receives trigger deliveries and serves health checks.

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderValue};
use http::{HeaderMap, Method, StatusCode};
use http_body_util::{BodyExt, Full, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use hyper_util::server::graceful::GracefulShutdown;
use serde_json::{Value, json};
use servicesphere_notify::StatusNotifier;
use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::{FunctionConfig, FunctionError, HealthCheck, Result, TriggerEvent};

/// How long in-flight requests may run after a shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Status and JSON body of a response.
#[derive(Debug, Clone, PartialEq)]
pub struct EventResponse {
    /// HTTP status.
    pub status: StatusCode,
    /// JSON body.
    pub body: Value,
}

impl EventResponse {
    fn new(status: StatusCode, body: Value) -> Self {
        Self { status, body }
    }

    fn error(status: StatusCode, message: impl Into<String>) -> Self {
        Self::new(status, json!({ "error": message.into() }))
    }

    fn into_http(self) -> Response<Full<Bytes>> {
        let mut response = Response::new(Full::new(Bytes::from(self.body.to_string())));
        *response.status_mut() = self.status;
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        response
    }
}

/// Serves the job notifier over HTTP.
#[derive(Clone)]
pub struct NotifierRuntime {
    notifier: StatusNotifier,
    config: Arc<FunctionConfig>,
    health: HealthCheck,
}

impl NotifierRuntime {
    /// Wrap an already-built notifier.
    pub fn new(notifier: StatusNotifier, config: FunctionConfig) -> Self {
        Self {
            health: HealthCheck::new(config.dry_run),
            notifier,
            config: Arc::new(config),
        }
    }

    /// Build the Firestore and FCM clients, then the runtime.
    pub async fn from_config(config: FunctionConfig) -> Result<Self> {
        let notifier = crate::bootstrap::build_notifier(&config).await?;
        Ok(Self::new(notifier, config))
    }

    /// Health tracker.
    pub fn health(&self) -> &HealthCheck {
        &self.health
    }

    /// Handle one trigger delivery.
    ///
    /// Decoded events always answer `200`, whatever the outcome, so the
    /// trigger is never redelivered. Only undecodable bodies answer `400`.
    pub async fn handle_event(&self, headers: &HeaderMap, body: &[u8]) -> EventResponse {
        let event = match TriggerEvent::from_http(headers, body) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "Rejected undecodable event");
                return EventResponse::error(StatusCode::BAD_REQUEST, e.to_string());
            }
        };

        if !event.is_in(&self.config.jobs_collection) {
            debug!(
                collection = ?event.collection,
                expected = %self.config.jobs_collection,
                "Ignoring event for another collection"
            );
            return EventResponse::new(
                StatusCode::OK,
                json!({ "outcome": "ignored", "jobId": event.job_id }),
            );
        }

        let span = info_span!(
            "job_update",
            job_id = %event.job_id,
            event_id = event.event_id.as_deref().unwrap_or_default(),
        );
        let job_id = event.job_id.clone();
        let dispatch = self
            .notifier
            .handle(event.before, event.after, &job_id)
            .instrument(span)
            .await;

        let mut body = match serde_json::to_value(&dispatch) {
            Ok(body) => body,
            Err(e) => {
                error!(job_id = %job_id, error = %e, "Failed to serialize outcome");
                json!({ "outcome": "unknown" })
            }
        };
        if let Some(fields) = body.as_object_mut() {
            fields.insert("jobId".to_string(), Value::String(job_id));
        }
        EventResponse::new(StatusCode::OK, body)
    }

    /// Health report; `503` once the instance stops accepting traffic.
    pub async fn handle_health(&self) -> EventResponse {
        let report = self.health.check().await;
        let status = if report.status.is_ready() {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        };
        match serde_json::to_value(&report) {
            Ok(body) => EventResponse::new(status, body),
            Err(e) => {
                error!(error = %e, "Failed to serialize health report");
                EventResponse::error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        }
    }

    async fn route(&self, req: Request<Incoming>) -> Response<Full<Bytes>> {
        let (parts, body) = req.into_parts();
        debug!(method = %parts.method, path = %parts.uri.path(), "Handling request");

        let response = match (&parts.method, parts.uri.path()) {
            (&Method::GET, "/health") => self.handle_health().await,
            (_, "/health") => EventResponse::error(StatusCode::METHOD_NOT_ALLOWED, "method not allowed"),
            (&Method::POST, _) => {
                match Limited::new(body, self.config.max_body_bytes).collect().await {
                    Ok(collected) => self.handle_event(&parts.headers, &collected.to_bytes()).await,
                    Err(e) => {
                        warn!(error = %e, limit = self.config.max_body_bytes, "Could not read event body");
                        EventResponse::error(StatusCode::PAYLOAD_TOO_LARGE, e.to_string())
                    }
                }
            }
            _ => EventResponse::error(StatusCode::NOT_FOUND, "not found"),
        };

        response.into_http()
    }

    /// Bind the configured address and serve until SIGTERM/SIGINT.
    pub async fn run(self) -> Result<()> {
        let addr = self.config.socket_addr()?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| FunctionError::Server(format!("bind {}: {}", addr, e)))?;

        info!(address = %addr, dry_run = self.config.dry_run, "Notifier listening");
        self.serve(listener, crate::wait_for_shutdown()).await
    }

    /// Serve connections from `listener` until `shutdown` resolves, then
    /// drain in-flight requests.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let runtime = Arc::new(self);
        let graceful = GracefulShutdown::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, peer) = accepted
                        .map_err(|e| FunctionError::Server(e.to_string()))?;

                    let io = TokioIo::new(stream);
                    let runtime = runtime.clone();
                    let service = service_fn(move |req| {
                        let runtime = runtime.clone();
                        async move { Ok::<_, Infallible>(runtime.route(req).await) }
                    });

                    let connection = graceful.watch(http1::Builder::new().serve_connection(io, service));
                    tokio::spawn(async move {
                        if let Err(e) = connection.await {
                            error!(peer = %peer, "Connection error: {}", e);
                        }
                    });
                }
                _ = &mut shutdown => break,
            }
        }

        runtime.health.mark_unhealthy().await;
        info!("Draining in-flight requests");

        tokio::select! {
            _ = graceful.shutdown() => info!("All connections closed"),
            _ = tokio::time::sleep(SHUTDOWN_GRACE) => warn!("Shutdown grace period elapsed"),
        }

        Ok(())
    }
}
