//! HTTP exporter: `/metrics` for Prometheus, `/health` for supervisors.

use crate::metrics::{Liveness, MetricsRegistry, MetricsSnapshot};
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;

/// Errors that can occur during metrics server operations.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listening socket could not be bound.
    #[error("failed to bind to address: {0}")]
    Bind(#[from] std::io::Error),

    /// The server stopped with an error.
    #[error("server error: {0}")]
    Server(String),
}

/// Configuration for the metrics server.
#[derive(Debug, Clone)]
pub struct MetricsServerConfig {
    /// Address to bind the server to.
    pub bind_addr: SocketAddr,
}

impl Default for MetricsServerConfig {
    fn default() -> Self {
        Self::with_port(9090)
    }
}

impl MetricsServerConfig {
    /// Listens on all interfaces at `port`.
    pub fn with_port(port: u16) -> Self {
        Self {
            bind_addr: ([0, 0, 0, 0], port).into(),
        }
    }
}

/// State shared between the service loop and the HTTP handlers.
pub struct MetricsState {
    registry: MetricsRegistry,
}

impl MetricsState {
    /// Publishes a snapshot of counters and liveness.
    pub fn update(&self, snapshot: &MetricsSnapshot) {
        self.registry.update(snapshot);
    }

    /// Liveness as of the last published snapshot.
    pub fn liveness(&self) -> Liveness {
        self.registry.liveness()
    }
}

type SharedState = Arc<RwLock<MetricsState>>;

/// HTTP server for the capture service's metrics and health.
pub struct MetricsServer {
    config: MetricsServerConfig,
    state: SharedState,
}

impl MetricsServer {
    /// Creates a server around `registry`. Nothing is bound until `run`.
    pub fn new(config: MetricsServerConfig, registry: MetricsRegistry) -> Self {
        Self {
            config,
            state: Arc::new(RwLock::new(MetricsState { registry })),
        }
    }

    /// Handle the service loop publishes snapshots through.
    pub fn state(&self) -> SharedState {
        Arc::clone(&self.state)
    }

    /// Serves until the listener fails.
    pub async fn run(self) -> Result<(), ServerError> {
        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(addr = %self.config.bind_addr, "Metrics server listening");

        axum::serve(listener, router(self.state))
            .await
            .map_err(|e| ServerError::Server(e.to_string()))
    }
}

fn router(state: SharedState) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn metrics_handler(State(state): State<SharedState>) -> impl IntoResponse {
    match state.read().await.registry.encode() {
        Ok(output) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            output,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            format!("Failed to encode metrics: {}", e),
        ),
    }
}

async fn health_handler(State(state): State<SharedState>) -> impl IntoResponse {
    health_status(state.read().await.liveness())
}

/// Presses are lost once the worker is gone, so that is the only
/// unavailable state. A missing button still serves manual captures.
fn health_status(liveness: Liveness) -> (StatusCode, &'static str) {
    match liveness {
        Liveness {
            worker_running: false,
            ..
        } => (StatusCode::SERVICE_UNAVAILABLE, "worker stopped"),
        Liveness {
            button_open: false,
            ..
        } => (StatusCode::OK, "degraded: button line not open"),
        _ => (StatusCode::OK, "OK"),
    }
}
