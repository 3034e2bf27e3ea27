//! HTTP endpoint for scraping capture metrics while a run is in progress.

use crate::metrics::MetricsRegistry;
use crate::sharing::StopSignal;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tower_http::cors::CorsLayer;

const STOP_POLL: Duration = Duration::from_millis(200);

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind metrics listener: {0}")]
    Bind(#[from] std::io::Error),

    #[error("metrics server failed: {0}")]
    Server(String),
}

#[derive(Debug, Clone)]
pub struct MetricsServerConfig {
    pub bind_addr: SocketAddr,
}

impl Default for MetricsServerConfig {
    fn default() -> Self {
        Self::with_port(9464)
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

#[derive(Clone)]
struct ServerState {
    registry: Arc<MetricsRegistry>,
    stop: StopSignal,
}

/// Serves `/metrics` and `/health` until the capture run stops.
pub struct MetricsServer {
    config: MetricsServerConfig,
    state: ServerState,
}

impl MetricsServer {
    /// `registry` is shared with whoever feeds it snapshots.
    pub fn new(
        config: MetricsServerConfig,
        registry: Arc<MetricsRegistry>,
        stop: StopSignal,
    ) -> Self {
        Self {
            config,
            state: ServerState { registry, stop },
        }
    }

    /// Runs until `stop` is set, then finishes in-flight requests and returns.
    pub async fn run(self) -> Result<(), ServerError> {
        let stop = self.state.stop.clone();
        let app = Router::new()
            .route("/metrics", get(metrics_handler))
            .route("/health", get(health_handler))
            .layer(CorsLayer::permissive())
            .with_state(self.state);

        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(addr = %self.config.bind_addr, "Metrics endpoint listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(stopped(stop))
            .await
            .map_err(|e| ServerError::Server(e.to_string()))?;

        tracing::info!("Metrics endpoint closed");
        Ok(())
    }
}

async fn stopped(stop: StopSignal) {
    while !stop.is_stopped() {
        tokio::time::sleep(STOP_POLL).await;
    }
}

async fn metrics_handler(State(state): State<ServerState>) -> impl IntoResponse {
    match state.registry.encode() {
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

/// 200 while capturing, 503 once the run is winding down.
async fn health_handler(State(state): State<ServerState>) -> impl IntoResponse {
    if state.stop.is_stopped() {
        (StatusCode::SERVICE_UNAVAILABLE, "stopping")
    } else {
        (StatusCode::OK, "capturing")
    }
}
