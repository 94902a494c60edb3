//! Diagnostics HTTP surface.
//!
//! Exposes a minimal read-only view onto the running core: a liveness
//! check and a transparency-stats dump. Trimmed from the teacher's
//! `server.rs`, which relayed raw Chrome-extension sessions through flux to
//! the gateway — that `/ingest` relay has no counterpart in this pipeline
//! and is not carried forward. Requires the `server` feature.

use crate::transparency::SharedTransparencyLog;
use axum::{
    extract::State,
    http::HeaderValue,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind to (0 for random).
    pub port: u16,
}

impl ServerConfig {
    pub fn new(port: u16) -> Self {
        Self { port }
    }
}

struct ServerState {
    transparency: SharedTransparencyLog,
}

/// Liveness response.
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn healthz() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn status(State(state): State<Arc<ServerState>>) -> Json<crate::transparency::TransparencyStats> {
    Json(state.transparency.stats())
}

/// Run the diagnostics HTTP server. Returns the bound address and a sender
/// that triggers graceful shutdown when dropped or signaled.
pub async fn run(
    config: ServerConfig,
    transparency: SharedTransparencyLog,
) -> anyhow::Result<(SocketAddr, tokio::sync::oneshot::Sender<()>)> {
    let state = Arc::new(ServerState { transparency });

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/status", get(status))
        .layer(
            CorsLayer::new()
                .allow_origin([
                    HeaderValue::from_static("http://localhost"),
                    HeaderValue::from_static("http://127.0.0.1"),
                ])
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    tracing::info!("diagnostics server listening on http://{}", actual_addr);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                tracing::info!("diagnostics server shutdown signal received");
            })
            .await
        {
            tracing::error!("diagnostics server error: {}", e);
        }
    });

    Ok((actual_addr, shutdown_tx))
}
