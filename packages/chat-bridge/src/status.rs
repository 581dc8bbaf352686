//! Optional HTTP status surface.
//!
//! The host publishes [`BridgeStats`] snapshots into a `watch` channel; the
//! handlers only ever read the latest one, so serving status never touches
//! the bridges themselves.

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;

use crate::service::BridgeStats;

pub fn router(stats: watch::Receiver<BridgeStats>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(stats)
}

/// Bind `port` on all interfaces and serve until the process exits.
pub async fn serve(port: u16, stats: watch::Receiver<BridgeStats>) -> std::io::Result<()> {
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("[Status] Listening on {}", addr);
    axum::serve(listener, router(stats)).await
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "chat-bridge",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn stats_handler(State(stats): State<watch::Receiver<BridgeStats>>) -> impl IntoResponse {
    let snapshot = stats.borrow().clone();
    Json(snapshot)
}
