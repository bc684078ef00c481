//! Metrics and health endpoints.
//!
//! A small axum server exposing `/metrics` for Prometheus scrapes and
//! `/healthz` for liveness probes.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use prometheus::{Registry, TextEncoder};
use tracing::info;

use crate::error::ControllerError;

/// Serves the observability endpoints until the process exits.
pub async fn serve(addr: String, registry: Registry) -> Result<(), ControllerError> {
    let app = Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route("/metrics", get(metrics_handler))
        .with_state(registry);

    info!("Metrics endpoint listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn metrics_handler(State(registry): State<Registry>) -> impl IntoResponse {
    let encoder = TextEncoder::new();
    match encoder.encode_to_string(&registry.gather()) {
        Ok(body) => (StatusCode::OK, body).into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response(),
    }
}
