//! Probe and metrics endpoints
//!
//! The operator exposes the operational surface a controller pod needs:
//! liveness at `/healthz`, readiness at `/readyz`, and the engine metrics
//! in Prometheus text format at `/metrics`.

use anyhow::Result;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use ottoscalr_lib::health::{EngineHealth, HealthStatus};
use prometheus::TextEncoder;
use tracing::info;

/// Routes for the probes and metrics exposition
pub fn router(health: EngineHealth) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(health)
}

/// Binds the probe server and serves until the process exits
pub async fn serve(port: u16, health: EngineHealth) -> Result<()> {
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "Probe server listening");
    axum::serve(listener, router(health)).await?;
    Ok(())
}

/// Liveness: 503 only once the engine itself is wedged; collaborator
/// outages keep returning 200 so the pod is not restarted for them
async fn healthz(State(health): State<EngineHealth>) -> Response {
    let snapshot = health.liveness();
    let code = match snapshot.status {
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
    };
    (code, Json(snapshot)).into_response()
}

async fn readyz(State(health): State<EngineHealth>) -> Response {
    let snapshot = health.readiness();
    let code = if snapshot.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(snapshot)).into_response()
}

async fn metrics() -> Response {
    match TextEncoder::new().encode_to_string(&prometheus::gather()) {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("encoding metrics: {e}"),
        )
            .into_response(),
    }
}
