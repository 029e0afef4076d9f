//! Banner, health check and metrics handlers.

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};
use chrono::Utc;
use serde_json::{Value, json};

use crate::api::state::AppState;
use crate::cli::APPLICATION_DESCRIPTION;
use crate::service::Counter;

/// Content type of the Prometheus text exposition format.
const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Static banner: service name and version. Never touches the backend.
pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    state.metrics.increment(Counter::Index);

    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        banner(),
    )
}

/// Banner text served at `/`.
#[must_use]
pub fn banner() -> String {
    format!("{APPLICATION_DESCRIPTION} v{}\n", env!("CARGO_PKG_VERSION"))
}

/// Liveness probe - always returns 200 if the service is running.
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Readiness probe - checks that the backend answers.
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let backend_ok = state.backend.health_check().await.is_ok();

    let status_code = if backend_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = Json(json!({
        "ready": backend_ok,
        "components": {
            "backend": backend_ok
        }
    }));

    (status_code, response)
}

/// Prometheus metrics endpoint.
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let body = state.metrics.snapshot().render_prometheus(Utc::now());

    ([(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)], body)
}
