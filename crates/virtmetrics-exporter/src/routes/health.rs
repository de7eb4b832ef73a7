//! Health check endpoint.

use axum::{extract::State, routing::get, Json, Router};
use virtmetrics_core::Registrar;

use crate::json::HealthResponse;
use crate::AppState;

/// Health check routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let ready = state.metrics.component().ready_status().value(&[]) == Some(1.0);
    let leading = state.metrics.component().leading_status().value(&[]) == Some(1.0);

    Json(HealthResponse {
        status: if ready { "healthy" } else { "starting" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.registry.uptime_secs(),
        metrics: state.registry.list_metrics().len(),
        collectors: state.registry.collector_names(),
        leading,
    })
}
