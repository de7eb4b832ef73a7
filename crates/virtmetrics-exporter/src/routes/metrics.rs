//! Metrics exposition and listing endpoints.

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use virtmetrics_controller::list_metrics;
use virtmetrics_core::MetricDescriptor;

use crate::error::AppError;
use crate::AppState;

/// Content type of the text exposition format.
pub const TEXT_FORMAT: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Metrics routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/metrics", get(scrape))
        .route("/metrics/list", get(list))
        .route("/metrics/list/:name", get(describe))
}

/// Poll every collector and render the text exposition.
async fn scrape(State(state): State<AppState>) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, TEXT_FORMAT)], state.registry.to_prometheus())
}

async fn list(State(state): State<AppState>) -> Json<Vec<MetricDescriptor>> {
    Json(list_metrics(state.registry.as_ref()))
}

async fn describe(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<MetricDescriptor>, AppError> {
    list_metrics(state.registry.as_ref())
        .into_iter()
        .find(|m| m.name == name)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("metric {} is not registered", name)))
}
