//! Leader promotion endpoint.
//!
//! Called once this instance wins the leader election. Registering the
//! leader-only metrics is idempotent, so repeated calls are harmless.

use axum::{extract::State, routing::post, Json, Router};

use crate::error::AppError;
use crate::json::LeaderResponse;
use crate::AppState;

/// Leader routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/leader", post(promote))
}

async fn promote(State(state): State<AppState>) -> Result<Json<LeaderResponse>, AppError> {
    state
        .metrics
        .register_leader_metrics(state.registry.as_ref())?;
    state.metrics.component().set_leading(true);
    let outdated_vmis = state.metrics.refresh_outdated_vmis();
    tracing::info!(outdated_vmis, "promoted to leader");

    Ok(Json(LeaderResponse {
        leading: true,
        outdated_vmis,
    }))
}
