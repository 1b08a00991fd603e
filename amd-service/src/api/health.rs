//! Service status endpoint

use axum::{extract::State, routing::get, Json, Router};

use crate::service::HealthStatus;
use crate::AppState;

/// GET /
///
/// Liveness plus whether a real model answers predictions.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(state.service.health())
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/", get(health_check))
}
