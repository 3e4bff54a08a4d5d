use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::admin::AdminState;
use crate::breaker::Stats;

pub async fn list_breakers(State(state): State<AdminState>) -> Json<Vec<Stats>> {
    Json(state.registry.stats())
}

pub async fn get_breaker(
    State(state): State<AdminState>,
    Path(name): Path<String>,
) -> Result<Json<Stats>, StatusCode> {
    state
        .registry
        .get(&name)
        .map(|breaker| Json(breaker.stats()))
        .ok_or(StatusCode::NOT_FOUND)
}

pub async fn reset_breaker(
    State(state): State<AdminState>,
    Path(name): Path<String>,
) -> StatusCode {
    if state.registry.reset(&name) {
        tracing::info!(breaker = %name, "Breaker reset via admin API");
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}
