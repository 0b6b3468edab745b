use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Serialize;

use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct UpdateStarted {
    pub started: bool,
}

/// Starts a trust store update unless one is already running.
pub async fn trigger_update(State(state): State<AppState>) -> (StatusCode, Json<UpdateStarted>) {
    let started = state.updates.trigger();
    (StatusCode::ACCEPTED, Json(UpdateStarted { started }))
}
