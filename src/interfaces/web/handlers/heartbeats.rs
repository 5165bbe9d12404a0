use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::super::AppState;
use super::internal_error;

pub async fn list_heartbeats(State(state): State<AppState>) -> Response {
    match state.store().and_then(|store| store.list_jobs()) {
        Ok(jobs) => Json(serde_json::json!({ "jobs": jobs })).into_response(),
        Err(err) => internal_error(err).into_response(),
    }
}

pub async fn get_heartbeat(Path(id): Path<String>, State(state): State<AppState>) -> Response {
    match state.store().and_then(|store| store.get_job(&id)) {
        Ok(Some(job)) => Json(serde_json::json!({ "job": job })).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "Job not found" })),
        )
            .into_response(),
        Err(err) => internal_error(err).into_response(),
    }
}
