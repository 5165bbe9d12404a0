use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};

use super::super::AppState;
use super::internal_error;

pub async fn get_status(State(state): State<AppState>) -> Response {
    let result = state.store().and_then(|store| {
        let counts = store.status_counts()?;
        let next_job = store.next_job()?;
        let failing_jobs = store.failing_jobs()?;
        Ok((counts, next_job, failing_jobs))
    });

    match result {
        Ok((counts, next_job, failing_jobs)) => Json(serde_json::json!({
            "active": counts.active,
            "failing": counts.failing,
            "managed": counts.managed,
            "unmanaged": counts.unmanaged,
            "nextJob": next_job,
            "failingJobs": failing_jobs,
        }))
        .into_response(),
        Err(err) => internal_error(err).into_response(),
    }
}
