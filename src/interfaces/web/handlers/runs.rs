use axum::{
    Json,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use super::super::AppState;
use super::{bad_request, internal_error, parse_positive};

const MAX_LIMIT: i64 = 500;
const MAX_SUMMARY_DAYS: i64 = 90;

#[derive(Deserialize)]
pub struct RunsQuery {
    job_id: Option<String>,
    limit: Option<String>,
}

pub async fn list_runs(State(state): State<AppState>, Query(query): Query<RunsQuery>) -> Response {
    let Some(job_id) = query.job_id else {
        return bad_request("job_id parameter required").into_response();
    };
    let Some(limit) = parse_positive(query.limit.as_deref(), 50, MAX_LIMIT) else {
        return bad_request("limit must be a positive integer").into_response();
    };

    match state
        .store()
        .and_then(|store| store.runs_for_job(&job_id, limit))
    {
        Ok(runs) => Json(serde_json::json!({ "runs": runs })).into_response(),
        Err(err) => internal_error(err).into_response(),
    }
}

#[derive(Deserialize)]
pub struct SummaryQuery {
    days: Option<String>,
}

pub async fn runs_summary(
    State(state): State<AppState>,
    Query(query): Query<SummaryQuery>,
) -> Response {
    let Some(days) = parse_positive(query.days.as_deref(), 7, MAX_SUMMARY_DAYS) else {
        return bad_request("days must be a positive integer").into_response();
    };

    match state.store().and_then(|store| store.run_summary(days)) {
        Ok(summary) => Json(serde_json::json!({ "summary": summary })).into_response(),
        Err(err) => internal_error(err).into_response(),
    }
}
