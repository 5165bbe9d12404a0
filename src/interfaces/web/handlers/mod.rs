pub mod heartbeats;
pub mod occurrences;
pub mod refresh;
pub mod runs;
pub mod status;

use axum::{Json, http::StatusCode};

use crate::core::error::PacekeeperError;

pub(crate) fn internal_error(err: PacekeeperError) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": err.to_string() })),
    )
}

pub(crate) fn bad_request(message: &str) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": message })),
    )
}

/// Positive integer query parameter with a default and an upper cap.
/// None means the value was present but not a positive integer.
pub(crate) fn parse_positive(raw: Option<&str>, default: i64, cap: i64) -> Option<i64> {
    let Some(raw) = raw else {
        return Some(default);
    };
    match raw.parse::<i64>() {
        Ok(n) if n > 0 => Some(n.min(cap)),
        _ => None,
    }
}
