use std::time::Instant;

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

use super::super::{AppState, REFRESH_DEBOUNCE};
use super::internal_error;
use crate::core::config;
use crate::core::discovery;
use crate::core::error::PacekeeperError;

/// Manual discovery trigger, debounced so a dashboard stuck on auto-reload
/// cannot hammer the external scheduler.
pub async fn trigger_refresh(State(state): State<AppState>) -> Response {
    {
        let mut last = state.last_refresh.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < REFRESH_DEBOUNCE {
                let remaining = REFRESH_DEBOUNCE - elapsed;
                let retry_after = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
                return (
                    StatusCode::TOO_MANY_REQUESTS,
                    [(header::RETRY_AFTER, retry_after.to_string())],
                    Json(serde_json::json!({
                        "error": format!("Rate limited. Try again in {retry_after}s.")
                    })),
                )
                    .into_response();
            }
        }
        // Claim the window before the slow part so concurrent callers see it.
        *last = Some(Instant::now());
    }

    let store = match state.store() {
        Ok(store) => store,
        Err(err) => return internal_error(err).into_response(),
    };
    let config_path = config::find_config_path(&state.config);
    match discovery::discover(state.gateway.as_ref(), &store, config_path.as_deref()).await {
        Ok(_) => Json(serde_json::json!({ "success": true })).into_response(),
        Err(err @ PacekeeperError::ExternalQuery(_)) => (
            StatusCode::BAD_GATEWAY,
            Json(serde_json::json!({ "error": err.to_string() })),
        )
            .into_response(),
        Err(err) => internal_error(err).into_response(),
    }
}
