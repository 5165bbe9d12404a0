use axum::{
    Router,
    body::Body,
    http::{HeaderValue, Method, Request, header},
    middleware,
    middleware::Next,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;

use super::AppState;
use super::auth;
use super::handlers::{heartbeats, occurrences, refresh, runs, status};

/// The dashboard is same-origin, so CORS only has to admit local browser
/// tooling pointed at the API port.
fn build_localhost_cors(port: u16) -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        format!("http://127.0.0.1:{}", port),
        format!("http://localhost:{}", port),
    ]
    .iter()
    .filter_map(|o| o.parse().ok())
    .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(tower_http::cors::Any)
}

pub fn build_router(state: AppState, port: u16) -> Router {
    Router::new()
        .route("/api/heartbeats", get(heartbeats::list_heartbeats))
        .route("/api/heartbeats/{id}", get(heartbeats::get_heartbeat))
        .route("/api/status", get(status::get_status))
        .route("/api/runs", get(runs::list_runs))
        .route("/api/runs/summary", get(runs::runs_summary))
        .route("/api/occurrences", get(occurrences::list_occurrences))
        .route("/api/refresh", post(refresh::trigger_refresh))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_token,
        ))
        .layer(middleware::from_fn(security_headers))
        .layer(build_localhost_cors(port))
        .with_state(state)
}

async fn security_headers(req: Request<Body>, next: Next) -> axum::response::Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("same-origin"),
    );
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(
            "default-src 'self'; script-src 'self'; style-src 'self' 'unsafe-inline'; \
             font-src 'self' data:; img-src 'self' data:; connect-src 'self'; \
             frame-ancestors 'none'",
        ),
    );
    response
}
