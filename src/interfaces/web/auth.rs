use axum::{
    Json,
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::AppState;

/// Gate every route behind the dashboard token when one is configured.
/// Accepts either `?token=<t>` or `Authorization: Bearer <t>`. No token
/// configured means open access (loopback mode).
pub async fn require_token(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let Some(expected) = state.token.as_deref() else {
        return next.run(req).await;
    };

    let query_token = req.uri().query().and_then(|q| query_param(q, "token"));
    let bearer = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "));

    if query_token.as_deref() == Some(expected) || bearer == Some(expected) {
        return next.run(req).await;
    }

    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({ "error": "Unauthorized: valid token required" })),
    )
        .into_response()
}

/// Tokens are plain hex, so no percent-decoding is needed.
fn query_param(query: &str, key: &str) -> Option<String> {
    query.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k == key).then(|| v.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::openclaw::testing::FakeGateway;
    use axum::{Router, middleware, routing::get};
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Instant;
    use tokio::sync::Mutex;
    use tower::util::ServiceExt;

    fn test_state(token: Option<&str>) -> AppState {
        AppState {
            db_path: std::env::temp_dir().join("pacekeeper-auth-test.db"),
            config: "pacekeeper.yaml".to_string(),
            token: token.map(str::to_string),
            last_refresh: Arc::new(Mutex::new(None::<Instant>)),
            gateway: Arc::new(FakeGateway::default()),
        }
    }

    fn protected_app(state: AppState) -> Router {
        Router::new()
            .route(
                "/api/ping",
                get(|| async { Json(json!({ "ok": true })).into_response() }),
            )
            .layer(middleware::from_fn_with_state(
                state.clone(),
                super::require_token,
            ))
            .with_state(state)
    }

    async fn ping_status(app: Router, path: &str, headers: Vec<(&str, String)>) -> StatusCode {
        let mut builder = Request::builder().uri(path);
        for (k, v) in headers {
            builder = builder.header(k, v);
        }
        let req = builder.body(Body::empty()).unwrap();
        app.oneshot(req).await.unwrap().status()
    }

    #[tokio::test]
    async fn no_token_configured_allows_everything() {
        let app = protected_app(test_state(None));
        assert_eq!(ping_status(app, "/api/ping", vec![]).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_token_is_unauthorized() {
        let app = protected_app(test_state(Some("s3cret")));
        assert_eq!(
            ping_status(app, "/api/ping", vec![]).await,
            StatusCode::UNAUTHORIZED
        );
    }

    #[tokio::test]
    async fn query_token_is_accepted() {
        let app = protected_app(test_state(Some("s3cret")));
        assert_eq!(
            ping_status(app, "/api/ping?token=s3cret", vec![]).await,
            StatusCode::OK
        );
    }

    #[tokio::test]
    async fn bearer_token_is_accepted() {
        let app = protected_app(test_state(Some("s3cret")));
        assert_eq!(
            ping_status(
                app,
                "/api/ping",
                vec![("authorization", "Bearer s3cret".to_string())]
            )
            .await,
            StatusCode::OK
        );
    }

    #[tokio::test]
    async fn wrong_token_is_unauthorized() {
        let app = protected_app(test_state(Some("s3cret")));
        assert_eq!(
            ping_status(app, "/api/ping?token=wrong", vec![]).await,
            StatusCode::UNAUTHORIZED
        );
    }
}
