use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, Request, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::http::server::AppState;

/// Require `Authorization: Bearer <admin.api_key>` on every request.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let expected = &state.fleet.config.admin.api_key;

    let presented = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    if presented == Some(expected.as_str()) {
        return Ok(next.run(request).await);
    }

    tracing::warn!(path = %request.uri().path(), "Rejected request with missing or invalid API key");
    Err(StatusCode::UNAUTHORIZED)
}
