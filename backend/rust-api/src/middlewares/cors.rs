use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::services::AppState;

/// POST endpoints that answer browser preflight requests.
pub const PREFLIGHT_PATHS: &[&str] = &[
    "/submit",
    "/api/otp/send",
    "/api/otp/verify",
    "/api/chat",
    "/api/quiz/game",
    "/api/quiz/submit",
    "/api/SecondaryPortal/ownerRegistration",
];

/// Echoes the caller's `Origin` (or the configured default) on every response
/// and answers preflight `OPTIONS` for the POST endpoints.
pub async fn cors_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let origin = allowed_origin(request.headers(), &state.config.default_origin);

    if request.method() == Method::OPTIONS && PREFLIGHT_PATHS.contains(&request.uri().path()) {
        tracing::debug!("Preflight {} from {:?}", request.uri().path(), origin);
        return preflight_response(origin);
    }

    let mut response = next.run(request).await;
    response
        .headers_mut()
        .insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    response
}

fn allowed_origin(headers: &HeaderMap, default_origin: &str) -> HeaderValue {
    headers
        .get(header::ORIGIN)
        .cloned()
        .or_else(|| HeaderValue::from_str(default_origin).ok())
        .unwrap_or_else(|| HeaderValue::from_static("*"))
}

fn preflight_response(origin: HeaderValue) -> Response {
    let mut response = StatusCode::OK.into_response();
    let headers = response.headers_mut();
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    response
}
