use std::sync::Arc;

use axum::extract::Request;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;

use crate::error::ServerError;
use crate::state::ServerState;

/// API-key authentication, applied only when at least one key is
/// configured (§6: off by default).
pub async fn api_key_auth(
    state: axum::extract::State<Arc<ServerState>>,
    request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    if !state.auth_enabled() {
        return Ok(next.run(request).await);
    }

    let api_key = request
        .headers()
        .get("x-api-key")
        .or_else(|| request.headers().get(AUTHORIZATION))
        .and_then(|v| v.to_str().ok())
        .map(|s| s.strip_prefix("Bearer ").unwrap_or(s).to_string());

    match api_key {
        Some(key) => {
            if !state.is_valid_api_key(&key) {
                return Err(ServerError::Authentication("invalid API key".into()));
            }
            if !state.check_rate_limit(&key) {
                return Err(ServerError::Authentication("rate limit exceeded".into()));
            }
            Ok(next.run(request).await)
        }
        None => Err(ServerError::Authentication(
            "API key required in 'x-api-key' or 'Authorization: Bearer <key>' header".into(),
        )),
    }
}

/// Request ID injection, echoed back on the response for correlation.
pub async fn request_id(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    request.extensions_mut().insert(request_id.clone());
    let mut response = next.run(request).await;
    response.headers_mut().insert("x-request-id", request_id.parse().unwrap());
    response
}

/// Structured request/response logging.
pub async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();
    let request_id = request.extensions().get::<String>().cloned().unwrap_or_default();

    tracing::info!(method = %method, uri = %uri, request_id = %request_id, "request started");
    let response = next.run(request).await;
    let duration = start.elapsed();

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %response.status(),
        duration_ms = %duration.as_millis(),
        request_id = %request_id,
        "request completed"
    );
    response
}
