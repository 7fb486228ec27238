use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use orchestrator::MatchEngineError;
use serde_json::json;

pub type ServerResult<T> = Result<T, ServerError>;

/// HTTP-boundary error taxonomy. Wraps [`MatchEngineError`] with the
/// request-framing concerns (auth, payload shape, routing) that only make
/// sense at this layer (§6, §7).
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Engine(#[from] MatchEngineError),

    #[error("internal server error: {0}")]
    Internal(String),

    #[error("not found")]
    NotFound,
}

impl ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Engine(MatchEngineError::Validation(_)) => StatusCode::BAD_REQUEST,
            ServerError::Engine(MatchEngineError::DependencyUnavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::Engine(MatchEngineError::DeadlineExceeded) => StatusCode::GATEWAY_TIMEOUT,
            ServerError::Engine(MatchEngineError::ConfigInvalid(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::NotFound => StatusCode::NOT_FOUND,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ServerError::Authentication(_) => "AUTH_FAILED",
            ServerError::BadRequest(_) => "BAD_REQUEST",
            ServerError::Engine(err) => err.code(),
            ServerError::Internal(_) => "INTERNAL_ERROR",
            ServerError::NotFound => "NOT_FOUND",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
            }
        }));
        (status, body).into_response()
    }
}

impl From<std::net::AddrParseError> for ServerError {
    fn from(err: std::net::AddrParseError) -> Self {
        ServerError::Internal(format!("invalid address: {err}"))
    }
}

impl From<serde_json::Error> for ServerError {
    fn from(err: serde_json::Error) -> Self {
        ServerError::BadRequest(format!("JSON error: {err}"))
    }
}
