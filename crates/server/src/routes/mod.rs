//! HTTP endpoint handlers, organized by concern.
//!
//! - `matches`: `POST /matches`, the engine's single business endpoint
//! - `health`: `GET /health`, the live dependency rollup

pub mod health;
pub mod matches;

use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::error::{ServerError, ServerResult};

/// Root endpoint: service name, version, and the endpoint list.
pub async fn api_info() -> ServerResult<impl IntoResponse> {
    Ok(Json(json!({
        "name": "creator-match-engine",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": ["/matches", "/health"],
    })))
}

pub async fn not_found() -> ServerError {
    ServerError::NotFound
}
