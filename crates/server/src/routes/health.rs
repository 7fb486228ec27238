use std::sync::Arc;
use std::time::SystemTime;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::ServerState;

static SERVER_START_TIME: once_cell::sync::Lazy<SystemTime> = once_cell::sync::Lazy::new(SystemTime::now);

/// Live dependency health rollup (§4.8). Unlike a liveness probe, the
/// status reported here reflects actual breaker state, not just whether
/// the process is up.
pub async fn health_check(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let report = state.health.report();
    let uptime_seconds = SERVER_START_TIME.elapsed().map(|d| d.as_secs()).unwrap_or(0);

    Json(json!({
        "status": report.status,
        "uptimeSeconds": uptime_seconds,
        "catalogLoaded": state.catalog.is_loaded(),
        "catalogSize": state.catalog.current().len(),
        "dependencies": report.dependencies,
    }))
}
