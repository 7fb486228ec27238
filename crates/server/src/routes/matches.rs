use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use scoring::{Assignment, MatchResponse};
use serde::Deserialize;

use crate::error::ServerResult;
use crate::state::ServerState;

/// Request body for `POST /matches`. `assignmentId` is optional; when
/// present, the response is also handed to the persistence port (§4.7
/// step 9, §9).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRequest {
    #[serde(flatten)]
    pub assignment: Assignment,
    #[serde(default)]
    pub assignment_id: Option<String>,
}

/// Match a content brief against the creator catalog and return the
/// ranked top-K creators.
pub async fn create_match(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<MatchRequest>,
) -> ServerResult<Json<MatchResponse>> {
    let response = state
        .orchestrator
        .match_assignment(request.assignment, request.assignment_id)
        .await?;
    Ok(Json(response))
}
