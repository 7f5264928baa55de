//! OTA channel API endpoints

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use serde::{Deserialize, Serialize};

use super::{ApiError, ApiState, error_response};
use crate::fleet::{ChannelStatus, StagedArtifact};

#[derive(Deserialize)]
pub struct PostArtifactRequest {
    pub artifact: String,
}

#[derive(Deserialize)]
pub struct ClearQuery {
    pub artifact: String,
}

#[derive(Serialize)]
pub struct ChannelResponse {
    pub status: u16,
    pub result: ChannelStatus,
}

impl From<ChannelStatus> for ChannelResponse {
    fn from(result: ChannelStatus) -> Self {
        Self {
            status: result.code(),
            result,
        }
    }
}

fn respond(result: ChannelStatus) -> (StatusCode, Json<ChannelResponse>) {
    let status = if result.is_ok() {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };
    (status, Json(ChannelResponse::from(result)))
}

/// Show the artifact staged on a channel
async fn get_staged(
    State(state): State<Arc<ApiState>>,
    Path(channel): Path<String>,
) -> Result<Json<StagedArtifact>, ApiError> {
    let fleet = state.fleet.lock().await;
    fleet
        .staged_artifact(&channel)
        .cloned()
        .map(Json)
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                error_response("not_found", &format!("nothing staged on '{channel}'")),
            )
        })
}

/// Stage an artifact, replacing the current one
async fn post_artifact(
    State(state): State<Arc<ApiState>>,
    Path(channel): Path<String>,
    Json(body): Json<PostArtifactRequest>,
) -> (StatusCode, Json<ChannelResponse>) {
    let result = state
        .fleet
        .lock()
        .await
        .post_artifact(&channel, &body.artifact);
    respond(result)
}

/// Remove the staged artifact if it is still the one given
async fn clear_artifact(
    State(state): State<Arc<ApiState>>,
    Path(channel): Path<String>,
    Query(query): Query<ClearQuery>,
) -> (StatusCode, Json<ChannelResponse>) {
    let result = state
        .fleet
        .lock()
        .await
        .clear_artifact(&channel, &query.artifact);
    respond(result)
}

/// Build channel routes
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route(
            "/{channel}",
            get(get_staged).post(post_artifact).delete(clear_artifact),
        )
        .with_state(state)
}
