//! Node API endpoints
//!
//! Lookup of gateway nodes and triggering of channel-driven updates

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};

use super::{ApiError, ApiState, UpdateResponse, error_response, update_response};
use crate::fleet::NodeRecord;

/// List all nodes
async fn list_nodes(State(state): State<Arc<ApiState>>) -> Json<Vec<NodeRecord>> {
    let fleet = state.fleet.lock().await;
    Json(fleet.list_nodes())
}

/// Get a specific node
async fn get_node(
    State(state): State<Arc<ApiState>>,
    Path(uuid): Path<String>,
) -> Result<Json<NodeRecord>, ApiError> {
    let fleet = state.fleet.lock().await;
    fleet.node_record(&uuid).map(Json).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            error_response("not_found", &format!("node '{uuid}' not found")),
        )
    })
}

/// Apply the artifact staged on the node's channel
async fn trigger_update(
    State(state): State<Arc<ApiState>>,
    Path(uuid): Path<String>,
) -> Result<(StatusCode, Json<UpdateResponse>), ApiError> {
    let result = state.fleet.lock().await.trigger_update(&uuid);
    update_response(result)
}

/// Build node routes
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/", get(list_nodes))
        .route("/{uuid}", get(get_node))
        .route("/{uuid}/trigger", post(trigger_update))
        .with_state(state)
}
