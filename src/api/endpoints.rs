//! Endpoint API endpoints
//!
//! Endpoints are flashed directly; their battery and backlog are
//! reported by the caller

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
};
use serde::Deserialize;

use super::{ApiError, ApiState, UpdateResponse, error_response, update_response};
use crate::fleet::EndpointRecord;

#[derive(Deserialize)]
pub struct UpdateRequest {
    pub artifact: String,
}

#[derive(Deserialize)]
pub struct BacklogRequest {
    pub value: u32,
}

#[derive(Deserialize)]
pub struct BatteryRequest {
    pub value: i64,
}

/// Get a specific endpoint
async fn get_endpoint(
    State(state): State<Arc<ApiState>>,
    Path(serial): Path<String>,
) -> Result<Json<EndpointRecord>, ApiError> {
    let fleet = state.fleet.lock().await;
    fleet.endpoint_record(&serial).map(Json).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            error_response("not_found", &format!("endpoint '{serial}' not found")),
        )
    })
}

/// Flash an artifact onto an endpoint
async fn update_endpoint(
    State(state): State<Arc<ApiState>>,
    Path(serial): Path<String>,
    Json(body): Json<UpdateRequest>,
) -> Result<(StatusCode, Json<UpdateResponse>), ApiError> {
    let result = state
        .fleet
        .lock()
        .await
        .update_endpoint(&serial, &body.artifact);
    update_response(result)
}

/// Set the endpoint's pending work counter
async fn set_backlog(
    State(state): State<Arc<ApiState>>,
    Path(serial): Path<String>,
    Json(body): Json<BacklogRequest>,
) -> StatusCode {
    state.fleet.lock().await.set_backlog(&serial, body.value);
    StatusCode::NO_CONTENT
}

/// Set the endpoint's battery level
async fn set_battery(
    State(state): State<Arc<ApiState>>,
    Path(serial): Path<String>,
    Json(body): Json<BatteryRequest>,
) -> StatusCode {
    state.fleet.lock().await.set_battery(&serial, body.value);
    StatusCode::NO_CONTENT
}

/// Build endpoint routes
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/{serial}", get(get_endpoint))
        .route("/{serial}/update", post(update_endpoint))
        .route("/{serial}/backlog", put(set_backlog))
        .route("/{serial}/battery", put(set_battery))
        .with_state(state)
}
