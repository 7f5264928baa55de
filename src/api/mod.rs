//! HTTP API server for the fleet OTA gateway

mod auth;
pub mod channels;
pub mod endpoints;
pub mod health;
pub mod nodes;

use std::sync::Arc;

use axum::{Json, Router, http::StatusCode, middleware};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::fleet::{Fleet, Rejection, UpdateOutcome};
use crate::{Error, Result};

/// Fleet shared between request handlers
pub type SharedFleet = Arc<Mutex<Fleet>>;

/// Shared state for API handlers
#[derive(Clone)]
pub struct ApiState {
    pub fleet: SharedFleet,
    pub api_key: Option<String>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

pub(crate) fn error_response(code: &str, message: &str) -> Json<ErrorResponse> {
    Json(ErrorResponse {
        error: ErrorDetail {
            code: code.to_string(),
            message: message.to_string(),
        },
    })
}

/// Response for node and endpoint update attempts
#[derive(Debug, Serialize)]
pub struct UpdateResponse {
    pub applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection: Option<Rejection>,
}

impl From<UpdateOutcome> for UpdateResponse {
    fn from(outcome: UpdateOutcome) -> Self {
        match outcome {
            UpdateOutcome::Applied { version } => Self {
                applied: true,
                version: Some(version),
                rejection: None,
            },
            UpdateOutcome::Rejected(rejection) => Self {
                applied: false,
                version: None,
                rejection: Some(rejection),
            },
        }
    }
}

pub(crate) type ApiError = (StatusCode, Json<ErrorResponse>);

/// Map an update attempt onto an HTTP response
///
/// Unknown devices become 404, malformed artifacts 422; gate
/// rejections are a normal 200 with `applied: false`
pub(crate) fn update_response(
    result: Result<UpdateOutcome>,
) -> std::result::Result<(StatusCode, Json<UpdateResponse>), ApiError> {
    match result {
        Ok(outcome) => {
            let status = match outcome.rejection() {
                Some(Rejection::UnknownNode { .. } | Rejection::UnknownEndpoint { .. }) => {
                    StatusCode::NOT_FOUND
                }
                _ => StatusCode::OK,
            };
            Ok((status, Json(UpdateResponse::from(outcome))))
        }
        Err(e @ Error::MalformedArtifact { .. }) => Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            error_response("malformed_artifact", &e.to_string()),
        )),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            error_response("internal", &e.to_string()),
        )),
    }
}

/// Build the full API router
pub fn router(state: Arc<ApiState>) -> Router {
    let api = Router::new()
        .nest("/nodes", nodes::router(state.clone()))
        .nest("/endpoints", endpoints::router(state.clone()))
        .nest("/channels", channels::router(state.clone()))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_api_key,
        ));

    // CORS layer for cross-origin requests from dashboards
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", api)
        .merge(health::router())
        .merge(health::ready_router(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// HTTP API server over a shared fleet
pub struct ApiServer {
    state: Arc<ApiState>,
    port: u16,
}

impl ApiServer {
    /// Create a server for the given fleet
    #[must_use]
    pub fn new(fleet: Fleet, config: &Config) -> Self {
        Self {
            state: Arc::new(ApiState {
                fleet: Arc::new(Mutex::new(fleet)),
                api_key: config.api_server.api_key.clone(),
            }),
            port: config.api_server.port,
        }
    }

    /// Run the API server
    ///
    /// # Errors
    ///
    /// Returns error if server fails to bind or run
    pub async fn run(self) -> Result<()> {
        if self.state.api_key.is_none() {
            tracing::warn!("no API key configured, mutating routes are unauthenticated");
        }

        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| Error::Config(format!("failed to bind API server: {e}")))?;

        tracing::info!(port = self.port, "API server listening");

        axum::serve(listener, router(self.state))
            .await
            .map_err(|e| Error::Config(format!("API server error: {e}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applied_outcome_has_no_rejection() {
        let response = UpdateResponse::from(UpdateOutcome::Applied {
            version: "34".to_string(),
        });
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["applied"], true);
        assert_eq!(json["version"], "34");
        assert!(json.get("rejection").is_none());
    }

    #[test]
    fn rejection_is_tagged_with_reason() {
        let response =
            UpdateResponse::from(UpdateOutcome::Rejected(Rejection::Backlog { pending: 50 }));
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["applied"], false);
        assert_eq!(json["rejection"]["reason"], "backlog");
        assert_eq!(json["rejection"]["pending"], 50);
    }

    #[test]
    fn malformed_artifact_maps_to_422() {
        let err = Error::MalformedArtifact {
            artifact: "x".to_string(),
            reason: "missing .swu suffix",
        };
        let (status, _) = update_response(Err(err)).unwrap_err();
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
