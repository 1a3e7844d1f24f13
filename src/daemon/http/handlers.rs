//! HTTP API Request Handlers
//!
//! Handlers that map HTTP requests to collaboration actions.

use axum::{
    body::Bytes,
    extract::State,
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde_json::Value;
use tracing::{debug, error};

use crate::access::UserIdentity;
use crate::daemon::actions::CollaborationActions;
use crate::daemon::protocol::CreateCollaborationRequest;
use crate::error::Error;

use super::types::*;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub actions: CollaborationActions,
}

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Create a collaboration object
pub async fn create_collaboration(
    State(state): State<AppState>,
    user: Option<Extension<UserIdentity>>,
    body: Bytes,
) -> Response {
    let value: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            debug!("Rejecting malformed collaboration body: {}", e);
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::bad_request(format!("Malformed JSON body: {}", e))),
            )
                .into_response();
        }
    };

    let user = user.map(|Extension(u)| u);
    let result = match CreateCollaborationRequest::parse(&value, None) {
        Ok(request) => state.actions.create(request, user.as_ref()).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response(&e),
    }
}

/// Every verb the collaboration routes do not serve
pub async fn method_not_allowed(method: Method) -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ErrorResponse::method_not_allowed(method.as_str())),
    )
        .into_response()
}

fn error_response(err: &Error) -> Response {
    let status = err.status_code();
    if status.is_server_error() {
        error!("Collaboration request failed: {}", err);
    } else {
        debug!("Collaboration request rejected: {}", err);
    }
    (status, Json(ErrorResponse::from(err))).into_response()
}
