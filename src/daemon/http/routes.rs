//! HTTP API Route Definitions
//!
//! Defines the REST API routes for collabd.

use axum::{
    middleware,
    routing::{any, get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use super::auth::{auth_middleware, AuthState};
use super::handlers::{self, AppState};

/// Prefix shared by the observability plugin routes
pub const BASE_URI: &str = "/_plugins/_observability";

/// Create the API router with all routes
pub fn create_router(app_state: AppState, auth_state: AuthState) -> Router {
    let collaborations = Router::new()
        .route(
            "/collaborations",
            post(handlers::create_collaboration).fallback(handlers::method_not_allowed),
        )
        // Reserved for get/update/delete and comments; not served yet
        .route(
            "/collaborations/:collaborationId",
            any(handlers::method_not_allowed),
        )
        .route(
            "/collaborations/:collaborationId/comment",
            any(handlers::method_not_allowed),
        )
        .route(
            "/collaborations/:collaborationId/comment/:commentId",
            any(handlers::method_not_allowed),
        )
        .layer(middleware::from_fn_with_state(auth_state, auth_middleware))
        .with_state(app_state);

    Router::new()
        // Health check (no identity needed)
        .route("/health", get(handlers::health))
        .nest(BASE_URI, collaborations)
        .layer(TraceLayer::new_for_http())
}
