//! HTTP API Server
//!
//! Axum-based HTTP server for the collabd REST API.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::http::Method;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::config::{AuthConfig, HttpConfig};
use crate::daemon::actions::CollaborationActions;

use super::auth::AuthState;
use super::handlers::AppState;
use super::routes::create_router;

/// HTTP API server
pub struct HttpServer {
    config: HttpConfig,
    auth: AuthState,
    actions: CollaborationActions,
}

impl HttpServer {
    /// Create a new HTTP server
    pub fn new(config: HttpConfig, auth: &AuthConfig, actions: CollaborationActions) -> Self {
        Self {
            config,
            auth: AuthState::from_config(auth),
            actions,
        }
    }

    /// Run the HTTP server until `shutdown` fires
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) -> Result<()> {
        let addr: SocketAddr = self
            .config
            .listen_addr
            .parse()
            .context("Invalid HTTP listen address")?;

        let app_state = AppState {
            actions: self.actions.clone(),
        };
        let mut app = create_router(app_state, self.auth.clone());

        if self.config.cors_enabled {
            let cors = CorsLayer::new()
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers(Any)
                .allow_origin(Any);
            app = app.layer(cors);
        }

        let listener = TcpListener::bind(&addr)
            .await
            .context("Failed to bind HTTP server")?;

        info!("HTTP API server listening on http://{}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                info!("HTTP server shutting down");
            })
            .await
            .context("HTTP server error")?;

        Ok(())
    }
}
