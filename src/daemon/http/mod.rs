//! HTTP API Server Module
//!
//! REST surface of the collaboration service, mounted under
//! `/_plugins/_observability`.

pub mod auth;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod types;

pub use auth::AuthState;
pub use handlers::AppState;
pub use routes::{create_router, BASE_URI};
pub use server::HttpServer;
