//! Daemon Module
//!
//! The collabd daemon serves the collaboration REST API and owns the
//! collaborations system index.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      collabd daemon                       │
//! │                                                           │
//! │  ┌────────────┐   ┌─────────────┐   ┌─────────────────┐   │
//! │  │ HTTP API   │──▶│ Actions     │──▶│ Index Manager   │───┼──▶ document store
//! │  │ (axum)     │   │ (access     │   │ (lazy create,   │   │
//! │  │            │   │  gate)      │   │  mapping sync)  │   │
//! │  └────────────┘   └─────────────┘   └─────────────────┘   │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```bash
//! collabd start
//! ```

pub mod actions;
pub mod http;
pub mod index_manager;
pub mod lifecycle;
pub mod protocol;

pub use actions::CollaborationActions;
pub use http::HttpServer;
pub use index_manager::{IndexManager, COLLABORATIONS_INDEX_NAME};
pub use lifecycle::Daemon;
pub use protocol::{CreateCollaborationRequest, CreateCollaborationResponse};
