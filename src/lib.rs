//! collabd: Collaboration Object Service
//!
//! Stores collaboration objects (comment anchors on a notebook page,
//! paragraph and line) in a dedicated system index:
//! - REST create endpoint under `/_plugins/_observability/collaborations`
//! - Caller identity, tenant and access list stamped on every document
//! - Lazy index provisioning with a one-shot mapping refresh
//! - Structured-text and binary stream forms for every wire model

pub mod access;
pub mod config;
pub mod daemon;
pub mod error;
pub mod model;
pub mod store;
pub mod stream;
pub mod util;

pub use config::Config;
pub use error::{Error, Result};
