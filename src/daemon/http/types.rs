//! HTTP API Request/Response Types
//!
//! JSON bodies that are not part of the collaboration wire models.

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Whether the service is healthy
    pub healthy: bool,
    /// Service version
    pub version: String,
}

/// Error response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("BAD_REQUEST", message)
    }

    pub fn method_not_allowed(method: &str) -> Self {
        Self::new("METHOD_NOT_ALLOWED", format!("{} is not allowed", method))
    }
}

impl From<&Error> for ErrorResponse {
    fn from(err: &Error) -> Self {
        Self::new(err.code(), err.to_string())
    }
}
