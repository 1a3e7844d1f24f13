//! Error taxonomy for the collaboration service
//!
//! Every failure is either swallowed at the point of occurrence (expected
//! provisioning races, handled in the index manager) or surfaces here as a
//! terminal failure of the current request.

use axum::http::StatusCode;

use crate::store::StoreError;
use crate::stream::StreamError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Caller identity absent or malformed
    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    /// A mandatory structured-text field was absent
    #[error("{0} field absent")]
    MissingField(String),

    /// A structured-text field had the wrong shape
    #[error("field {field} must be {expected}")]
    InvalidField {
        field: String,
        expected: &'static str,
    },

    /// Store did not report the document as created
    #[error("{0}")]
    StoreWriteFailed(String),

    /// Blocking store call exceeded the operation timeout
    #[error("{operation} timed out after {timeout_ms}ms")]
    Timeout {
        operation: &'static str,
        timeout_ms: u64,
    },

    /// Store answered an admin call without acknowledging it
    #[error("{0} not acknowledged")]
    NotAcknowledged(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Stream(#[from] StreamError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn missing(field: &str) -> Self {
        Self::MissingField(field.to_string())
    }

    pub fn invalid(field: &str, expected: &'static str) -> Self {
        Self::InvalidField {
            field: field.to_string(),
            expected,
        }
    }

    /// HTTP status this error is reported with
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::AuthenticationRequired(_) => StatusCode::UNAUTHORIZED,
            Self::MissingField(_)
            | Self::InvalidField { .. }
            | Self::Stream(_)
            | Self::Store(StoreError::InvalidDocumentId(_)) => StatusCode::BAD_REQUEST,
            Self::Store(StoreError::DocumentExists { .. }) => StatusCode::CONFLICT,
            Self::StoreWriteFailed(_)
            | Self::Timeout { .. }
            | Self::NotAcknowledged(_)
            | Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error code for response bodies
    pub fn code(&self) -> &'static str {
        match self {
            Self::AuthenticationRequired(_) => "UNAUTHORIZED",
            Self::MissingField(_)
            | Self::InvalidField { .. }
            | Self::Stream(_)
            | Self::Store(StoreError::InvalidDocumentId(_)) => "BAD_REQUEST",
            Self::Store(StoreError::DocumentExists { .. }) => "CONFLICT",
            Self::Timeout { .. } => "TIMEOUT",
            _ => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_map_to_4xx() {
        assert_eq!(
            Error::missing("collaboration").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::AuthenticationRequired("no user".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        let conflict = Error::Store(StoreError::DocumentExists {
            index: "i".into(),
            id: "d".into(),
        });
        assert_eq!(conflict.status_code(), StatusCode::CONFLICT);
        assert_eq!(conflict.code(), "CONFLICT");

        let bad_id = Error::Store(StoreError::InvalidDocumentId("..".into()));
        assert_eq!(bad_id.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(bad_id.code(), "BAD_REQUEST");
    }

    #[test]
    fn test_store_failures_map_to_500() {
        let err = Error::Timeout {
            operation: "index document",
            timeout_ms: 10,
        };
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "index document timed out after 10ms");
        assert_eq!(
            Error::StoreWriteFailed("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_missing_field_message() {
        assert_eq!(Error::missing("createdTimeMs").to_string(), "createdTimeMs field absent");
    }
}
