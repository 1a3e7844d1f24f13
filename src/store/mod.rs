//! Document store client
//!
//! The collaboration service owns no storage engine; index administration
//! and document writes are delegated to a store behind [`DocumentStore`].

mod memory;
mod opensearch;

pub use memory::MemoryStore;
pub use opensearch::OpenSearchStore;

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::{StoreBackend, StoreConfig};

/// Errors reported by a document store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Index creation lost a race with a concurrent creator
    #[error("index [{0}] already exists")]
    IndexAlreadyExists(String),

    /// Index vanished (or never existed) when it was addressed
    #[error("no such index [{0}]")]
    IndexNotFound(String),

    /// Create-only write hit an existing document id
    #[error("document [{id}] already exists in index [{index}]")]
    DocumentExists { index: String, id: String },

    /// Explicit document id the store cannot address
    #[error("invalid document id [{0}]")]
    InvalidDocumentId(String),

    /// Configured store URL cannot carry index paths
    #[error("invalid store url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Network or HTTP error
    #[error("store request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Store answered with something we cannot interpret
    #[error("unexpected store response ({status}): {body}")]
    UnexpectedResponse { status: u16, body: String },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Longest explicit id a store accepts, in bytes
pub const MAX_DOCUMENT_ID_BYTES: usize = 512;

/// Reject explicit ids no backend can use as a single path segment
pub fn validate_document_id(id: &str) -> StoreResult<()> {
    if id.is_empty() || id == "." || id == ".." || id.len() > MAX_DOCUMENT_ID_BYTES {
        return Err(StoreError::InvalidDocumentId(id.to_string()));
    }
    Ok(())
}

/// Outcome of a document write as reported by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteResult {
    Created,
    Updated,
    Deleted,
    NotFound,
    Noop,
}

impl WriteResult {
    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "created" => Self::Created,
            "updated" => Self::Updated,
            "deleted" => Self::Deleted,
            "not_found" => Self::NotFound,
            _ => Self::Noop,
        }
    }
}

/// Store response to a document write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteResponse {
    pub id: String,
    pub result: WriteResult,
}

/// Minimal client surface of a document store.
///
/// Admin calls return whether the store acknowledged them.
#[async_trait]
pub trait DocumentStore: Send + Sync + Debug {
    /// Whether the index is present in the store's routing state
    async fn index_exists(&self, index: &str) -> StoreResult<bool>;

    /// Create an index with the given mappings and settings
    async fn create_index(&self, index: &str, mappings: &Value, settings: &Value) -> StoreResult<bool>;

    /// Apply mappings to an existing index
    async fn put_mapping(&self, index: &str, mappings: &Value) -> StoreResult<bool>;

    /// Create-only document write; never overwrites an existing id.
    /// Without an id the store assigns one.
    async fn create_document(
        &self,
        index: &str,
        id: Option<&str>,
        source: &Value,
    ) -> StoreResult<WriteResponse>;

    /// Fetch a document's source by id
    async fn get_document(&self, index: &str, id: &str) -> StoreResult<Option<Value>>;

    /// Backend name for logging
    fn name(&self) -> &str;
}

/// Build the store selected by configuration
pub fn create_store(config: &StoreConfig) -> StoreResult<Arc<dyn DocumentStore>> {
    match config.backend {
        StoreBackend::Memory => Ok(Arc::new(MemoryStore::new())),
        StoreBackend::OpenSearch => Ok(Arc::new(OpenSearchStore::new(config)?)),
    }
}
