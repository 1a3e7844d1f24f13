//! In-process document store

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use uuid::Uuid;

use super::{validate_document_id, DocumentStore, StoreError, StoreResult, WriteResponse, WriteResult};

#[derive(Debug, Default)]
struct MemoryIndex {
    mappings: Value,
    settings: Value,
    mapping_updates: usize,
    documents: HashMap<String, Value>,
}

/// Store keeping indexes in memory; contents are lost on restart
#[derive(Debug, Default)]
pub struct MemoryStore {
    indexes: RwLock<HashMap<String, MemoryIndex>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents held by an index
    pub fn document_count(&self, index: &str) -> usize {
        self.indexes
            .read()
            .get(index)
            .map(|i| i.documents.len())
            .unwrap_or(0)
    }

    /// Mappings and settings an index was created with
    pub fn index_definition(&self, index: &str) -> Option<(Value, Value)> {
        self.indexes
            .read()
            .get(index)
            .map(|i| (i.mappings.clone(), i.settings.clone()))
    }

    /// How many put-mapping calls reached an index
    pub fn mapping_updates(&self, index: &str) -> usize {
        self.indexes
            .read()
            .get(index)
            .map(|i| i.mapping_updates)
            .unwrap_or(0)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn index_exists(&self, index: &str) -> StoreResult<bool> {
        Ok(self.indexes.read().contains_key(index))
    }

    async fn create_index(&self, index: &str, mappings: &Value, settings: &Value) -> StoreResult<bool> {
        let mut indexes = self.indexes.write();
        if indexes.contains_key(index) {
            return Err(StoreError::IndexAlreadyExists(index.to_string()));
        }
        indexes.insert(
            index.to_string(),
            MemoryIndex {
                mappings: mappings.clone(),
                settings: settings.clone(),
                ..Default::default()
            },
        );
        Ok(true)
    }

    async fn put_mapping(&self, index: &str, mappings: &Value) -> StoreResult<bool> {
        let mut indexes = self.indexes.write();
        let entry = indexes
            .get_mut(index)
            .ok_or_else(|| StoreError::IndexNotFound(index.to_string()))?;
        entry.mappings = mappings.clone();
        entry.mapping_updates += 1;
        Ok(true)
    }

    async fn create_document(
        &self,
        index: &str,
        id: Option<&str>,
        source: &Value,
    ) -> StoreResult<WriteResponse> {
        if let Some(id) = id {
            validate_document_id(id)?;
        }
        let mut indexes = self.indexes.write();
        let entry = indexes
            .get_mut(index)
            .ok_or_else(|| StoreError::IndexNotFound(index.to_string()))?;
        let id = match id {
            Some(id) => id.to_string(),
            None => Uuid::new_v4().simple().to_string(),
        };
        if entry.documents.contains_key(&id) {
            return Err(StoreError::DocumentExists {
                index: index.to_string(),
                id,
            });
        }
        entry.documents.insert(id.clone(), source.clone());
        Ok(WriteResponse {
            id,
            result: WriteResult::Created,
        })
    }

    async fn get_document(&self, index: &str, id: &str) -> StoreResult<Option<Value>> {
        let indexes = self.indexes.read();
        let entry = indexes
            .get(index)
            .ok_or_else(|| StoreError::IndexNotFound(index.to_string()))?;
        Ok(entry.documents.get(id).cloned())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
