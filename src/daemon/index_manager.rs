//! Index Manager
//!
//! Owns the collaborations system index: lazily creates it (or refreshes its
//! mapping) on first use, then performs create-only document writes.
//!
//! Per process the index moves through:
//!
//! ```text
//! UNKNOWN ──(missing)──▶ CREATING ──────────▶ EXISTS_CURRENT
//!    │                                              ▲
//!    └──(exists, mapping unconfirmed)──▶ UPDATING_MAPPING
//! ```
//!
//! Once the mapping is confirmed it is never rechecked for the lifetime of
//! the process, so mapping changes applied externally go unnoticed.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result as AnyResult};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::model::{CollaborationObjectDoc, TextOptions};
use crate::store::{self, DocumentStore, StoreError, StoreResult, WriteResult};

/// Name of the backing system index
pub const COLLABORATIONS_INDEX_NAME: &str = ".opensearch-collaborations";

const COLLABORATIONS_MAPPING: &str = include_str!("../../resources/collaborations-mapping.json");
const COLLABORATIONS_SETTINGS: &str = include_str!("../../resources/collaborations-settings.json");

/// Lazily provisioned handle on the collaborations index
pub struct IndexManager {
    store: Arc<dyn DocumentStore>,
    mappings: Value,
    settings: Value,
    operation_timeout: Duration,
    /// Set after the first successful create or mapping update
    mappings_updated: AtomicBool,
}

impl IndexManager {
    /// Create a manager over an existing store client
    pub fn new(store: Arc<dyn DocumentStore>, operation_timeout: Duration) -> AnyResult<Self> {
        let mappings = serde_json::from_str(COLLABORATIONS_MAPPING)
            .context("Bundled collaborations mapping is not valid JSON")?;
        let settings = serde_json::from_str(COLLABORATIONS_SETTINGS)
            .context("Bundled collaborations settings are not valid JSON")?;
        Ok(Self {
            store,
            mappings,
            settings,
            operation_timeout,
            mappings_updated: AtomicBool::new(false),
        })
    }

    /// Build the configured store and a manager over it
    pub fn from_config(config: &StoreConfig) -> AnyResult<Self> {
        let store = store::create_store(config).context("Failed to create document store")?;
        info!("Using {} document store", store.name());
        Self::new(store, config.operation_timeout())
    }

    /// Whether this process already confirmed the index mapping
    pub fn mappings_updated(&self) -> bool {
        self.mappings_updated.load(Ordering::Acquire)
    }

    /// Create a collaboration document.
    ///
    /// Returns the stored id when the store reports the document as created,
    /// `None` for any other write result. An explicit `id` that already
    /// exists fails rather than overwriting.
    pub async fn create_document(
        &self,
        doc: &CollaborationObjectDoc,
        id: Option<&str>,
    ) -> Result<Option<String>> {
        self.ensure_index().await?;

        let source = doc.to_value(TextOptions::default());
        let response = self
            .timed(
                "index document",
                self.store.create_document(COLLABORATIONS_INDEX_NAME, id, &source),
            )
            .await?;

        if response.result != WriteResult::Created {
            warn!("create_document - unexpected response: {:?}", response);
            return Ok(None);
        }
        debug!("Created collaboration object {}", response.id);
        Ok(Some(response.id))
    }

    /// Read back a collaboration document by id.
    ///
    /// Never provisions: a missing index reads as a missing document.
    pub async fn get_document(&self, id: &str) -> Result<Option<CollaborationObjectDoc>> {
        if !self.index_exists().await? {
            return Ok(None);
        }

        let source = self
            .timed(
                "get document",
                self.store.get_document(COLLABORATIONS_INDEX_NAME, id),
            )
            .await?;
        source
            .map(|s| CollaborationObjectDoc::parse(&s, Some(id)))
            .transpose()
    }

    /// Drive the index to EXISTS_CURRENT
    async fn ensure_index(&self) -> Result<()> {
        if !self.index_exists().await? {
            self.create_index().await
        } else if !self.mappings_updated() {
            self.update_mappings().await
        } else {
            Ok(())
        }
    }

    async fn create_index(&self) -> Result<()> {
        let result = self
            .timed(
                "create index",
                self.store
                    .create_index(COLLABORATIONS_INDEX_NAME, &self.mappings, &self.settings),
            )
            .await;
        match result {
            Ok(true) => info!("Index {} creation acknowledged", COLLABORATIONS_INDEX_NAME),
            Ok(false) => {
                return Err(Error::NotAcknowledged(format!(
                    "Index {} creation",
                    COLLABORATIONS_INDEX_NAME
                )))
            }
            // a concurrent creator won the race
            Err(Error::Store(StoreError::IndexAlreadyExists(_))) => {
                debug!("Index {} already created", COLLABORATIONS_INDEX_NAME)
            }
            Err(e) => return Err(e),
        }
        self.mappings_updated.store(true, Ordering::Release);
        Ok(())
    }

    async fn update_mappings(&self) -> Result<()> {
        let result = self
            .timed(
                "update mapping",
                self.store
                    .put_mapping(COLLABORATIONS_INDEX_NAME, &self.mappings),
            )
            .await;
        match result {
            Ok(true) => {
                info!("Index {} update mapping acknowledged", COLLABORATIONS_INDEX_NAME);
                self.mappings_updated.store(true, Ordering::Release);
                Ok(())
            }
            Ok(false) => Err(Error::NotAcknowledged(format!(
                "Index {} update mapping",
                COLLABORATIONS_INDEX_NAME
            ))),
            // deleted under us; the next request provisions it again
            Err(Error::Store(e @ StoreError::IndexNotFound(_))) => {
                error!("Update mapping failed: {}", e);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn index_exists(&self) -> Result<bool> {
        self.timed(
            "check index",
            self.store.index_exists(COLLABORATIONS_INDEX_NAME),
        )
        .await
    }

    /// Bound a store call by the operation timeout
    async fn timed<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = StoreResult<T>>,
    ) -> Result<T> {
        match tokio::time::timeout(self.operation_timeout, call).await {
            Ok(result) => result.map_err(Error::from),
            Err(_) => Err(Error::Timeout {
                operation,
                timeout_ms: self.operation_timeout.as_millis() as u64,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Collaboration, ObjectData};
    use crate::store::{MemoryStore, WriteResponse};
    use async_trait::async_trait;
    use chrono::DateTime;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Barrier;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn doc() -> CollaborationObjectDoc {
        let t = DateTime::from_timestamp_millis(1_700_000_000_000).unwrap();
        CollaborationObjectDoc {
            collaboration_id: String::new(),
            updated_time: t,
            created_time: t,
            tenant: String::new(),
            access: vec!["User:alice".into()],
            object_data: ObjectData::Collaboration(Collaboration::text("p1", "par1", "l1")),
        }
    }

    /// Store wrapper with scripted misbehavior on top of [`MemoryStore`]
    #[derive(Debug, Default)]
    struct ScriptedStore {
        inner: MemoryStore,
        /// Callers wait here in `index_exists` until all have arrived
        exists_barrier: Option<Barrier>,
        put_mapping_not_found: bool,
        unacknowledged: bool,
        write_result: Option<WriteResult>,
        write_delay: Option<Duration>,
        create_calls: AtomicUsize,
        put_mapping_calls: AtomicUsize,
    }

    #[async_trait]
    impl DocumentStore for ScriptedStore {
        async fn index_exists(&self, index: &str) -> StoreResult<bool> {
            let exists = self.inner.index_exists(index).await?;
            if let Some(barrier) = &self.exists_barrier {
                barrier.wait().await;
            }
            Ok(exists)
        }

        async fn create_index(&self, index: &str, mappings: &Value, settings: &Value) -> StoreResult<bool> {
            self.create_calls.fetch_add(1, Ordering::SeqCst);
            let ack = self.inner.create_index(index, mappings, settings).await?;
            Ok(ack && !self.unacknowledged)
        }

        async fn put_mapping(&self, index: &str, mappings: &Value) -> StoreResult<bool> {
            self.put_mapping_calls.fetch_add(1, Ordering::SeqCst);
            if self.put_mapping_not_found {
                return Err(StoreError::IndexNotFound(index.to_string()));
            }
            let ack = self.inner.put_mapping(index, mappings).await?;
            Ok(ack && !self.unacknowledged)
        }

        async fn create_document(
            &self,
            index: &str,
            id: Option<&str>,
            source: &Value,
        ) -> StoreResult<WriteResponse> {
            if let Some(delay) = self.write_delay {
                tokio::time::sleep(delay).await;
            }
            let mut response = self.inner.create_document(index, id, source).await?;
            if let Some(result) = self.write_result {
                response.result = result;
            }
            Ok(response)
        }

        async fn get_document(&self, index: &str, id: &str) -> StoreResult<Option<Value>> {
            self.inner.get_document(index, id).await
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    #[test]
    fn test_bundled_resources_parse() {
        let manager = IndexManager::new(Arc::new(MemoryStore::new()), TIMEOUT).unwrap();
        assert!(manager.mappings["properties"]["collaboration"].is_object());
        assert_eq!(manager.settings["index"]["number_of_shards"], 1);
        assert!(!manager.mappings_updated());
    }

    #[tokio::test]
    async fn test_first_write_creates_index() {
        let store = Arc::new(MemoryStore::new());
        let manager = IndexManager::new(store.clone(), TIMEOUT).unwrap();

        let id = manager.create_document(&doc(), None).await.unwrap().unwrap();
        assert!(!id.is_empty());
        assert!(manager.mappings_updated());

        let (mappings, settings) = store.index_definition(COLLABORATIONS_INDEX_NAME).unwrap();
        assert_eq!(mappings, manager.mappings);
        assert_eq!(settings, manager.settings);
        assert_eq!(store.mapping_updates(COLLABORATIONS_INDEX_NAME), 0);
    }

    #[tokio::test]
    async fn test_existing_index_gets_mapping_update_once() {
        let store = Arc::new(MemoryStore::new());
        store
            .create_index(COLLABORATIONS_INDEX_NAME, &Value::Null, &Value::Null)
            .await
            .unwrap();
        let manager = IndexManager::new(store.clone(), TIMEOUT).unwrap();

        manager.create_document(&doc(), None).await.unwrap();
        manager.create_document(&doc(), None).await.unwrap();
        manager.create_document(&doc(), None).await.unwrap();

        assert_eq!(store.mapping_updates(COLLABORATIONS_INDEX_NAME), 1);
        assert_eq!(store.document_count(COLLABORATIONS_INDEX_NAME), 3);
    }

    #[tokio::test]
    async fn test_concurrent_first_writes_converge() {
        let store = Arc::new(ScriptedStore {
            exists_barrier: Some(Barrier::new(2)),
            ..Default::default()
        });
        let manager = IndexManager::new(store.clone(), TIMEOUT).unwrap();

        let first = doc();
        let second = doc();
        let (a, b) = tokio::join!(
            manager.create_document(&first, Some("a")),
            manager.create_document(&second, Some("b")),
        );

        assert_eq!(a.unwrap().as_deref(), Some("a"));
        assert_eq!(b.unwrap().as_deref(), Some("b"));
        // both saw a missing index and both tried to create it
        assert_eq!(store.create_calls.load(Ordering::SeqCst), 2);
        assert_eq!(store.inner.document_count(COLLABORATIONS_INDEX_NAME), 2);
        assert!(manager.mappings_updated());
    }

    #[tokio::test]
    async fn test_mapping_update_index_not_found_is_swallowed() {
        let store = Arc::new(ScriptedStore {
            put_mapping_not_found: true,
            ..Default::default()
        });
        store
            .inner
            .create_index(COLLABORATIONS_INDEX_NAME, &Value::Null, &Value::Null)
            .await
            .unwrap();
        let manager = IndexManager::new(store.clone(), TIMEOUT).unwrap();

        let id = manager.create_document(&doc(), None).await.unwrap();
        assert!(id.is_some());
        assert!(!manager.mappings_updated());

        // still unconfirmed, so the next write retries the mapping update
        manager.create_document(&doc(), None).await.unwrap();
        assert_eq!(store.put_mapping_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unacknowledged_create_is_fatal() {
        let store = Arc::new(ScriptedStore {
            unacknowledged: true,
            ..Default::default()
        });
        let manager = IndexManager::new(store, TIMEOUT).unwrap();

        let err = manager.create_document(&doc(), None).await.unwrap_err();
        assert!(matches!(err, Error::NotAcknowledged(_)));
        assert!(!manager.mappings_updated());
    }

    #[tokio::test]
    async fn test_non_created_result_yields_none() {
        let store = Arc::new(ScriptedStore {
            write_result: Some(WriteResult::Updated),
            ..Default::default()
        });
        let manager = IndexManager::new(store, TIMEOUT).unwrap();
        assert_eq!(manager.create_document(&doc(), None).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_explicit_id_is_create_only() {
        let manager = IndexManager::new(Arc::new(MemoryStore::new()), TIMEOUT).unwrap();

        let id = manager.create_document(&doc(), Some("thread-1")).await.unwrap();
        assert_eq!(id.as_deref(), Some("thread-1"));

        let err = manager
            .create_document(&doc(), Some("thread-1"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Store(StoreError::DocumentExists { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_store_times_out() {
        let store = Arc::new(ScriptedStore {
            write_delay: Some(Duration::from_secs(10)),
            ..Default::default()
        });
        let manager = IndexManager::new(store, Duration::from_millis(50)).unwrap();

        let err = manager.create_document(&doc(), None).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Timeout {
                operation: "index document",
                timeout_ms: 50
            }
        ));
    }

    #[tokio::test]
    async fn test_get_document_uses_store_id() {
        let manager = IndexManager::new(Arc::new(MemoryStore::new()), TIMEOUT).unwrap();
        let id = manager.create_document(&doc(), None).await.unwrap().unwrap();

        let stored = manager.get_document(&id).await.unwrap().unwrap();
        assert_eq!(stored.collaboration_id, id);
        assert_eq!(stored.access, doc().access);
        assert_eq!(stored.object_data, doc().object_data);

        assert_eq!(manager.get_document("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_get_document_does_not_provision() {
        let store = Arc::new(ScriptedStore::default());
        let manager = IndexManager::new(store.clone(), TIMEOUT).unwrap();

        assert_eq!(manager.get_document("any").await.unwrap(), None);
        assert!(!store.inner.index_exists(COLLABORATIONS_INDEX_NAME).await.unwrap());
        assert_eq!(store.create_calls.load(Ordering::SeqCst), 0);

        // an existing index with an unconfirmed mapping is read as-is
        store
            .inner
            .create_index(COLLABORATIONS_INDEX_NAME, &Value::Null, &Value::Null)
            .await
            .unwrap();
        assert_eq!(manager.get_document("any").await.unwrap(), None);
        assert_eq!(store.put_mapping_calls.load(Ordering::SeqCst), 0);
        assert!(!manager.mappings_updated());
    }
}
