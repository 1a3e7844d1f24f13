//! OpenSearch-compatible REST store
//!
//! Speaks the subset of the index/document REST API the collaboration
//! service needs: index exists, create index, put mapping, create-only
//! document write and get by id.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::{validate_document_id, DocumentStore, StoreError, StoreResult, WriteResponse, WriteResult};
use crate::config::StoreConfig;

const RESOURCE_ALREADY_EXISTS: &str = "resource_already_exists_exception";
const INDEX_NOT_FOUND: &str = "index_not_found_exception";
const VERSION_CONFLICT: &str = "version_conflict_engine_exception";

#[derive(Debug, Deserialize)]
struct AcknowledgedResponse {
    #[serde(default)]
    acknowledged: bool,
}

#[derive(Debug, Deserialize)]
struct IndexDocumentResponse {
    #[serde(rename = "_id")]
    id: String,
    result: String,
}

#[derive(Debug, Deserialize)]
struct GetDocumentResponse {
    #[serde(default)]
    found: bool,
    #[serde(rename = "_source")]
    source: Option<Value>,
}

/// Store backed by a remote OpenSearch cluster
#[derive(Debug)]
pub struct OpenSearchStore {
    client: Client,
    base_url: Url,
    username: Option<String>,
    password: Option<String>,
}

impl OpenSearchStore {
    pub fn new(config: &StoreConfig) -> StoreResult<Self> {
        info!("Initializing OpenSearch store: url={}", config.url);
        let client = Client::builder().build()?;
        Self::with_client(config, client)
    }

    fn with_client(config: &StoreConfig, client: Client) -> StoreResult<Self> {
        let invalid = |reason: String| StoreError::InvalidUrl {
            url: config.url.clone(),
            reason,
        };
        let base_url = Url::parse(&config.url).map_err(|e| invalid(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(invalid("not a hierarchical URL".to_string()));
        }
        Ok(Self {
            client,
            base_url,
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    /// Append `segments` to the base URL, each percent-encoded as a single
    /// path segment
    fn url(&self, segments: &[&str]) -> StoreResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::InvalidUrl {
                url: self.base_url.to_string(),
                reason: "not a hierarchical URL".to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> StoreResult<RequestBuilder> {
        let url = self.url(segments)?;
        debug!("{} {}", method, url);
        let builder = self.client.request(method, url);
        Ok(match &self.username {
            Some(user) => builder.basic_auth(user, self.password.as_ref()),
            None => builder,
        })
    }

    /// Turn a non-success response into a store error, recognizing the
    /// exception types callers need to branch on
    async fn error_for(index: &str, id: Option<&str>, response: Response) -> StoreError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let error_type = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| v["error"]["type"].as_str().map(str::to_string))
            .unwrap_or_default();
        match error_type.as_str() {
            RESOURCE_ALREADY_EXISTS => StoreError::IndexAlreadyExists(index.to_string()),
            INDEX_NOT_FOUND => StoreError::IndexNotFound(index.to_string()),
            VERSION_CONFLICT => StoreError::DocumentExists {
                index: index.to_string(),
                id: id.unwrap_or_default().to_string(),
            },
            _ => StoreError::UnexpectedResponse {
                status: status.as_u16(),
                body,
            },
        }
    }

    async fn acknowledged(index: &str, response: Response) -> StoreResult<bool> {
        if !response.status().is_success() {
            return Err(Self::error_for(index, None, response).await);
        }
        let ack: AcknowledgedResponse = response.json().await?;
        Ok(ack.acknowledged)
    }
}

#[async_trait]
impl DocumentStore for OpenSearchStore {
    async fn index_exists(&self, index: &str) -> StoreResult<bool> {
        let response = self.request(Method::HEAD, &[index])?.send().await?;
        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(StoreError::UnexpectedResponse {
                status: status.as_u16(),
                body: String::new(),
            }),
        }
    }

    async fn create_index(&self, index: &str, mappings: &Value, settings: &Value) -> StoreResult<bool> {
        let body = json!({ "mappings": mappings, "settings": settings });
        let response = self.request(Method::PUT, &[index])?.json(&body).send().await?;
        Self::acknowledged(index, response).await
    }

    async fn put_mapping(&self, index: &str, mappings: &Value) -> StoreResult<bool> {
        let response = self
            .request(Method::PUT, &[index, "_mapping"])?
            .json(mappings)
            .send()
            .await?;
        Self::acknowledged(index, response).await
    }

    async fn create_document(
        &self,
        index: &str,
        id: Option<&str>,
        source: &Value,
    ) -> StoreResult<WriteResponse> {
        // _doc without an id is always a create
        let builder = match id {
            Some(id) => {
                validate_document_id(id)?;
                self.request(Method::PUT, &[index, "_create", id])?
            }
            None => self.request(Method::POST, &[index, "_doc"])?,
        };
        let response = builder.json(source).send().await?;
        if !response.status().is_success() {
            return Err(Self::error_for(index, id, response).await);
        }
        let indexed: IndexDocumentResponse = response.json().await?;
        Ok(WriteResponse {
            id: indexed.id,
            result: WriteResult::from_str_lossy(&indexed.result),
        })
    }

    async fn get_document(&self, index: &str, id: &str) -> StoreResult<Option<Value>> {
        // no stored document can carry an id that is not a single segment
        if validate_document_id(id).is_err() {
            return Ok(None);
        }
        let response = self
            .request(Method::GET, &[index, "_doc", id])?
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            let err = Self::error_for(index, Some(id), response).await;
            return match err {
                StoreError::IndexNotFound(_) => Err(err),
                _ => Ok(None),
            };
        }
        if !response.status().is_success() {
            return Err(Self::error_for(index, Some(id), response).await);
        }
        let doc: GetDocumentResponse = response.json().await?;
        Ok(doc.source.filter(|_| doc.found))
    }

    fn name(&self) -> &str {
        "opensearch"
    }
}
