//! Collaboration actions
//!
//! Transport-independent request handling: the HTTP handlers call into
//! [`CollaborationActions`] after decoding the body and resolving the caller.

use std::sync::Arc;

use tracing::info;

use crate::access::{self, UserIdentity};
use crate::error::{Error, Result};
use crate::model::CollaborationObjectDoc;
use crate::util::now_millis;

use super::index_manager::IndexManager;
use super::protocol::{CreateCollaborationRequest, CreateCollaborationResponse};

const CREATE_FAILED: &str = "CollaborationObject Creation failed";

/// Executes collaboration requests against the index manager
#[derive(Clone)]
pub struct CollaborationActions {
    index_manager: Arc<IndexManager>,
}

impl CollaborationActions {
    pub fn new(index_manager: Arc<IndexManager>) -> Self {
        Self { index_manager }
    }

    pub fn index_manager(&self) -> &Arc<IndexManager> {
        &self.index_manager
    }

    /// Create a collaboration object owned by `user`
    pub async fn create(
        &self,
        request: CreateCollaborationRequest,
        user: Option<&UserIdentity>,
    ) -> Result<CreateCollaborationResponse> {
        let user = access::validate_user(user)?;
        info!("create collaboration object for user {}", user.name);

        let now = now_millis();
        let explicit_id = request.collaboration_id;
        let doc = CollaborationObjectDoc {
            collaboration_id: explicit_id.clone().unwrap_or_default(),
            updated_time: now,
            created_time: now,
            tenant: access::user_tenant(Some(user)),
            access: access::all_access_info(Some(user)),
            object_data: request.object_data,
        };

        let id = self
            .index_manager
            .create_document(&doc, explicit_id.as_deref())
            .await?
            .ok_or_else(|| Error::StoreWriteFailed(CREATE_FAILED.to_string()))?;

        Ok(CreateCollaborationResponse::new(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::DEFAULT_TENANT;
    use crate::model::{Collaboration, ObjectData};
    use crate::store::{MemoryStore, StoreError};
    use std::time::Duration;

    fn actions() -> CollaborationActions {
        let store = Arc::new(MemoryStore::new());
        let manager = IndexManager::new(store, Duration::from_secs(5)).unwrap();
        CollaborationActions::new(Arc::new(manager))
    }

    fn request(id: Option<&str>) -> CreateCollaborationRequest {
        CreateCollaborationRequest::new(
            id.map(str::to_string),
            Collaboration::text("p1", "par1", "l1").with_tags("prod"),
        )
    }

    #[tokio::test]
    async fn test_create_stamps_envelope() {
        let actions = actions();
        let user = UserIdentity::new("alice").with_roles(vec!["analyst".into()]);

        let response = actions.create(request(None), Some(&user)).await.unwrap();
        assert!(!response.collaboration_object_id.is_empty());

        let doc = actions
            .index_manager()
            .get_document(&response.collaboration_object_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc.collaboration_id, response.collaboration_object_id);
        assert_eq!(doc.tenant, DEFAULT_TENANT);
        assert_eq!(doc.access, vec!["User:alice", "Role:analyst"]);
        assert_eq!(doc.created_time, doc.updated_time);
        let ObjectData::Collaboration(c) = doc.object_data;
        assert!(!c.resolved);
        assert_eq!(c.page_id.as_deref(), Some("p1"));
    }

    #[tokio::test]
    async fn test_requested_tenant_is_used() {
        let actions = actions();
        let user = UserIdentity::new("bob").with_tenant("team-a");
        let response = actions.create(request(None), Some(&user)).await.unwrap();
        let doc = actions
            .index_manager()
            .get_document(&response.collaboration_object_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc.tenant, "team-a");
    }

    #[tokio::test]
    async fn test_missing_user_rejected_before_write() {
        let actions = actions();
        let err = actions.create(request(None), None).await.unwrap_err();
        assert!(matches!(err, Error::AuthenticationRequired(_)));
        // the gate runs before any provisioning
        assert!(!actions.index_manager().mappings_updated());
    }

    #[tokio::test]
    async fn test_explicit_id_is_create_only() {
        let actions = actions();
        let user = UserIdentity::new("carol");

        let response = actions.create(request(Some("fixed")), Some(&user)).await.unwrap();
        assert_eq!(response.collaboration_object_id, "fixed");

        let err = actions.create(request(Some("fixed")), Some(&user)).await.unwrap_err();
        assert!(matches!(err, Error::Store(StoreError::DocumentExists { .. })));
    }
}
