//! Access gate
//!
//! Validates the caller identity and derives the tenant and access tags that
//! get stamped onto every document the caller creates.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Tenant used when the caller did not request one
pub const DEFAULT_TENANT: &str = "";

const USER_TAG: &str = "User:";
const ROLE_TAG: &str = "Role:";
const BACKEND_ROLE_TAG: &str = "BERole:";

/// Authenticated caller as resolved by the HTTP layer
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserIdentity {
    pub name: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub backend_roles: Vec<String>,
    #[serde(default)]
    pub requested_tenant: Option<String>,
}

impl UserIdentity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_roles(mut self, roles: Vec<String>) -> Self {
        self.roles = roles;
        self
    }

    pub fn with_backend_roles(mut self, backend_roles: Vec<String>) -> Self {
        self.backend_roles = backend_roles;
        self
    }

    pub fn with_tenant(mut self, tenant: impl Into<String>) -> Self {
        self.requested_tenant = Some(tenant.into());
        self
    }
}

/// Fail unless a well-formed identity is present
pub fn validate_user(user: Option<&UserIdentity>) -> Result<&UserIdentity> {
    match user {
        None => Err(Error::AuthenticationRequired(
            "no user identity on request".to_string(),
        )),
        Some(u) if u.name.trim().is_empty() => Err(Error::AuthenticationRequired(
            "user name not provided".to_string(),
        )),
        Some(u) => Ok(u),
    }
}

/// Tenant the caller's documents belong to
pub fn user_tenant(user: Option<&UserIdentity>) -> String {
    user.and_then(|u| u.requested_tenant.clone())
        .unwrap_or_else(|| DEFAULT_TENANT.to_string())
}

/// All principals permitted on documents the caller creates
pub fn all_access_info(user: Option<&UserIdentity>) -> Vec<String> {
    let Some(user) = user else {
        return Vec::new();
    };
    let mut access = Vec::with_capacity(1 + user.roles.len() + user.backend_roles.len());
    access.push(format!("{USER_TAG}{}", user.name));
    access.extend(user.roles.iter().map(|r| format!("{ROLE_TAG}{r}")));
    access.extend(user.backend_roles.iter().map(|r| format!("{BACKEND_ROLE_TAG}{r}")));
    access
}
