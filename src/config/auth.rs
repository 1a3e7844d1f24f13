//! API key authentication configuration

use serde::{Deserialize, Serialize};

use crate::access::UserIdentity;

/// One API key and the identity it authenticates as
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    pub api_key: String,
    pub name: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub backend_roles: Vec<String>,
}

impl UserConfig {
    pub fn identity(&self) -> UserIdentity {
        UserIdentity::new(self.name.clone())
            .with_roles(self.roles.clone())
            .with_backend_roles(self.backend_roles.clone())
    }
}

/// Authentication configuration (no users = every request is anonymous)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub users: Vec<UserConfig>,
}
