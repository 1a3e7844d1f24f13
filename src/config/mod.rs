//! Configuration for collabd

mod auth;
mod http;
mod logging;
mod store;

pub use auth::{AuthConfig, UserConfig};
pub use http::HttpConfig;
pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use store::{StoreBackend, StoreConfig};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Main configuration for the collaboration service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP API server configuration
    #[serde(default)]
    pub http: HttpConfig,
    /// Document store configuration
    #[serde(default)]
    pub store: StoreConfig,
    /// API key to identity table
    #[serde(default)]
    pub auth: AuthConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file and validate it
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration fields.
    ///
    /// Collects all validation errors and reports them together.
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        if self.store.operation_timeout_ms == 0 {
            errors.push("operation_timeout_ms must be positive".to_string());
        }
        if self.store.backend == StoreBackend::OpenSearch && self.store.url.trim().is_empty() {
            errors.push("store url must be set for the opensearch backend".to_string());
        }
        if self.store.password.is_some() && self.store.username.is_none() {
            errors.push("store password given without username".to_string());
        }

        if self.http.listen_addr.parse::<std::net::SocketAddr>().is_err() {
            errors.push(format!(
                "HTTP listen address '{}' is not a valid socket address",
                self.http.listen_addr
            ));
        }

        let mut seen_keys = HashSet::new();
        for (i, user) in self.auth.users.iter().enumerate() {
            if user.api_key.trim().is_empty() {
                errors.push(format!("auth.users[{}]: api_key must not be empty", i));
            } else if !seen_keys.insert(user.api_key.as_str()) {
                errors.push(format!("auth.users[{}]: duplicate api_key", i));
            }
            if user.name.trim().is_empty() {
                errors.push(format!("auth.users[{}]: name must not be empty", i));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            anyhow::bail!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            );
        }
    }
}
