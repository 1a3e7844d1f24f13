//! Document store configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which store implementation backs the collaborations index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// In-process store, nothing persists across restarts
    #[default]
    Memory,
    /// OpenSearch-compatible REST endpoint
    OpenSearch,
}

/// Document store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    /// Base URL of the store (opensearch backend)
    #[serde(default = "default_url")]
    pub url: String,
    /// Basic auth user (opensearch backend)
    #[serde(default)]
    pub username: Option<String>,
    /// Basic auth password (opensearch backend)
    #[serde(default)]
    pub password: Option<String>,
    /// Upper bound for every blocking store call
    #[serde(default = "default_operation_timeout_ms")]
    pub operation_timeout_ms: u64,
}

fn default_url() -> String {
    "http://localhost:9200".to_string()
}

fn default_operation_timeout_ms() -> u64 {
    60_000
}

impl StoreConfig {
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            url: default_url(),
            username: None,
            password: None,
            operation_timeout_ms: default_operation_timeout_ms(),
        }
    }
}
