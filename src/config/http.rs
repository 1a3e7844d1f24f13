//! HTTP API configuration

use serde::{Deserialize, Serialize};

/// HTTP API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Listen address for HTTP server (e.g., "0.0.0.0:9400")
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Enable CORS (useful for browser-based dashboards)
    #[serde(default)]
    pub cors_enabled: bool,
}

fn default_listen_addr() -> String {
    "127.0.0.1:9400".to_string()
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            cors_enabled: false,
        }
    }
}
