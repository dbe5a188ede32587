//! Engine connection configuration.

use serde::Deserialize;
use std::time::Duration;

/// Where and how to reach the engine's REST API.
#[derive(Clone, Deserialize)]
pub struct EngineConfig {
    /// Base URL of the API, e.g. `http://localhost:5678/api/v1`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key, sent on every request when set.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Header carrying the API key.
    #[serde(default = "default_api_key_header")]
    pub api_key_header: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,

    /// Whether execution fetches ask for full run data.
    #[serde(default)]
    pub include_data: bool,
}

fn default_base_url() -> String {
    "http://localhost:5678/api/v1".to_string()
}

fn default_api_key_header() -> String {
    "X-N8N-API-KEY".to_string()
}

fn default_request_timeout_seconds() -> u64 {
    30
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            api_key_header: default_api_key_header(),
            request_timeout_seconds: default_request_timeout_seconds(),
            include_data: false,
        }
    }
}

impl EngineConfig {
    /// Returns the per-request timeout.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl std::fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_key_header", &self.api_key_header)
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .field("include_data", &self.include_data)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config: EngineConfig = serde_json::from_str("{}").expect("deserialize");
        assert_eq!(config.base_url, "http://localhost:5678/api/v1");
        assert_eq!(config.api_key_header, "X-N8N-API-KEY");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert!(config.api_key.is_none());
        assert!(!config.include_data);
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = EngineConfig {
            api_key: Some("secret-key".to_string()),
            ..EngineConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret-key"));
        assert!(debug.contains("[REDACTED]"));
    }
}
