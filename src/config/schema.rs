//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::registry::TypeDefinitions;

/// Root configuration for the bridge.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Name presented to the account extension when requesting access.
    pub app_name: String,

    /// Chain node endpoint and reconnection policy.
    pub endpoint: EndpointConfig,

    /// Custom type definitions.
    pub types: TypesConfig,

    /// Account extension settings.
    pub extension: ExtensionConfig,

    /// HTTP status surface.
    pub status: StatusConfig,

    pub observability: ObservabilityConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            app_name: "chain-connect".to_string(),
            endpoint: EndpointConfig::default(),
            types: TypesConfig::default(),
            extension: ExtensionConfig::default(),
            status: StatusConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// WebSocket URL (ws:// or wss://).
    pub url: String,

    /// First reconnect delay in milliseconds.
    pub reconnect_base_ms: u64,

    /// Upper bound on the reconnect delay in milliseconds.
    pub reconnect_max_ms: u64,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:9944".to_string(),
            reconnect_base_ms: 1000,
            reconnect_max_ms: 30_000,
        }
    }
}

/// Custom types: an optional JSON file plus inline definitions.
///
/// Inline definitions win over file definitions of the same name.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TypesConfig {
    pub path: Option<PathBuf>,
    pub definitions: TypeDefinitions,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExtensionConfig {
    pub enabled: bool,

    /// JSON keyfile backing the extension.
    pub accounts_path: PathBuf,
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            accounts_path: PathBuf::from("accounts.json"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StatusConfig {
    pub enabled: bool,
    pub bind_address: String,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: "127.0.0.1:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// tracing-subscriber filter; `RUST_LOG` takes precedence.
    pub log_filter: Option<String>,

    pub metrics_enabled: bool,

    /// Prometheus scrape address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: None,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
