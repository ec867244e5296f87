//! Snapshot types shared with consumers.

use serde::{Deserialize, Serialize};

use crate::balance::BalanceFormat;
use crate::extension::ExtensionHandle;
use crate::rpc::types::{ChainProperties, ChainType};

/// Opaque reference to a dispatchable call (`section.method`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxHandle {
    pub section: String,
    pub method: String,
}

impl std::fmt::Display for TxHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.section, self.method)
    }
}

/// Chain facts loaded once per ChainReady.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainSnapshot {
    pub system_chain: String,
    pub system_chain_type: ChainType,
    pub system_name: String,
    pub system_version: String,
    pub is_development: bool,
    pub is_substrate_v2: bool,
    pub token_symbol: Option<String>,
    pub token_decimals: u32,
    pub properties: ChainProperties,
    /// `None` only when the runtime exposes no calls at all.
    pub api_default_tx: Option<TxHandle>,
    pub api_default_tx_sudo: Option<TxHandle>,
}

impl ChainSnapshot {
    /// Balance display defaults for this chain.
    pub fn balance_format(&self) -> BalanceFormat {
        BalanceFormat::new(self.token_decimals, self.token_symbol.clone())
    }
}

/// Decorated account metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InjectedMeta {
    /// `"<name> (<source>)"`.
    pub name: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genesis_hash: Option<String>,
    /// Position in the extension's listing; not a timestamp.
    pub when_created: usize,
}

/// An extension account as published to consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InjectedAccount {
    pub address: String,
    pub meta: InjectedMeta,
}

/// Everything consumers can observe about the connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiState {
    pub is_api_initialized: bool,
    pub is_api_connected: bool,
    pub is_api_ready: bool,
    pub is_waiting_injected: bool,
    /// Empty when there is no error.
    pub error_message: String,
    #[serde(flatten)]
    pub chain: Option<ChainSnapshot>,
    pub injected_accounts: Vec<InjectedAccount>,
    pub extensions: Option<Vec<ExtensionHandle>>,
}

impl Default for ApiState {
    fn default() -> Self {
        Self {
            is_api_initialized: false,
            is_api_connected: false,
            is_api_ready: false,
            is_waiting_injected: true,
            error_message: String::new(),
            chain: None,
            injected_accounts: Vec::new(),
            extensions: None,
        }
    }
}
