//! Chain-facing types and error definitions.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Errors raised by the chain client.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RpcError {
    /// Endpoint URL is empty, unparsable or not a WebSocket URL.
    #[error("invalid endpoint '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Socket-level failure (connect, read or write).
    #[error("transport error: {0}")]
    Transport(String),

    /// The socket dropped while the call was in flight.
    #[error("connection closed before a response arrived")]
    Disconnected,

    /// The node answered with a JSON-RPC error object.
    #[error("{message} (code {code})")]
    Call { code: i64, message: String },

    /// The response could not be decoded into the expected type.
    #[error("decode error: {0}")]
    Decode(String),

    /// The runtime summary has not been loaded yet.
    #[error("connection is not ready")]
    NotReady,

    /// Runtime metadata could not be decoded.
    #[error("metadata error: {0}")]
    Metadata(String),

    /// `connect` was called more than once.
    #[error("connection already started")]
    AlreadyStarted,
}

/// Result type for chain client operations.
pub type RpcResult<T> = Result<T, RpcError>;

/// Notifications emitted by a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// The socket is open.
    Connected,
    /// The socket closed; the supervisor may reconnect later.
    Disconnected,
    /// Transport or handshake failure, with a human-readable message.
    Error(String),
    /// Handshake finished; calls and runtime summary are available.
    Ready,
}

impl ConnectionEvent {
    /// Short label used for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionEvent::Connected => "connected",
            ConnectionEvent::Disconnected => "disconnected",
            ConnectionEvent::Error(_) => "error",
            ConnectionEvent::Ready => "ready",
        }
    }
}

/// Lifecycle phase of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionPhase {
    Connecting,
    Connected,
    Disconnected,
    Errored,
}

/// Chain classification as reported by `system_chainType`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainType {
    Development,
    Local,
    Live,
    Custom(String),
}

impl ChainType {
    pub fn is_development(&self) -> bool {
        matches!(self, ChainType::Development)
    }

    pub fn is_local(&self) -> bool {
        matches!(self, ChainType::Local)
    }
}

impl std::fmt::Display for ChainType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChainType::Development => write!(f, "Development"),
            ChainType::Local => write!(f, "Local"),
            ChainType::Live => write!(f, "Live"),
            ChainType::Custom(name) => write!(f, "Custom({name})"),
        }
    }
}

/// Token and address properties from `system_properties`.
///
/// Multi-token chains report arrays; only the first (native) entry is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ss58_format: Option<u16>,

    #[serde(default, deserialize_with = "first_of")]
    pub token_decimals: Option<u32>,

    #[serde(default, deserialize_with = "first_of")]
    pub token_symbol: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

fn first_of<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let value = Option::<OneOrMany<T>>::deserialize(deserializer)?;
    Ok(match value {
        Some(OneOrMany::One(item)) => Some(item),
        Some(OneOrMany::Many(items)) => items.into_iter().next(),
        None => None,
    })
}

/// What the runtime exposes, reduced to names.
///
/// Both maps are keyed by pallet name; pallets without calls (or without
/// constants) are absent from the respective map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeSummary {
    /// Metadata format version (14, 15, ...).
    pub metadata_version: u8,
    /// Dispatchable call names per pallet, in declaration order.
    pub calls: BTreeMap<String, Vec<String>>,
    /// Constant names per pallet, in declaration order.
    pub constants: BTreeMap<String, Vec<String>>,
}
