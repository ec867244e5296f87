//! The chain client seam.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::rpc::types::{
    ChainProperties, ChainType, ConnectionEvent, RpcResult, RuntimeSummary,
};

/// Read-only view of a chain node, plus its connection events.
///
/// `subscribe` must be called before `connect` to observe every event.
#[async_trait]
pub trait ChainApi: Send + Sync {
    /// Endpoint this client talks to.
    fn endpoint(&self) -> &str;

    /// Receive connection events from now on.
    fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent>;

    /// Open the connection in the background. Returns immediately.
    fn connect(&self) -> RpcResult<()>;

    async fn system_properties(&self) -> RpcResult<ChainProperties>;

    async fn system_chain(&self) -> RpcResult<String>;

    /// `Ok(None)` when the node does not expose `system_chainType`.
    async fn system_chain_type(&self) -> RpcResult<Option<ChainType>>;

    async fn system_name(&self) -> RpcResult<String>;

    async fn system_version(&self) -> RpcResult<String>;

    /// Calls and constants of the runtime loaded during the readiness handshake.
    async fn runtime(&self) -> RpcResult<Arc<RuntimeSummary>>;
}
