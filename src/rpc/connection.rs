//! WebSocket JSON-RPC connection.
//!
//! # Responsibilities
//! - Validate the endpoint and open a `jsonrpsee` client in a supervised task
//! - Run the readiness handshake (`rpc_methods`, `state_getMetadata`)
//! - Broadcast connection events; reconnect with backoff after a drop
//!
//! # State Transitions
//! ```text
//! Connecting → Connected → (handshake ok) Ready event
//!            ↘ Errored (connect failure, handshake failure)
//! Connected  → Disconnected → (backoff) → Connecting
//! ```

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use async_trait::async_trait;
use jsonrpsee::core::client::{ClientT, Error as ClientError};
use jsonrpsee::core::params::ArrayParams;
use jsonrpsee::rpc_params;
use jsonrpsee::ws_client::{WsClient, WsClientBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::broadcast;
use url::Url;

use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::rpc::api::ChainApi;
use crate::rpc::reconnect::ReconnectPolicy;
use crate::rpc::types::{
    ChainProperties, ChainType, ConnectionEvent, ConnectionPhase, RpcError, RpcResult,
    RuntimeSummary,
};

const CHAIN_TYPE_METHOD: &str = "system_chainType";
const EVENT_CAPACITY: usize = 64;
/// Runtime metadata of large chains runs to several megabytes of hex.
const MAX_RESPONSE_SIZE: u32 = 64 * 1024 * 1024;

/// Body of `rpc_methods`.
#[derive(Debug, Default, Deserialize)]
struct RpcMethods {
    #[serde(default)]
    methods: Vec<String>,
}

/// What the node told us during the last handshake.
#[derive(Debug)]
struct LinkState {
    phase: ConnectionPhase,
    last_error: Option<String>,
    methods: HashSet<String>,
    runtime: Option<Arc<RuntimeSummary>>,
}

struct Shared {
    endpoint: Url,
    client: RwLock<Option<Arc<WsClient>>>,
    events: broadcast::Sender<ConnectionEvent>,
    link: RwLock<LinkState>,
}

/// A supervised WebSocket link to one chain node.
#[derive(Clone)]
pub struct WsConnection {
    shared: Arc<Shared>,
    policy: ReconnectPolicy,
    shutdown: Arc<Mutex<Option<broadcast::Receiver<()>>>>,
}

impl WsConnection {
    /// Validate `endpoint` and prepare a connection. Nothing is opened until
    /// [`ChainApi::connect`] is called.
    pub fn new(endpoint: &str, policy: ReconnectPolicy, shutdown: &Shutdown) -> RpcResult<Self> {
        let endpoint = parse_endpoint(endpoint)?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        let shared = Shared {
            endpoint,
            client: RwLock::new(None),
            events,
            link: RwLock::new(LinkState {
                phase: ConnectionPhase::Connecting,
                last_error: None,
                methods: HashSet::new(),
                runtime: None,
            }),
        };

        Ok(Self {
            shared: Arc::new(shared),
            policy,
            shutdown: Arc::new(Mutex::new(Some(shutdown.subscribe()))),
        })
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> ConnectionPhase {
        self.shared.read_link(|link| link.phase)
    }

    /// Message of the most recent transport or handshake failure.
    pub fn last_error(&self) -> Option<String> {
        self.shared.read_link(|link| link.last_error.clone())
    }

    /// Whether the node advertised `method` in `rpc_methods`.
    pub fn has_method(&self, method: &str) -> bool {
        self.shared.read_link(|link| link.methods.contains(method))
    }

    /// Issue a raw JSON-RPC call on the current socket.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: ArrayParams,
    ) -> RpcResult<T> {
        self.shared.request(method, params).await
    }
}

impl std::fmt::Debug for WsConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsConnection")
            .field("endpoint", &self.shared.endpoint.as_str())
            .field("phase", &self.phase())
            .field("policy", &self.policy)
            .finish()
    }
}

#[async_trait]
impl ChainApi for WsConnection {
    fn endpoint(&self) -> &str {
        self.shared.endpoint.as_str()
    }

    fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.shared.events.subscribe()
    }

    fn connect(&self) -> RpcResult<()> {
        let shutdown = self
            .shutdown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(RpcError::AlreadyStarted)?;

        tracing::info!(endpoint = %self.shared.endpoint, "Opening chain connection");
        tokio::spawn(supervise(self.shared.clone(), self.policy, shutdown));
        Ok(())
    }

    async fn system_properties(&self) -> RpcResult<ChainProperties> {
        self.request("system_properties", rpc_params![]).await
    }

    async fn system_chain(&self) -> RpcResult<String> {
        self.request("system_chain", rpc_params![]).await
    }

    async fn system_chain_type(&self) -> RpcResult<Option<ChainType>> {
        if !self.has_method(CHAIN_TYPE_METHOD) {
            return Ok(None);
        }
        self.request(CHAIN_TYPE_METHOD, rpc_params![]).await.map(Some)
    }

    async fn system_name(&self) -> RpcResult<String> {
        self.request("system_name", rpc_params![]).await
    }

    async fn system_version(&self) -> RpcResult<String> {
        self.request("system_version", rpc_params![]).await
    }

    async fn runtime(&self) -> RpcResult<Arc<RuntimeSummary>> {
        self.shared
            .read_link(|link| link.runtime.clone())
            .ok_or(RpcError::NotReady)
    }
}

fn parse_endpoint(endpoint: &str) -> RpcResult<Url> {
    let invalid = |reason: &str| RpcError::InvalidUrl {
        url: endpoint.to_owned(),
        reason: reason.to_owned(),
    };

    if endpoint.trim().is_empty() {
        return Err(invalid("endpoint is empty"));
    }
    let url = Url::parse(endpoint).map_err(|e| invalid(&e.to_string()))?;
    match url.scheme() {
        "ws" | "wss" => Ok(url),
        other => Err(invalid(&format!("unsupported scheme '{other}'"))),
    }
}

/// Map a client failure for `method` onto the crate's error type.
fn call_error(method: &str, err: ClientError) -> RpcError {
    match err {
        ClientError::Call(object) => RpcError::Call {
            code: i64::from(object.code()),
            message: object.message().to_owned(),
        },
        ClientError::ParseError(e) => RpcError::Decode(format!("{method}: {e}")),
        ClientError::RestartNeeded(_) => RpcError::Disconnected,
        ClientError::RequestTimeout => RpcError::Transport(format!("{method}: request timed out")),
        other => RpcError::Transport(other.to_string()),
    }
}

impl Shared {
    fn read_link<R>(&self, f: impl FnOnce(&LinkState) -> R) -> R {
        f(&self.link.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn write_link(&self, f: impl FnOnce(&mut LinkState)) {
        f(&mut self.link.write().unwrap_or_else(PoisonError::into_inner))
    }

    fn set_client(&self, client: Option<Arc<WsClient>>) {
        *self.client.write().unwrap_or_else(PoisonError::into_inner) = client;
    }

    fn emit(&self, event: ConnectionEvent) {
        metrics::record_connection_event(event.label());
        tracing::debug!(event = event.label(), "Connection event");
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn fail(&self, message: String) {
        self.write_link(|link| {
            link.phase = ConnectionPhase::Errored;
            link.last_error = Some(message.clone());
        });
        self.emit(ConnectionEvent::Error(message));
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: ArrayParams,
    ) -> RpcResult<T> {
        let client = self
            .client
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(RpcError::Disconnected)?;

        tracing::trace!(method, "RPC request");
        client
            .request(method, params)
            .await
            .map_err(|e| call_error(method, e))
    }

    async fn handshake(&self) -> RpcResult<()> {
        let methods: RpcMethods = self.request("rpc_methods", rpc_params![]).await?;
        let encoded: String = self.request("state_getMetadata", rpc_params![]).await?;
        let runtime = RuntimeSummary::from_hex(&encoded)?;

        self.write_link(|link| {
            link.methods = methods.methods.into_iter().collect();
            link.runtime = Some(Arc::new(runtime));
        });
        Ok(())
    }
}

async fn supervise(
    shared: Arc<Shared>,
    policy: ReconnectPolicy,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut attempt: u32 = 0;

    loop {
        let delay = policy.delay(attempt);
        if !delay.is_zero() {
            tracing::info!(attempt, ?delay, "Reconnecting");
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown.recv() => break,
            }
        }

        shared.write_link(|link| link.phase = ConnectionPhase::Connecting);
        let outcome = tokio::select! {
            outcome = run_session(&shared) => outcome,
            _ = shutdown.recv() => break,
        };

        attempt = match outcome {
            // The socket was up; start the backoff over.
            Ok(()) => 1,
            Err(err) => {
                tracing::error!(endpoint = %shared.endpoint, error = %err, "Chain connection failed");
                shared.fail(err.to_string());
                attempt.saturating_add(1)
            }
        };
    }

    // Dropping the last handle closes the socket.
    shared.set_client(None);
    tracing::info!(endpoint = %shared.endpoint, "Chain connection supervisor stopped");
}

/// One socket lifetime. `Err` only when the socket could not be opened.
async fn run_session(shared: &Arc<Shared>) -> RpcResult<()> {
    let client = WsClientBuilder::default()
        .max_response_size(MAX_RESPONSE_SIZE)
        .build(shared.endpoint.as_str())
        .await
        .map_err(|e| RpcError::Transport(e.to_string()))?;
    let client = Arc::new(client);

    shared.set_client(Some(client.clone()));
    shared.write_link(|link| {
        link.phase = ConnectionPhase::Connected;
        link.last_error = None;
    });
    shared.emit(ConnectionEvent::Connected);

    let handshake = {
        let shared = shared.clone();
        tokio::spawn(async move {
            match shared.handshake().await {
                Ok(()) => shared.emit(ConnectionEvent::Ready),
                Err(RpcError::Disconnected) => {}
                Err(err) => {
                    tracing::error!(error = %err, "Readiness handshake failed");
                    shared.fail(err.to_string());
                }
            }
        })
    };

    client.on_disconnect().await;
    handshake.abort();
    shared.set_client(None);
    let reason = client.disconnect_reason().await;
    tracing::warn!(reason = %reason, "Socket closed");

    shared.write_link(|link| link.phase = ConnectionPhase::Disconnected);
    shared.emit(ConnectionEvent::Disconnected);
    Ok(())
}
