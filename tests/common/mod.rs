//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use frame_metadata::META_RESERVED;
use futures_util::{SinkExt, StreamExt};
use parity_scale_codec::{Compact, Encode};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, watch, Notify};
use tokio_tungstenite::tungstenite::Message;

use chain_connect::extension::{Account, AccountMeta, ExtensionBridge, ExtensionError, ExtensionHandle};
use chain_connect::rpc::{
    ChainApi, ChainProperties, ChainType, ConnectionEvent, RpcError, RpcResult, RuntimeSummary,
};
use chain_connect::state::ApiState;

/// How long any test waits for a state change.
pub const WAIT: Duration = Duration::from_secs(5);

/// Wait until `pred` holds for the published state.
pub async fn wait_for_state(
    rx: &mut watch::Receiver<ApiState>,
    pred: impl FnMut(&ApiState) -> bool,
) -> ApiState {
    tokio::time::timeout(WAIT, rx.wait_for(pred))
        .await
        .expect("timed out waiting for state")
        .expect("publisher dropped")
        .clone()
}

// ---------------------------------------------------------------------------
// Runtime metadata
// ---------------------------------------------------------------------------

/// One pallet of a fake runtime: name, call names, constant names.
pub type PalletSpec = (&'static str, Vec<&'static str>, Vec<&'static str>);

/// Hand-encoded v14 metadata, hex with `0x` prefix.
pub fn metadata_hex(pallets: &[PalletSpec]) -> String {
    let mut out = Vec::new();
    META_RESERVED.encode_to(&mut out);
    14u8.encode_to(&mut out);

    // One variant type per pallet that has calls, ids in pallet order.
    let with_calls: Vec<&PalletSpec> = pallets.iter().filter(|p| !p.1.is_empty()).collect();
    Compact(with_calls.len() as u32).encode_to(&mut out);
    for (id, (_, calls, _)) in with_calls.iter().enumerate() {
        Compact(id as u32).encode_to(&mut out);
        Compact(0u32).encode_to(&mut out); // path
        Compact(0u32).encode_to(&mut out); // type params
        1u8.encode_to(&mut out); // TypeDef::Variant
        Compact(calls.len() as u32).encode_to(&mut out);
        for (index, name) in calls.iter().enumerate() {
            name.to_string().encode_to(&mut out);
            Compact(0u32).encode_to(&mut out); // fields
            (index as u8).encode_to(&mut out);
            Compact(0u32).encode_to(&mut out); // docs
        }
        Compact(0u32).encode_to(&mut out); // type docs
    }

    Compact(pallets.len() as u32).encode_to(&mut out);
    let mut next_type = 0u32;
    for (index, (name, calls, constants)) in pallets.iter().enumerate() {
        name.to_string().encode_to(&mut out);
        0u8.encode_to(&mut out); // storage: None
        if calls.is_empty() {
            0u8.encode_to(&mut out);
        } else {
            1u8.encode_to(&mut out);
            Compact(next_type).encode_to(&mut out);
            next_type += 1;
        }
        0u8.encode_to(&mut out); // event: None
        Compact(constants.len() as u32).encode_to(&mut out);
        for constant in constants {
            constant.to_string().encode_to(&mut out);
            Compact(0u32).encode_to(&mut out);
            vec![0u8; 4].encode_to(&mut out);
            Compact(0u32).encode_to(&mut out); // docs
        }
        0u8.encode_to(&mut out); // error: None
        (index as u8).encode_to(&mut out);
    }

    // extrinsic: type, version, signed extensions
    Compact(0u32).encode_to(&mut out);
    4u8.encode_to(&mut out);
    Compact(0u32).encode_to(&mut out);

    // runtime type
    Compact(0u32).encode_to(&mut out);

    format!("0x{}", hex::encode(out))
}

/// Balances + System runtime with constants.
pub fn standard_pallets() -> Vec<PalletSpec> {
    vec![
        ("System", vec!["remark", "set_code"], vec!["BlockHashCount"]),
        ("Balances", vec!["transfer_keep_alive", "transfer"], vec!["ExistentialDeposit"]),
        ("Timestamp", vec!["set"], vec![]),
    ]
}

// ---------------------------------------------------------------------------
// Mock WebSocket node
// ---------------------------------------------------------------------------

/// Canned answers for the mock node.
#[derive(Debug, Clone)]
pub struct NodeScript {
    pub chain: String,
    pub chain_type: Option<Value>,
    pub properties: Value,
    pub name: String,
    pub version: String,
    pub metadata: String,
    /// Methods answered with a JSON-RPC error `(-32000, "<method> failed")`.
    pub failing: Vec<String>,
}

impl Default for NodeScript {
    fn default() -> Self {
        Self {
            chain: "Development".into(),
            chain_type: Some(json!("Development")),
            properties: json!({"ss58Format": 42, "tokenDecimals": 12, "tokenSymbol": "UNIT"}),
            name: "substrate-node".into(),
            version: "4.0.0-dev".into(),
            metadata: metadata_hex(&standard_pallets()),
            failing: Vec::new(),
        }
    }
}

impl NodeScript {
    fn methods(&self) -> Vec<&'static str> {
        let mut methods = vec![
            "rpc_methods",
            "state_getMetadata",
            "system_chain",
            "system_name",
            "system_properties",
            "system_version",
        ];
        if self.chain_type.is_some() {
            methods.push("system_chainType");
        }
        methods
    }

    fn respond(&self, text: &str) -> Option<String> {
        let request: Value = serde_json::from_str(text).ok()?;
        let id = request.get("id").cloned().unwrap_or(Value::Null);
        let method = request.get("method")?.as_str()?.to_owned();

        if self.failing.contains(&method) {
            return Some(
                json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "error": {"code": -32000, "message": format!("{method} failed")}
                })
                .to_string(),
            );
        }

        let result = match method.as_str() {
            "rpc_methods" => json!({"version": 1, "methods": self.methods()}),
            "state_getMetadata" => json!(self.metadata),
            "system_chain" => json!(self.chain),
            "system_chainType" => match &self.chain_type {
                Some(chain_type) => chain_type.clone(),
                None => return Some(method_not_found(id)),
            },
            "system_name" => json!(self.name),
            "system_version" => json!(self.version),
            "system_properties" => self.properties.clone(),
            _ => return Some(method_not_found(id)),
        };
        Some(json!({"jsonrpc": "2.0", "id": id, "result": result}).to_string())
    }
}

fn method_not_found(id: Value) -> String {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {"code": -32601, "message": "Method not found"}
    })
    .to_string()
}

/// Handle to a running mock node.
pub struct MockNode {
    pub url: String,
    kick: broadcast::Sender<()>,
    connections: Arc<AtomicUsize>,
}

impl MockNode {
    /// Close every open socket. New connections are still accepted.
    pub fn disconnect_all(&self) {
        let _ = self.kick.send(());
    }

    /// Sockets accepted so far.
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

/// Start a JSON-RPC WebSocket node on an ephemeral port.
pub async fn start_mock_node(script: NodeScript) -> MockNode {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (kick, _) = broadcast::channel(4);
    let connections = Arc::new(AtomicUsize::new(0));

    let script = Arc::new(script);
    let kick_tx = kick.clone();
    let accepted = connections.clone();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            accepted.fetch_add(1, Ordering::SeqCst);
            let script = script.clone();
            let mut kicked = kick_tx.subscribe();
            tokio::spawn(async move {
                let Ok(ws) = tokio_tungstenite::accept_async(stream).await else {
                    return;
                };
                let (mut sink, mut source) = ws.split();
                loop {
                    tokio::select! {
                        _ = kicked.recv() => {
                            let _ = sink.close().await;
                            break;
                        }
                        frame = source.next() => match frame {
                            Some(Ok(Message::Text(text))) => {
                                if let Some(reply) = script.respond(text.as_str()) {
                                    if sink.send(Message::Text(reply.into())).await.is_err() {
                                        break;
                                    }
                                }
                            }
                            Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                            Some(Ok(_)) => {}
                        },
                    }
                }
            });
        }
    });

    MockNode {
        url: format!("ws://{}", addr),
        kick,
        connections,
    }
}

// ---------------------------------------------------------------------------
// Scripted ChainApi
// ---------------------------------------------------------------------------

/// Pauses one scripted call until the test releases it.
#[derive(Default)]
pub struct Gate {
    entered: Notify,
    release: Notify,
}

impl Gate {
    /// Resolves once the held call has started.
    pub async fn entered(&self) {
        tokio::time::timeout(WAIT, self.entered.notified())
            .await
            .expect("held call never started");
    }

    pub fn release(&self) {
        self.release.notify_one();
    }
}

/// In-process `ChainApi` whose events are emitted by the test.
pub struct MockChain {
    events: broadcast::Sender<ConnectionEvent>,
    pub properties: ChainProperties,
    chain: Mutex<String>,
    pub chain_type: Option<ChainType>,
    pub runtime: RuntimeSummary,
    failing: Mutex<BTreeMap<&'static str, RpcError>>,
    held: Mutex<Option<(&'static str, Arc<Gate>)>>,
    connects: AtomicUsize,
}

impl MockChain {
    pub fn new(chain: &str) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            events,
            properties: ChainProperties::default(),
            chain: Mutex::new(chain.to_owned()),
            chain_type: None,
            runtime: RuntimeSummary::default(),
            failing: Mutex::new(BTreeMap::new()),
            held: Mutex::new(None),
            connects: AtomicUsize::new(0),
        }
    }

    pub fn with_properties(mut self, properties: Value) -> Self {
        self.properties = serde_json::from_value(properties).unwrap();
        self
    }

    pub fn with_chain_type(mut self, chain_type: ChainType) -> Self {
        self.chain_type = Some(chain_type);
        self
    }

    pub fn with_runtime(mut self, pallets: &[PalletSpec]) -> Self {
        self.runtime = RuntimeSummary::from_hex(&metadata_hex(pallets)).unwrap();
        self
    }

    /// Make `method` reject with `error` until cleared.
    pub fn fail(&self, method: &'static str, error: RpcError) {
        self.failing.lock().unwrap().insert(method, error);
    }

    /// Answer `system_chain` with `name` from now on.
    pub fn set_chain(&self, name: &str) {
        *self.chain.lock().unwrap() = name.to_owned();
    }

    /// Hold the next call of `method` until the returned gate is released.
    pub fn hold_next(&self, method: &'static str) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        *self.held.lock().unwrap() = Some((method, gate.clone()));
        gate
    }

    pub fn clear_failures(&self) {
        self.failing.lock().unwrap().clear();
    }

    pub fn emit(&self, event: ConnectionEvent) {
        self.events.send(event).unwrap();
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    async fn check(&self, method: &'static str) -> RpcResult<()> {
        let gate = {
            let mut held = self.held.lock().unwrap();
            let matches = held.as_ref().is_some_and(|(name, _)| *name == method);
            let gate = if matches { held.take().map(|(_, gate)| gate) } else { None };
            gate
        };
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        match self.failing.lock().unwrap().get(method) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ChainApi for MockChain {
    fn endpoint(&self) -> &str {
        "wss://node.example"
    }

    fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.events.subscribe()
    }

    fn connect(&self) -> RpcResult<()> {
        if self.connects.fetch_add(1, Ordering::SeqCst) > 0 {
            return Err(RpcError::AlreadyStarted);
        }
        Ok(())
    }

    async fn system_properties(&self) -> RpcResult<ChainProperties> {
        self.check("system_properties").await?;
        Ok(self.properties.clone())
    }

    async fn system_chain(&self) -> RpcResult<String> {
        self.check("system_chain").await?;
        Ok(self.chain.lock().unwrap().clone())
    }

    async fn system_chain_type(&self) -> RpcResult<Option<ChainType>> {
        self.check("system_chainType").await?;
        Ok(self.chain_type.clone())
    }

    async fn system_name(&self) -> RpcResult<String> {
        self.check("system_name").await?;
        Ok("substrate-node".into())
    }

    async fn system_version(&self) -> RpcResult<String> {
        self.check("system_version").await?;
        Ok("4.0.0-dev".into())
    }

    async fn runtime(&self) -> RpcResult<Arc<RuntimeSummary>> {
        self.check("runtime").await?;
        Ok(Arc::new(self.runtime.clone()))
    }
}

// ---------------------------------------------------------------------------
// Scripted extension
// ---------------------------------------------------------------------------

pub struct MockExtension {
    pub authorization: Result<Vec<ExtensionHandle>, ExtensionError>,
    pub accounts: Result<Vec<Account>, ExtensionError>,
}

impl MockExtension {
    pub fn with_accounts(accounts: Vec<Account>) -> Self {
        Self {
            authorization: Ok(vec![ExtensionHandle {
                name: "polkadot-js".into(),
                version: "0.44.1".into(),
            }]),
            accounts: Ok(accounts),
        }
    }

    pub fn denied() -> Self {
        Self {
            authorization: Err(ExtensionError::Denied("chain-connect".into())),
            accounts: Ok(vec![account("5Grw", Some("Alice"), "polkadot-js")]),
        }
    }
}

#[async_trait]
impl ExtensionBridge for MockExtension {
    async fn request_authorization(
        &self,
        _app_name: &str,
    ) -> Result<Vec<ExtensionHandle>, ExtensionError> {
        self.authorization.clone()
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, ExtensionError> {
        self.accounts.clone()
    }
}

pub fn account(address: &str, name: Option<&str>, source: &str) -> Account {
    Account {
        address: address.into(),
        meta: AccountMeta {
            name: name.map(str::to_owned),
            source: source.into(),
            genesis_hash: None,
        },
    }
}
