//! WebSocket connection and full bootstrap against a mock JSON-RPC node.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;

use chain_connect::extension::NoExtension;
use chain_connect::registry::TypeRegistry;
use chain_connect::rpc::{
    ChainApi, ChainType, ConnectionEvent, ConnectionPhase, ReconnectPolicy, RpcError, WsConnection,
};
use chain_connect::{ApiContext, Bootstrap, Shutdown};

mod common;

use common::{start_mock_node, wait_for_state, NodeScript, WAIT};

fn fast_policy() -> ReconnectPolicy {
    ReconnectPolicy::new(20, 100)
}

async fn next_event(
    events: &mut tokio::sync::broadcast::Receiver<ConnectionEvent>,
) -> ConnectionEvent {
    tokio::time::timeout(WAIT, events.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

#[tokio::test]
async fn test_handshake_then_calls() {
    let node = start_mock_node(NodeScript::default()).await;
    let shutdown = Shutdown::new();
    let conn = WsConnection::new(&node.url, fast_policy(), &shutdown).unwrap();

    let mut events = conn.subscribe();
    conn.connect().unwrap();
    assert_eq!(next_event(&mut events).await, ConnectionEvent::Connected);
    assert_eq!(next_event(&mut events).await, ConnectionEvent::Ready);
    assert_eq!(conn.phase(), ConnectionPhase::Connected);
    assert!(conn.has_method("system_chainType"));

    assert_eq!(conn.system_chain().await.unwrap(), "Development");
    assert_eq!(
        conn.system_chain_type().await.unwrap(),
        Some(ChainType::Development)
    );
    let properties = conn.system_properties().await.unwrap();
    assert_eq!(properties.token_decimals, Some(12));
    assert_eq!(properties.ss58_format, Some(42));

    let runtime = conn.runtime().await.unwrap();
    assert_eq!(runtime.metadata_version, 14);
    assert_eq!(runtime.calls["System"], vec!["remark", "set_code"]);
    assert!(runtime.constants.contains_key("Balances"));
    assert!(!runtime.constants.contains_key("Timestamp"));

    shutdown.trigger();
}

#[tokio::test]
async fn test_rpc_error_is_surfaced() {
    let node = start_mock_node(NodeScript {
        failing: vec!["system_name".into()],
        ..NodeScript::default()
    })
    .await;
    let shutdown = Shutdown::new();
    let conn = WsConnection::new(&node.url, fast_policy(), &shutdown).unwrap();

    let mut events = conn.subscribe();
    conn.connect().unwrap();
    next_event(&mut events).await;
    next_event(&mut events).await;

    let err = conn.system_name().await.unwrap_err();
    assert_eq!(
        err,
        RpcError::Call {
            code: -32000,
            message: "system_name failed".into()
        }
    );
    shutdown.trigger();
}

#[tokio::test]
async fn test_bad_metadata_fails_handshake() {
    let node = start_mock_node(NodeScript {
        metadata: "0x00".into(),
        ..NodeScript::default()
    })
    .await;
    let shutdown = Shutdown::new();
    let conn = WsConnection::new(&node.url, fast_policy(), &shutdown).unwrap();

    let mut events = conn.subscribe();
    conn.connect().unwrap();
    assert_eq!(next_event(&mut events).await, ConnectionEvent::Connected);
    match next_event(&mut events).await {
        ConnectionEvent::Error(message) => assert!(message.starts_with("metadata error")),
        other => panic!("expected an error event, got {other:?}"),
    }
    assert_eq!(conn.phase(), ConnectionPhase::Errored);
    assert!(matches!(conn.runtime().await, Err(RpcError::NotReady)));
    shutdown.trigger();
}

#[tokio::test]
async fn test_reconnects_after_drop() {
    let node = start_mock_node(NodeScript::default()).await;
    let shutdown = Shutdown::new();
    let conn = WsConnection::new(&node.url, fast_policy(), &shutdown).unwrap();

    let mut events = conn.subscribe();
    conn.connect().unwrap();
    assert_eq!(next_event(&mut events).await, ConnectionEvent::Connected);
    assert_eq!(next_event(&mut events).await, ConnectionEvent::Ready);

    node.disconnect_all();
    assert_eq!(next_event(&mut events).await, ConnectionEvent::Disconnected);
    assert_eq!(next_event(&mut events).await, ConnectionEvent::Connected);
    assert_eq!(next_event(&mut events).await, ConnectionEvent::Ready);
    assert_eq!(node.connections(), 2);
    shutdown.trigger();
}

#[tokio::test]
async fn test_bootstrap_over_websocket() {
    let node = start_mock_node(NodeScript {
        chain: "Polkadot".into(),
        chain_type: None,
        properties: json!({"ss58Format": 0, "tokenDecimals": [10], "tokenSymbol": ["DOT"]}),
        ..NodeScript::default()
    })
    .await;
    let shutdown = Shutdown::new();
    let conn = WsConnection::new(&node.url, fast_policy(), &shutdown).unwrap();
    let ctx = ApiContext::new(
        Arc::new(conn),
        Arc::new(TypeRegistry::new()),
        Arc::new(NoExtension),
    );
    let mut rx = ctx.publisher.subscribe();

    let task = Bootstrap::new(ctx.clone(), "chain-connect")
        .start(&shutdown)
        .unwrap();

    let state = wait_for_state(&mut rx, |s| s.is_api_ready && !s.is_waiting_injected).await;
    assert!(state.is_api_initialized);
    assert!(state.is_api_connected);
    assert_eq!(state.error_message, "");
    assert!(state.injected_accounts.is_empty());

    let snapshot = state.chain.unwrap();
    assert_eq!(snapshot.system_chain, "Polkadot");
    assert_eq!(snapshot.system_chain_type, ChainType::Live);
    assert!(!snapshot.is_development);
    assert_eq!(snapshot.token_symbol.as_deref(), Some("DOT"));
    assert_eq!(snapshot.token_decimals, 10);
    assert_eq!(snapshot.properties.ss58_format, Some(0));
    assert!(snapshot.is_substrate_v2);
    assert_eq!(
        snapshot.api_default_tx.map(|tx| tx.to_string()).as_deref(),
        Some("Balances.transfer")
    );
    assert_eq!(
        snapshot.api_default_tx_sudo.map(|tx| tx.to_string()).as_deref(),
        Some("System.set_code")
    );

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_unreachable_node_reports_error() {
    // Bind then drop to get a port nothing listens on.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let shutdown = Shutdown::new();
    let conn = WsConnection::new(&format!("ws://127.0.0.1:{port}"), fast_policy(), &shutdown).unwrap();
    let ctx = ApiContext::new(
        Arc::new(conn),
        Arc::new(TypeRegistry::new()),
        Arc::new(NoExtension),
    );
    let mut rx = ctx.publisher.subscribe();

    let _task = Bootstrap::new(ctx.clone(), "chain-connect")
        .start(&shutdown)
        .unwrap();

    let state = wait_for_state(&mut rx, |s| !s.error_message.is_empty()).await;
    assert!(state.error_message.starts_with("transport error"));
    assert!(state.is_api_initialized);
    assert!(!state.is_api_connected);
    assert!(!state.is_api_ready);
    shutdown.trigger();
}

#[tokio::test]
async fn test_wss_endpoint_opens_tls() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let shutdown = Shutdown::new();
    let conn = WsConnection::new(&format!("wss://127.0.0.1:{port}"), fast_policy(), &shutdown).unwrap();

    let mut events = conn.subscribe();
    conn.connect().unwrap();

    let (mut stream, _) = tokio::time::timeout(WAIT, listener.accept())
        .await
        .expect("client never dialed")
        .unwrap();
    let mut record = [0u8; 3];
    stream.read_exact(&mut record).await.unwrap();
    // TLS handshake record (ClientHello), protocol major version 3.
    assert_eq!(record[0], 0x16);
    assert_eq!(record[1], 0x03);
    drop(stream);

    match next_event(&mut events).await {
        ConnectionEvent::Error(message) => {
            assert!(message.starts_with("transport error"));
            assert!(!message.contains("not compiled in"));
        }
        other => panic!("expected an error event, got {other:?}"),
    }
    shutdown.trigger();
}
