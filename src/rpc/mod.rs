//! Chain client subsystem.
//!
//! # Data Flow
//! ```text
//! endpoint URL (config)
//!     → connection.rs (jsonrpsee WebSocket client under a reconnecting supervisor)
//!     → readiness handshake: rpc_methods + state_getMetadata
//!     → metadata.rs (runtime metadata → RuntimeSummary)
//!     → ConnectionEvent::Ready broadcast to subscribers
//! ```
//!
//! # Design Decisions
//! - Consumers depend on the `ChainApi` trait, never on the socket type
//! - Connection events are a typed broadcast channel, not callbacks
//! - Reconnection lives here; callers only observe events
//! - Calls carry the client's request timeout; the bootstrap batch adds none

pub mod api;
pub mod connection;
pub mod metadata;
pub mod reconnect;
pub mod types;

pub use api::ChainApi;
pub use connection::WsConnection;
pub use reconnect::ReconnectPolicy;
pub use types::{
    ChainProperties, ChainType, ConnectionEvent, ConnectionPhase, RpcError, RpcResult,
    RuntimeSummary,
};
