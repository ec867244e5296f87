//! Chain connection integration layer.
//!
//! Connects to a Substrate-style node over WebSocket JSON-RPC, publishes
//! connection state through a watch channel and loads chain metadata once
//! the node is ready.

pub mod balance;
pub mod bootstrap;
pub mod config;
pub mod context;
pub mod extension;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod registry;
pub mod rpc;
pub mod state;

pub use bootstrap::{Bootstrap, BootstrapError, ReadyPayload};
pub use config::BridgeConfig;
pub use context::ApiContext;
pub use http::StatusServer;
pub use lifecycle::Shutdown;
pub use state::{ApiState, StatePublisher};
