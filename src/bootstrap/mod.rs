//! Bootstrap sequencing.
//!
//! # Data Flow
//! ```text
//! Bootstrap::start
//!     → mark initialized, subscribe to ConnectionEvent, ChainApi::connect
//!
//! Connected / Disconnected / Error(msg) → StatePublisher flags
//!
//! Ready → ChainReady (spawned):
//!     extension authorization (shared future) ─┬→ extension slot
//!                                              └→ account leg (failures → [])
//!     try_join!(properties, chain, chain type, name, version, runtime, accounts)
//!     → derive.rs (fallbacks, default txs, account decoration)
//!     → publish_ready + ready callback   |   set_error on any metadata failure
//! ```
//!
//! # Design Decisions
//! - No retries: a failed ChainReady waits for the next Ready event
//! - The batch has no timeouts; a stalled node call stalls readiness

pub mod derive;
pub mod sequencer;

use thiserror::Error;

use crate::registry::RegistryError;
use crate::rpc::RpcError;

pub use derive::DEFAULT_DECIMALS;
pub use sequencer::{Bootstrap, ReadyCallback, ReadyPayload};

/// Why a ChainReady load failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BootstrapError {
    /// A required metadata call failed; displays as the call's own message.
    #[error(transparent)]
    MetadataFetch(#[from] RpcError),

    #[error("type registry: {0}")]
    Registry(#[from] RegistryError),
}
