//! Published connection state.
//!
//! # Data Flow
//! ```text
//! bootstrap sequencer (connection events, ChainReady result)
//!     → StatePublisher setters (republish only on change)
//!     → watch::Receiver<ApiState> subscribers
//!     → status HTTP surface, ready callback, in-process consumers
//! ```
//!
//! # Invariants
//! - `is_api_initialized` flips once and never reverts
//! - `chain` is `None` until `is_api_ready`
//! - `is_waiting_injected` is true until the extension authorization settles

pub mod publisher;
pub mod types;

pub use publisher::StatePublisher;
pub use types::{ApiState, ChainSnapshot, InjectedAccount, InjectedMeta, TxHandle};
