//! Watch-channel backed state publication.

use std::sync::Arc;

use tokio::sync::watch;

use crate::extension::ExtensionHandle;
use crate::state::types::{ApiState, ChainSnapshot, InjectedAccount};

/// Single writer of [`ApiState`]. Clones share the same channel.
#[derive(Debug, Clone)]
pub struct StatePublisher {
    tx: Arc<watch::Sender<ApiState>>,
}

impl Default for StatePublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl StatePublisher {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ApiState::default());
        Self { tx: Arc::new(tx) }
    }

    /// Receiver that observes every republished state.
    pub fn subscribe(&self) -> watch::Receiver<ApiState> {
        self.tx.subscribe()
    }

    /// Current state, cloned.
    pub fn snapshot(&self) -> ApiState {
        self.tx.borrow().clone()
    }

    pub fn mark_initialized(&self) {
        self.tx.send_if_modified(|state| {
            let changed = !state.is_api_initialized;
            state.is_api_initialized = true;
            changed
        });
    }

    /// Connection flag only. Readiness outlives a dropped link.
    pub fn set_connected(&self, connected: bool) {
        self.tx.send_if_modified(|state| {
            let changed = state.is_api_connected != connected;
            state.is_api_connected = connected;
            changed
        });
    }

    /// Record a failure. The connected flag is left to the connection events.
    pub fn set_error(&self, message: impl Into<String>) {
        let message = message.into();
        self.tx.send_if_modified(|state| {
            if state.error_message == message {
                return false;
            }
            state.error_message = message;
            true
        });
    }

    /// Settle the extension slot. Ends the injected-accounts wait.
    pub fn set_extensions(&self, extensions: Vec<ExtensionHandle>) {
        self.tx.send_if_modified(|state| {
            let extensions = Some(extensions);
            let changed = state.extensions != extensions || state.is_waiting_injected;
            state.extensions = extensions;
            state.is_waiting_injected = false;
            changed
        });
    }

    /// Publish a completed ChainReady load.
    pub fn publish_ready(&self, chain: ChainSnapshot, accounts: Vec<InjectedAccount>) {
        self.tx.send_if_modified(|state| {
            let chain = Some(chain);
            let changed = !state.is_api_ready
                || state.chain != chain
                || state.injected_accounts != accounts;
            state.chain = chain;
            state.injected_accounts = accounts;
            state.is_api_ready = true;
            changed
        });
    }
}
