//! Connection event handling and the ChainReady load.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use futures_util::future::{BoxFuture, Shared};
use futures_util::{FutureExt, TryFutureExt};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

use crate::bootstrap::derive::{self, ChainFacts};
use crate::bootstrap::BootstrapError;
use crate::context::ApiContext;
use crate::extension::{ExtensionBridge, ExtensionError, ExtensionHandle};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::registry::TypeRegistry;
use crate::rpc::{ChainApi, ConnectionEvent, RpcResult};
use crate::state::{ChainSnapshot, InjectedAccount};

type Authorization = Shared<BoxFuture<'static, Result<Vec<ExtensionHandle>, ExtensionError>>>;

/// Everything handed to the ready callback after a successful load.
#[derive(Clone)]
pub struct ReadyPayload {
    pub snapshot: ChainSnapshot,
    pub injected_accounts: Vec<InjectedAccount>,
    pub registry: Arc<TypeRegistry>,
    pub api: Arc<dyn ChainApi>,
}

pub type ReadyCallback = Arc<dyn Fn(ReadyPayload) + Send + Sync>;

/// Drives one context from start to (repeated) readiness.
pub struct Bootstrap {
    ctx: ApiContext,
    app_name: String,
    on_ready: Option<ReadyCallback>,
    /// Bumped by every Ready, Disconnected and Error event. A load only
    /// publishes while its generation is still current.
    generation: AtomicU64,
}

impl Bootstrap {
    pub fn new(ctx: ApiContext, app_name: impl Into<String>) -> Self {
        Self {
            ctx,
            app_name: app_name.into(),
            on_ready: None,
            generation: AtomicU64::new(0),
        }
    }

    /// Invoked after every successful ChainReady load.
    pub fn on_ready(mut self, callback: impl Fn(ReadyPayload) + Send + Sync + 'static) -> Self {
        self.on_ready = Some(Arc::new(callback));
        self
    }

    /// Mark the state initialized, open the connection and spawn the event loop.
    ///
    /// The returned task ends when `shutdown` fires or the event channel closes.
    pub fn start(self, shutdown: &Shutdown) -> RpcResult<JoinHandle<()>> {
        self.ctx.publisher.mark_initialized();

        let events = self.ctx.api.subscribe();
        if let Err(e) = self.ctx.api.connect() {
            self.ctx.publisher.set_error(e.to_string());
            return Err(e);
        }

        tracing::info!(
            endpoint = %self.ctx.api.endpoint(),
            app_name = %self.app_name,
            "Bootstrap started"
        );

        let shutdown = shutdown.subscribe();
        Ok(tokio::spawn(run_events(Arc::new(self), events, shutdown)))
    }

    fn handle_event(self: &Arc<Self>, event: ConnectionEvent) {
        let publisher = &self.ctx.publisher;
        match event {
            ConnectionEvent::Connected => {
                tracing::info!(endpoint = %self.ctx.api.endpoint(), "Connected");
                publisher.set_connected(true);
            }
            ConnectionEvent::Disconnected => {
                tracing::warn!(endpoint = %self.ctx.api.endpoint(), "Disconnected");
                self.generation.fetch_add(1, Ordering::SeqCst);
                publisher.set_connected(false);
            }
            ConnectionEvent::Error(message) => {
                tracing::error!(error = %message, "Connection error");
                self.generation.fetch_add(1, Ordering::SeqCst);
                publisher.set_error(message);
                publisher.set_connected(false);
            }
            ConnectionEvent::Ready => {
                let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
                let this = Arc::clone(self);
                tokio::spawn(async move { this.on_chain_ready(generation).await });
            }
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    async fn on_chain_ready(self: Arc<Self>, generation: u64) {
        let started = Instant::now();
        tracing::info!(generation, "Chain ready, loading metadata");

        let authorization = authorize(Arc::clone(&self.ctx.extension), self.app_name.clone());

        // Extension slot settles on its own schedule.
        let slot = authorization.clone();
        let this = Arc::clone(&self);
        tokio::spawn(async move {
            let handles = slot.await.unwrap_or_default();
            if this.is_current(generation) {
                this.ctx.publisher.set_extensions(handles);
            }
        });

        let loaded = self.load(authorization).await;
        if !self.is_current(generation) {
            tracing::debug!(generation, "Discarding superseded chain load");
            return;
        }

        match loaded {
            Ok((snapshot, injected_accounts)) => {
                let elapsed = started.elapsed();
                tracing::info!(
                    chain = %snapshot.system_chain,
                    chain_type = %snapshot.system_chain_type,
                    node = %snapshot.system_name,
                    version = %snapshot.system_version,
                    accounts = injected_accounts.len(),
                    ?elapsed,
                    "Chain metadata loaded"
                );
                metrics::record_bootstrap_success(elapsed);

                self.ctx
                    .publisher
                    .publish_ready(snapshot.clone(), injected_accounts.clone());

                if let Some(callback) = &self.on_ready {
                    callback(ReadyPayload {
                        snapshot,
                        injected_accounts,
                        registry: Arc::clone(&self.ctx.registry),
                        api: Arc::clone(&self.ctx.api),
                    });
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Unable to load chain");
                metrics::record_bootstrap_failure();
                self.ctx.publisher.set_error(e.to_string());
            }
        }
    }

    async fn load(
        &self,
        authorization: Authorization,
    ) -> Result<(ChainSnapshot, Vec<InjectedAccount>), BootstrapError> {
        let api = &self.ctx.api;
        let (properties, chain, chain_type, name, version, runtime, accounts) = tokio::try_join!(
            api.system_properties().map_err(BootstrapError::from),
            api.system_chain().map_err(BootstrapError::from),
            api.system_chain_type().map_err(BootstrapError::from),
            api.system_name().map_err(BootstrapError::from),
            api.system_version().map_err(BootstrapError::from),
            api.runtime().map_err(BootstrapError::from),
            injected_accounts(Arc::clone(&self.ctx.extension), authorization),
        )?;

        let facts = ChainFacts {
            properties,
            chain,
            chain_type,
            name,
            version,
            runtime: runtime.as_ref().clone(),
        };
        let snapshot = derive::build_snapshot(&self.ctx.registry, facts)?;
        Ok((snapshot, accounts))
    }
}

async fn run_events(
    bootstrap: Arc<Bootstrap>,
    mut events: broadcast::Receiver<ConnectionEvent>,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                tracing::debug!("Bootstrap event loop stopping");
                break;
            }
            event = events.recv() => match event {
                Ok(event) => bootstrap.handle_event(event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Connection events dropped");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }
}

/// Start the authorization request once; every clone awaits the same result.
fn authorize(extension: Arc<dyn ExtensionBridge>, app_name: String) -> Authorization {
    async move {
        let result = extension.request_authorization(&app_name).await;
        if let Err(e) = &result {
            tracing::warn!(error = %e, app_name = %app_name, "Extension authorization failed");
        }
        result
    }
    .boxed()
    .shared()
}

/// Account leg of the batch. Never fails: errors become an empty list.
async fn injected_accounts(
    extension: Arc<dyn ExtensionBridge>,
    authorization: Authorization,
) -> Result<Vec<InjectedAccount>, BootstrapError> {
    let listed = match authorization.await {
        Ok(_) => extension.list_accounts().await,
        Err(e) => Err(e),
    };
    Ok(match listed {
        Ok(accounts) => derive::decorate_accounts(accounts),
        Err(e) => {
            tracing::warn!(error = %e, "No injected accounts");
            Vec::new()
        }
    })
}
