//! chain-connect service.
//!
//! ```text
//!   config.toml ──▶ BridgeConfig ──▶ ApiContext ─────────────────────────┐
//!                                    │  WsConnection (ChainApi)           │
//!                                    │  TypeRegistry (+ custom types)     │
//!                                    │  ExtensionBridge (keyfile / none)  │
//!                                    │  StatePublisher                    │
//!                                    ▼                                    ▼
//!   chain node ◀──ws──▶ connection supervisor ──events──▶ Bootstrap    StatusServer
//!                                                  publish_ready ──▶ /status /health
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use chain_connect::config::{self, BridgeConfig};
use chain_connect::extension::{ExtensionBridge, FileExtension, NoExtension};
use chain_connect::lifecycle::signals;
use chain_connect::observability::{logging, metrics};
use chain_connect::registry::TypeRegistry;
use chain_connect::rpc::{ReconnectPolicy, WsConnection};
use chain_connect::{ApiContext, Bootstrap, Shutdown, StatusServer};

#[derive(Parser)]
#[command(name = "chain-connect")]
#[command(about = "Connect to a chain node and publish its state", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the node endpoint (ws:// or wss://)
    #[arg(short, long)]
    url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => config::load_config(path)?,
        None => BridgeConfig::default(),
    };
    if let Some(url) = args.url {
        config.endpoint.url = url;
    }

    logging::init_logging(config.observability.log_filter.as_deref());
    tracing::info!("chain-connect v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        endpoint = %config.endpoint.url,
        app_name = %config.app_name,
        extension = config.extension.enabled,
        status = config.status.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let shutdown = Shutdown::new();

    let registry = Arc::new(TypeRegistry::new());
    registry.register_types(config::resolve_type_definitions(&config)?);

    let policy = ReconnectPolicy::new(
        config.endpoint.reconnect_base_ms,
        config.endpoint.reconnect_max_ms,
    );
    let api = Arc::new(WsConnection::new(&config.endpoint.url, policy, &shutdown)?);

    let extension: Arc<dyn ExtensionBridge> = if config.extension.enabled {
        Arc::new(FileExtension::new(&config.extension.accounts_path))
    } else {
        Arc::new(NoExtension)
    };

    let ctx = ApiContext::new(api, registry, extension);

    let bootstrap = Bootstrap::new(ctx.clone(), config.app_name.clone()).on_ready(|ready| {
        tracing::info!(
            chain = %ready.snapshot.system_chain,
            balance_unit = %ready.snapshot.balance_format().unit,
            default_tx = ?ready.snapshot.api_default_tx.as_ref().map(ToString::to_string),
            "API ready"
        );
    });
    let events = bootstrap.start(&shutdown)?;

    let status = if config.status.enabled {
        let listener = TcpListener::bind(&config.status.bind_address).await?;
        let server = StatusServer::new(ctx.clone());
        let shutdown = shutdown.clone();
        Some(tokio::spawn(async move { server.run(listener, &shutdown).await }))
    } else {
        None
    };

    signals::shutdown_on_signal(shutdown.clone()).await;
    tracing::info!("Shutting down");

    if let Err(e) = events.await {
        tracing::warn!(error = %e, "Bootstrap task ended abnormally");
    }
    if let Some(status) = status {
        match status.await {
            Ok(Err(e)) => tracing::error!(error = %e, "Status server failed"),
            Err(e) => tracing::warn!(error = %e, "Status server task ended abnormally"),
            Ok(Ok(())) => {}
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
