//! Structured logging.
//!
//! # Responsibilities
//! - Install the global tracing subscriber once per process
//! - Resolve the log filter from `RUST_LOG` or configuration

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when neither `RUST_LOG` nor configuration provides one.
pub const DEFAULT_FILTER: &str = "chain_connect=info,tower_http=info";

/// Install the fmt subscriber. Safe to call more than once; later calls are ignored.
pub fn init_logging(configured: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(configured.unwrap_or(DEFAULT_FILTER)))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
