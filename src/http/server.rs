//! Status server setup.
//!
//! # Responsibilities
//! - Create the Axum router with all handlers
//! - Wire up request tracing
//! - Serve until the shutdown coordinator fires

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::context::ApiContext;
use crate::http::handlers;
use crate::lifecycle::Shutdown;

/// Read-only HTTP view of one [`ApiContext`].
pub struct StatusServer {
    router: Router,
}

impl StatusServer {
    pub fn new(ctx: ApiContext) -> Self {
        Self {
            router: Self::build_router(ctx),
        }
    }

    /// Build the Axum router with all middleware layers.
    pub fn build_router(ctx: ApiContext) -> Router {
        Router::new()
            .route("/status", get(handlers::get_status))
            .route("/health", get(handlers::get_health))
            .route("/accounts", get(handlers::get_accounts))
            .route("/types", get(handlers::get_types))
            .route("/types/{name}", post(handlers::create_type))
            .route("/balance/{raw}", get(handlers::get_balance))
            .with_state(ctx)
            .layer(TraceLayer::new_for_http())
    }

    /// Serve on `listener` until `shutdown` is triggered.
    pub async fn run(self, listener: TcpListener, shutdown: &Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Status server starting");

        let signal = Shutdown::wait(shutdown.subscribe());
        axum::serve(listener, self.router)
            .with_graceful_shutdown(signal)
            .await?;

        tracing::info!("Status server stopped");
        Ok(())
    }
}
