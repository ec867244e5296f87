//! HTTP status surface.
//!
//! # Data Flow
//! ```text
//! TCP listener
//!     → server.rs (Axum router, TraceLayer, graceful shutdown)
//!     → handlers.rs (read StatePublisher snapshot / TypeRegistry)
//!     → JSON response
//! ```
//!
//! # Routes
//! - `GET /status`: the published `ApiState`
//! - `GET /health`: 200 while ready and connected, 503 otherwise
//! - `GET /accounts`: injected accounts
//! - `GET /types`: registered type names
//! - `POST /types/{name}`: build a typed value from the JSON body
//! - `GET /balance/{raw}`: raw base units rendered with the chain's defaults

pub mod handlers;
pub mod server;

pub use server::StatusServer;
