//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! connection supervisor, bootstrap sequencer, status server
//!     → logging.rs (tracing events with structured fields)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout via the fmt layer
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Metric updates go through the `metrics` facade; without an installed
//!   recorder they are no-ops, so tests need no setup
//! - Log filter precedence: `RUST_LOG`, then config, then the default

pub mod logging;
pub mod metrics;
