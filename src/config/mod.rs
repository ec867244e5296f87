//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → BridgeConfig (validated, immutable)
//!
//! optional custom types file (JSON)
//!     → loader.rs::load_type_definitions
//!     → merged over the inline [types.definitions] table
//! ```
//!
//! # Design Decisions
//! - Everything is read once at startup; there is no reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_type_definitions, resolve_type_definitions, ConfigError};
pub use schema::BridgeConfig;
