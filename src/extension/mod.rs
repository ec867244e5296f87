//! Account extension subsystem.
//!
//! # Data Flow
//! ```text
//! ChainReady
//!     → ExtensionBridge::request_authorization(app_name) → Vec<ExtensionHandle>
//!     → ExtensionBridge::list_accounts() → Vec<Account>
//!     → bootstrap decorates names and assigns `when_created`
//! ```
//!
//! # Design Decisions
//! - The extension is optional: every failure is absorbed by the caller
//! - Errors are `Clone` so one authorization result can feed several consumers

pub mod keyfile;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use keyfile::FileExtension;

/// Errors from an account source.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtensionError {
    #[error("authorization denied for '{0}'")]
    Denied(String),

    #[error("no account extension available")]
    Unavailable,

    #[error("extension I/O error: {0}")]
    Io(String),

    #[error("extension data invalid: {0}")]
    Parse(String),
}

/// An extension that granted access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionHandle {
    pub name: String,
    pub version: String,
}

/// Account metadata as the extension reports it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountMeta {
    #[serde(default)]
    pub name: Option<String>,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genesis_hash: Option<String>,
}

/// A signing identity offered by an extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub address: String,
    pub meta: AccountMeta,
}

/// Source of injected accounts.
#[async_trait]
pub trait ExtensionBridge: Send + Sync {
    /// Ask every available extension to grant `app_name` access.
    async fn request_authorization(
        &self,
        app_name: &str,
    ) -> Result<Vec<ExtensionHandle>, ExtensionError>;

    /// Accounts from every extension that granted access.
    async fn list_accounts(&self) -> Result<Vec<Account>, ExtensionError>;
}

/// Bridge used when no extension is configured. Always denies.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoExtension;

#[async_trait]
impl ExtensionBridge for NoExtension {
    async fn request_authorization(
        &self,
        _app_name: &str,
    ) -> Result<Vec<ExtensionHandle>, ExtensionError> {
        Err(ExtensionError::Unavailable)
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, ExtensionError> {
        Err(ExtensionError::Unavailable)
    }
}
