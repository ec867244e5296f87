//! Accounts read from a local JSON keyfile.
//!
//! ```json
//! {
//!   "name": "polkadot-js",
//!   "version": "0.44.1",
//!   "allowed_apps": ["chain-connect"],
//!   "accounts": [{ "address": "5Grw...", "meta": { "name": "Alice", "source": "polkadot-js" } }]
//! }
//! ```
//!
//! `allowed_apps` is optional; when present, other app names are denied.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;

use crate::extension::{Account, ExtensionBridge, ExtensionError, ExtensionHandle};

#[derive(Debug, Deserialize)]
struct Keyfile {
    name: String,
    #[serde(default)]
    version: String,
    #[serde(default)]
    allowed_apps: Option<Vec<String>>,
    #[serde(default)]
    accounts: Vec<Account>,
}

/// Extension backed by a keyfile on disk. The file is re-read on every call.
#[derive(Debug, Clone)]
pub struct FileExtension {
    path: PathBuf,
}

impl FileExtension {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<Keyfile, ExtensionError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ExtensionError::Unavailable)
            }
            Err(e) => return Err(ExtensionError::Io(e.to_string())),
        };
        serde_json::from_str(&content).map_err(|e| ExtensionError::Parse(e.to_string()))
    }
}

#[async_trait]
impl ExtensionBridge for FileExtension {
    async fn request_authorization(
        &self,
        app_name: &str,
    ) -> Result<Vec<ExtensionHandle>, ExtensionError> {
        let keyfile = self.read().await?;
        if let Some(allowed) = &keyfile.allowed_apps {
            if !allowed.iter().any(|app| app == app_name) {
                return Err(ExtensionError::Denied(app_name.to_owned()));
            }
        }

        tracing::info!(
            extension = %keyfile.name,
            path = %self.path.display(),
            "Extension authorized"
        );
        Ok(vec![ExtensionHandle {
            name: keyfile.name,
            version: keyfile.version,
        }])
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, ExtensionError> {
        Ok(self.read().await?.accounts)
    }
}
