//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::BridgeConfig;
use crate::config::validation::{validate_config, ValidationError};
use crate::registry::TypeDefinitions;

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Types(serde_json::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Types(e) => write!(f, "Invalid types file: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<BridgeConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: BridgeConfig = toml::from_str(&content).map_err(ConfigError::Parse)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Read a JSON object of `{ "TypeName": { "field": "type", ... } }`.
pub fn load_type_definitions(path: &Path) -> Result<TypeDefinitions, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    serde_json::from_str(&content).map_err(ConfigError::Types)
}

/// Definitions from the types file (if any) with inline ones layered on top.
pub fn resolve_type_definitions(config: &BridgeConfig) -> Result<TypeDefinitions, ConfigError> {
    let mut definitions = match &config.types.path {
        Some(path) => load_type_definitions(path)?,
        None => TypeDefinitions::new(),
    };
    definitions.extend(config.types.definitions.clone());
    Ok(definitions)
}
