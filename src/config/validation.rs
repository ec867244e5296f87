//! Configuration validation.
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Pure function: `&BridgeConfig` → `Result<(), Vec<ValidationError>>`

use std::net::SocketAddr;

use url::Url;

use crate::config::schema::BridgeConfig;

/// A single semantic problem with a config value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_config(config: &BridgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.app_name.trim().is_empty() {
        errors.push(ValidationError::new("app_name", "must not be empty"));
    }

    let url = config.endpoint.url.trim();
    if url.is_empty() {
        errors.push(ValidationError::new("endpoint.url", "must not be empty"));
    } else {
        match Url::parse(url) {
            Ok(parsed) if matches!(parsed.scheme(), "ws" | "wss") => {}
            Ok(parsed) => errors.push(ValidationError::new(
                "endpoint.url",
                format!("unsupported scheme '{}', expected ws or wss", parsed.scheme()),
            )),
            Err(e) => errors.push(ValidationError::new("endpoint.url", e.to_string())),
        }
    }

    if config.endpoint.reconnect_base_ms == 0 {
        errors.push(ValidationError::new("endpoint.reconnect_base_ms", "must be > 0"));
    }
    if config.endpoint.reconnect_max_ms < config.endpoint.reconnect_base_ms {
        errors.push(ValidationError::new(
            "endpoint.reconnect_max_ms",
            "must be >= reconnect_base_ms",
        ));
    }

    if config.status.enabled && config.status.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "status.bind_address",
            format!("'{}' is not a socket address", config.status.bind_address),
        ));
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    for (name, fields) in &config.types.definitions {
        if fields.is_empty() {
            errors.push(ValidationError::new(
                "types.definitions",
                format!("'{name}' has no fields"),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
