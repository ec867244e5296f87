//! Type registry subsystem.
//!
//! # Data Flow
//! ```text
//! config [types] table + optional types file
//!     → TypeRegistry::register_types (before the connection is ready)
//!     → TypeRegistry::create_type(name, json) → TypedValue
//! ```
//!
//! # Design Decisions
//! - One registry per `ApiContext`, shared through `Arc`
//! - Built-in primitives are always present and cannot be removed
//! - Registering a name twice replaces the earlier definition; doing so
//!   after values were created is the caller's problem

pub mod codec;

use std::collections::BTreeMap;

use dashmap::DashMap;
use serde_json::Value;
use thiserror::Error;

pub use codec::{TypeDef, TypedValue};

/// Caller-supplied struct definitions: type name → (field name → field type).
pub type TypeDefinitions = BTreeMap<String, BTreeMap<String, String>>;

/// Errors raised while resolving or building typed values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("unknown type: {0}")]
    UnknownType(String),

    #[error("invalid value for {ty}: {reason}")]
    InvalidValue { ty: String, reason: String },
}

pub type RegistryResult<T> = Result<T, RegistryError>;

/// Maps type names to definitions.
#[derive(Debug)]
pub struct TypeRegistry {
    types: DashMap<String, TypeDef>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// A registry holding only the built-in types.
    pub fn new() -> Self {
        let types = DashMap::new();
        for (name, def) in codec::builtins() {
            types.insert(name.to_owned(), def);
        }
        Self { types }
    }

    /// Merge struct definitions into the registry.
    pub fn register_types(&self, definitions: TypeDefinitions) {
        let count = definitions.len();
        for (name, fields) in definitions {
            if self.types.contains_key(&name) {
                tracing::warn!(type_name = %name, "Replacing existing type definition");
            }
            self.types
                .insert(name, TypeDef::Struct(fields.into_iter().collect()));
        }
        tracing::debug!(count, "Custom types registered");
    }

    /// Build a typed value of `name` from its JSON representation.
    pub fn create_type(&self, name: &str, value: Value) -> RegistryResult<TypedValue> {
        codec::build(self, name.trim(), &value)
    }

    /// Whether `name` resolves, including `Option<..>`/`Vec<..>` wrappers.
    pub fn contains(&self, name: &str) -> bool {
        match codec::split_generic(name.trim()) {
            Some((_, inner)) => self.contains(inner),
            None => self.types.contains_key(name.trim()),
        }
    }

    /// Every registered name, sorted.
    pub fn type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.types.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub(crate) fn lookup(&self, name: &str) -> Option<TypeDef> {
        self.types.get(name).map(|e| e.value().clone())
    }
}
