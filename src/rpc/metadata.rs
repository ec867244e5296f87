//! Runtime metadata reduction.
//!
//! # Responsibilities
//! - Decode the hex blob returned by `state_getMetadata`
//! - Reduce pallets to call names and constant names
//!
//! # Design Decisions
//! - SCALE decoding is delegated to `frame-metadata`/`parity-scale-codec`
//! - Only the scale-info based formats (v14, v15) are understood; older
//!   nodes fail the handshake with a metadata error

use frame_metadata::{RuntimeMetadata, RuntimeMetadataPrefixed, META_RESERVED};
use parity_scale_codec::Decode;
use scale_info::{PortableRegistry, TypeDef};

use crate::rpc::types::{RpcError, RpcResult, RuntimeSummary};

impl RuntimeSummary {
    /// Decode a `0x`-prefixed hex metadata blob.
    pub fn from_hex(encoded: &str) -> RpcResult<Self> {
        let digits = encoded.strip_prefix("0x").unwrap_or(encoded);
        let bytes = hex::decode(digits)
            .map_err(|e| RpcError::Metadata(format!("invalid hex: {e}")))?;
        Self::from_bytes(&bytes)
    }

    /// Decode raw SCALE metadata bytes.
    pub fn from_bytes(bytes: &[u8]) -> RpcResult<Self> {
        // Byte 4 is the enum index of `RuntimeMetadata`, i.e. the format version.
        let version = *bytes
            .get(4)
            .ok_or_else(|| RpcError::Metadata("metadata blob too short".into()))?;

        let prefixed = RuntimeMetadataPrefixed::decode(&mut &bytes[..])
            .map_err(|e| RpcError::Metadata(format!("v{version}: {e}")))?;
        if prefixed.0 != META_RESERVED {
            return Err(RpcError::Metadata("missing metadata magic".into()));
        }

        let mut summary = RuntimeSummary {
            metadata_version: version,
            ..RuntimeSummary::default()
        };

        match prefixed.1 {
            RuntimeMetadata::V14(meta) => {
                for pallet in &meta.pallets {
                    let calls = pallet
                        .calls
                        .as_ref()
                        .map(|calls| variant_names(&meta.types, calls.ty.id))
                        .unwrap_or_default();
                    let constants = pallet.constants.iter().map(|c| c.name.clone()).collect();
                    summary.insert_pallet(&pallet.name, calls, constants);
                }
            }
            RuntimeMetadata::V15(meta) => {
                for pallet in &meta.pallets {
                    let calls = pallet
                        .calls
                        .as_ref()
                        .map(|calls| variant_names(&meta.types, calls.ty.id))
                        .unwrap_or_default();
                    let constants = pallet.constants.iter().map(|c| c.name.clone()).collect();
                    summary.insert_pallet(&pallet.name, calls, constants);
                }
            }
            _ => {
                return Err(RpcError::Metadata(format!(
                    "unsupported metadata version v{version}"
                )))
            }
        }

        tracing::debug!(
            version,
            pallets_with_calls = summary.calls.len(),
            pallets_with_constants = summary.constants.len(),
            "Runtime metadata decoded"
        );
        Ok(summary)
    }

    fn insert_pallet(&mut self, pallet: &str, calls: Vec<String>, constants: Vec<String>) {
        if !calls.is_empty() {
            self.calls.insert(pallet.to_owned(), calls);
        }
        if !constants.is_empty() {
            self.constants.insert(pallet.to_owned(), constants);
        }
    }
}

fn variant_names(types: &PortableRegistry, id: u32) -> Vec<String> {
    match types.resolve(id).map(|ty| &ty.type_def) {
        Some(TypeDef::Variant(def)) => {
            def.variants.iter().map(|v| v.name.clone()).collect()
        }
        _ => Vec::new(),
    }
}
