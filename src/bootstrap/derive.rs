//! Fallbacks and derived values computed from one ChainReady batch.

use serde_json::json;

use crate::bootstrap::BootstrapError;
use crate::extension::Account;
use crate::registry::TypeRegistry;
use crate::rpc::types::{ChainProperties, ChainType, RuntimeSummary};
use crate::state::{ChainSnapshot, InjectedAccount, InjectedMeta, TxHandle};

/// Token decimals assumed when the chain reports none.
pub const DEFAULT_DECIMALS: u32 = 15;

const UNKNOWN_CHAIN: &str = "<unknown>";
const UNKNOWN_ACCOUNT: &str = "unknown";
const TEST_CHAIN_SUFFIXES: [&str; 2] = ["Development", "Local Testnet"];

/// Raw results of the metadata batch.
#[derive(Debug, Clone)]
pub struct ChainFacts {
    pub properties: ChainProperties,
    pub chain: String,
    /// `None` when the node has no `system_chainType`.
    pub chain_type: Option<ChainType>,
    pub name: String,
    pub version: String,
    pub runtime: RuntimeSummary,
}

/// Chain names used by well-known test networks.
pub fn is_test_chain(chain: &str) -> bool {
    TEST_CHAIN_SUFFIXES
        .iter()
        .any(|suffix| chain.ends_with(suffix))
}

/// First pallet with calls, and its first call, in lexicographic order.
pub fn default_tx(runtime: &RuntimeSummary) -> Option<TxHandle> {
    runtime.calls.iter().find_map(|(section, methods)| {
        methods.iter().min().map(|method| TxHandle {
            section: section.clone(),
            method: method.clone(),
        })
    })
}

/// The runtime upgrade call (`system.set_code`), falling back to `default`.
pub fn sudo_tx(runtime: &RuntimeSummary, default: Option<&TxHandle>) -> Option<TxHandle> {
    runtime
        .calls
        .iter()
        .filter(|(section, _)| normalize(section) == "system")
        .find_map(|(section, methods)| {
            methods
                .iter()
                .find(|method| normalize(method) == "setcode")
                .map(|method| TxHandle {
                    section: section.clone(),
                    method: method.clone(),
                })
        })
        .or_else(|| default.cloned())
}

// "System"/"system", "set_code"/"setCode" compare equal.
fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Decorate extension accounts for display, numbering them in listing order.
pub fn decorate_accounts(accounts: Vec<Account>) -> Vec<InjectedAccount> {
    accounts
        .into_iter()
        .enumerate()
        .map(|(when_created, account)| {
            let source = if account.meta.source == "polkadot-js" {
                "extension"
            } else {
                account.meta.source.as_str()
            };
            let name = format!(
                "{} ({})",
                account
                    .meta
                    .name
                    .as_deref()
                    .filter(|name| !name.is_empty())
                    .unwrap_or(UNKNOWN_ACCOUNT),
                source
            );
            InjectedAccount {
                address: account.address,
                meta: InjectedMeta {
                    name,
                    source: account.meta.source,
                    genesis_hash: account.meta.genesis_hash,
                    when_created,
                },
            }
        })
        .collect()
}

/// Chain type reported by the node, or `Live` built through the registry.
pub fn resolve_chain_type(
    registry: &TypeRegistry,
    reported: Option<ChainType>,
) -> Result<ChainType, BootstrapError> {
    match reported {
        Some(chain_type) => Ok(chain_type),
        None => {
            let live = registry.create_type("ChainType", json!("Live"))?;
            Ok(ChainType::try_from(&live)?)
        }
    }
}

/// Reported token decimals, or [`DEFAULT_DECIMALS`] built through the registry.
pub fn resolve_decimals(
    registry: &TypeRegistry,
    reported: Option<u32>,
) -> Result<u32, BootstrapError> {
    if let Some(decimals) = reported {
        return Ok(decimals);
    }
    let value = registry.create_type("u32", json!(DEFAULT_DECIMALS))?;
    // A u32 value always fits.
    Ok(value
        .as_u128()
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(DEFAULT_DECIMALS))
}

/// Apply fallbacks and compute derived fields.
pub fn build_snapshot(
    registry: &TypeRegistry,
    facts: ChainFacts,
) -> Result<ChainSnapshot, BootstrapError> {
    let system_chain = if facts.chain.is_empty() {
        UNKNOWN_CHAIN.to_owned()
    } else {
        facts.chain
    };
    let chain_type = resolve_chain_type(registry, facts.chain_type)?;
    let token_decimals = resolve_decimals(registry, facts.properties.token_decimals)?;
    let is_development =
        chain_type.is_development() || chain_type.is_local() || is_test_chain(&system_chain);

    let api_default_tx = default_tx(&facts.runtime);
    let api_default_tx_sudo = sudo_tx(&facts.runtime, api_default_tx.as_ref());

    Ok(ChainSnapshot {
        system_chain,
        system_chain_type: chain_type,
        system_name: facts.name,
        system_version: facts.version,
        is_development,
        is_substrate_v2: !facts.runtime.constants.is_empty(),
        token_symbol: facts.properties.token_symbol.clone(),
        token_decimals,
        properties: facts.properties,
        api_default_tx,
        api_default_tx_sudo,
    })
}
