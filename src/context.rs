//! The long-lived handle set shared by every component.

use std::sync::Arc;

use crate::balance::BalanceFormat;
use crate::extension::ExtensionBridge;
use crate::registry::TypeRegistry;
use crate::rpc::ChainApi;
use crate::state::StatePublisher;

/// Built once at startup and passed by clone; all members are shared.
#[derive(Clone)]
pub struct ApiContext {
    pub api: Arc<dyn ChainApi>,
    pub registry: Arc<TypeRegistry>,
    pub extension: Arc<dyn ExtensionBridge>,
    pub publisher: StatePublisher,
}

impl ApiContext {
    pub fn new(
        api: Arc<dyn ChainApi>,
        registry: Arc<TypeRegistry>,
        extension: Arc<dyn ExtensionBridge>,
    ) -> Self {
        Self {
            api,
            registry,
            extension,
            publisher: StatePublisher::new(),
        }
    }

    /// Balance defaults of the last ready chain, or plain units before that.
    pub fn balance_format(&self) -> BalanceFormat {
        self.publisher
            .snapshot()
            .chain
            .map(|chain| chain.balance_format())
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for ApiContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiContext")
            .field("endpoint", &self.api.endpoint())
            .field("types", &self.registry.type_names().len())
            .finish_non_exhaustive()
    }
}
