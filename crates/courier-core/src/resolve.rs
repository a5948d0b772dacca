//! Provider resolution with per-contract memoization.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use courier_contracts::{CallMetadata, Contract, Provider};

use crate::providers::ProviderRegistry;

const RESOLVE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::resolve");

/// Resolves the provider serving a contract and memoizes the choice.
///
/// The memo cache is keyed by contract name and is permanent for the
/// service lifetime: a provider hot-swap does not invalidate previously
/// cached resolutions. That staleness is a deliberate simplicity trade-off.
#[derive(Default)]
pub(crate) struct ProviderResolver {
    cache: Mutex<HashMap<String, Arc<dyn Provider>>>,
}

impl ProviderResolver {
    /// Applies the resolution policy, in order: memo cache, metadata
    /// override, default-if-supported, first supporting provider in
    /// registration order, default as last resort. Returns `None` only when
    /// the registry has no default provider at all.
    pub(crate) fn resolve(
        &self,
        contract: &Contract,
        metadata: &CallMetadata,
        registry: &ProviderRegistry,
    ) -> Option<Arc<dyn Provider>> {
        if let Some(cached) = self.cache.lock().get(contract.name()) {
            return Some(cached.clone());
        }

        let default = registry.default_provider()?;

        let overridden = metadata
            .override_provider()
            .then(|| registry.get(metadata.provider()))
            .flatten();

        let resolved = overridden
            .or_else(|| {
                default
                    .is_contract_supported(contract)
                    .then(|| default.clone())
            })
            .or_else(|| {
                registry
                    .iter_in_order()
                    .find(|(_, provider)| provider.is_contract_supported(contract))
                    .map(|(_, provider)| provider.clone())
            })
            .unwrap_or(default);

        debug!(
            target: RESOLVE_TARGET,
            contract = contract.name(),
            "provider resolved and memoized"
        );
        self.cache
            .lock()
            .insert(contract.name().to_owned(), resolved.clone());
        Some(resolved)
    }
}
