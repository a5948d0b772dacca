//! Provider registry with runtime hot-swap.
//!
//! Providers are registered at startup and may be replaced while the service
//! runs. Replacement is a single reference swap: concurrent readers observe
//! either the old or the new provider, never a torn state, and in-flight
//! calls keep the instance they already resolved.

use std::collections::HashMap;
use std::sync::Arc;

use courier_contracts::{Provider, ProviderId};

/// Mapping from provider id to provider instance, plus the default.
pub struct ProviderRegistry {
    providers: HashMap<ProviderId, Arc<dyn Provider>>,
    order: Vec<ProviderId>,
    default_id: ProviderId,
}

impl ProviderRegistry {
    /// Builds an empty registry with the given default id.
    #[must_use]
    pub fn new(default_id: ProviderId) -> Self {
        Self {
            providers: HashMap::new(),
            order: Vec::new(),
            default_id,
        }
    }

    /// Registers or replaces the provider under an id.
    pub fn register(&mut self, id: ProviderId, provider: Arc<dyn Provider>) {
        if self.providers.insert(id, provider).is_none() {
            self.order.push(id);
        }
    }

    /// Returns the provider registered under an id.
    #[must_use]
    pub fn get(&self, id: ProviderId) -> Option<Arc<dyn Provider>> {
        self.providers.get(&id).cloned()
    }

    /// Returns the provider under an id, falling back to the default.
    #[must_use]
    pub fn get_or_default(&self, id: ProviderId) -> Option<Arc<dyn Provider>> {
        self.get(id).or_else(|| self.default_provider())
    }

    /// Returns the current default provider, when registered.
    #[must_use]
    pub fn default_provider(&self) -> Option<Arc<dyn Provider>> {
        self.get(self.default_id)
    }

    /// The current default provider id.
    #[must_use]
    pub fn default_id(&self) -> ProviderId {
        self.default_id
    }

    /// Switches the default to another registered provider.
    ///
    /// Unknown ids keep the current default and return `false`.
    pub fn switch_default(&mut self, id: ProviderId) -> bool {
        if self.providers.contains_key(&id) {
            self.default_id = id;
            true
        } else {
            false
        }
    }

    /// Iterates providers in registration order.
    pub fn iter_in_order(&self) -> impl Iterator<Item = (ProviderId, &Arc<dyn Provider>)> {
        self.order
            .iter()
            .filter_map(|id| self.providers.get(id).map(|provider| (*id, provider)))
    }

    /// Number of registered providers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Returns `true` when no provider is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
