//! Startup-built metadata registry.
//!
//! Contracts are registered once at startup from an explicit descriptor
//! table; the registry is read-only afterwards, so lookups on the dispatch
//! path need no locking. Registration is idempotent: the first entry for an
//! identity wins and a duplicate is a configuration warning, not an error.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use courier_contracts::{
    CallMetadata, Contract, ContractId, ProviderId, ResultConverter, TypeTag, contract_id,
};

const REGISTRY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::registry");

/// Registration entry mapping a contract prototype onto its routing.
///
/// The prototype contract supplies the identity triple and the derived
/// method name; its payload is irrelevant and never retained.
pub struct ContractDescriptor {
    contract: Contract,
    provider: ProviderId,
    override_provider: bool,
    converter: Option<Arc<dyn ResultConverter>>,
    converter_required: bool,
}

impl ContractDescriptor {
    /// Builds a descriptor routing the contract to a provider.
    #[must_use]
    pub fn new(contract: Contract, provider: ProviderId) -> Self {
        Self {
            contract,
            provider,
            override_provider: false,
            converter: None,
            converter_required: false,
        }
    }

    /// Pins resolution to the descriptor's provider.
    #[must_use]
    pub fn with_override_provider(mut self) -> Self {
        self.override_provider = true;
        self
    }

    /// Attaches a result converter; when `required` is set, decoding refuses
    /// to fall back to plain JSON.
    #[must_use]
    pub fn with_converter(mut self, converter: Arc<dyn ResultConverter>, required: bool) -> Self {
        self.converter = Some(converter);
        self.converter_required = required;
        self
    }

    /// Marks the contract as requiring a converter without attaching one;
    /// calls then fail with a converter-missing result until a converter is
    /// registered.
    #[must_use]
    pub fn with_required_converter(mut self) -> Self {
        self.converter_required = true;
        self
    }

    fn into_metadata(self) -> (ContractId, TypeTag, TypeTag, CallMetadata) {
        let id = contract_id(&self.contract);
        let mut metadata = CallMetadata::new(id, self.contract.method_name(), self.provider)
            .with_override_provider(self.override_provider);
        metadata = match (self.converter, self.converter_required) {
            (Some(converter), required) => metadata.with_converter(converter, required),
            (None, true) => metadata.with_required_converter(),
            (None, false) => metadata,
        };
        let input = self.contract.input().clone();
        let output = self.contract.output().clone();
        (id, input, output, metadata)
    }
}

/// Read-only mapping from contract identity to call metadata.
pub struct MetadataRegistry {
    by_id: HashMap<ContractId, CallMetadata>,
    by_io: HashMap<(TypeTag, TypeTag), ContractId>,
    by_output: HashMap<TypeTag, ContractId>,
    empty: CallMetadata,
}

impl Default for MetadataRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataRegistry {
    /// Builds an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            by_id: HashMap::new(),
            by_io: HashMap::new(),
            by_output: HashMap::new(),
            empty: CallMetadata::empty(),
        }
    }

    /// Builds a registry from a descriptor table.
    #[must_use]
    pub fn from_descriptors(descriptors: impl IntoIterator<Item = ContractDescriptor>) -> Self {
        let mut registry = Self::new();
        for descriptor in descriptors {
            registry.register(descriptor);
        }
        registry
    }

    /// Registers a contract descriptor and returns its identity.
    ///
    /// Re-registering an already-present identity is a no-op: the first
    /// entry wins and the duplicate is logged as a configuration warning.
    pub fn register(&mut self, descriptor: ContractDescriptor) -> ContractId {
        let (id, input, output, metadata) = descriptor.into_metadata();
        if self.by_id.contains_key(&id) {
            warn!(
                target: REGISTRY_TARGET,
                id = %id,
                method = metadata.method(),
                "duplicate contract registration ignored"
            );
            return id;
        }
        self.by_io.entry((input, output.clone())).or_insert(id);
        self.by_output.entry(output).or_insert(id);
        self.by_id.insert(id, metadata);
        id
    }

    /// Looks metadata up by identity, returning the empty sentinel when
    /// absent.
    #[must_use]
    pub fn find_by_id(&self, id: ContractId) -> &CallMetadata {
        self.by_id.get(&id).unwrap_or(&self.empty)
    }

    /// Looks metadata up by output tag, returning the empty sentinel when
    /// absent.
    #[must_use]
    pub fn find_by_output(&self, output: &TypeTag) -> &CallMetadata {
        self.by_output
            .get(output)
            .map_or(&self.empty, |id| self.find_by_id(*id))
    }

    /// Looks metadata up by the contract's (input, output) pair, returning
    /// the empty sentinel when no registered contract matches.
    #[must_use]
    pub fn find_for(&self, contract: &Contract) -> &CallMetadata {
        self.by_io
            .get(&(contract.input().clone(), contract.output().clone()))
            .map_or(&self.empty, |id| self.find_by_id(*id))
    }

    /// Number of registered contracts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Returns `true` when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ping(provider: u32) -> ContractDescriptor {
        let contract = Contract::new(
            "GetPingContract",
            TypeTag::named("ping-request"),
            TypeTag::named("ping-response"),
        );
        ContractDescriptor::new(contract, ProviderId::new(provider))
    }

    #[test]
    fn registration_derives_identity_and_method() {
        let mut registry = MetadataRegistry::new();
        let id = registry.register(ping(1));

        let metadata = registry.find_by_id(id);
        assert!(!metadata.is_empty());
        assert_eq!(metadata.method(), "GetPing");
        assert_eq!(metadata.provider(), ProviderId::new(1));
    }

    #[test]
    fn first_registration_wins_on_duplicates() {
        let mut registry = MetadataRegistry::new();
        let first = registry.register(ping(1));
        let second = registry.register(ping(2));

        assert_eq!(first, second);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.find_by_id(first).provider(), ProviderId::new(1));
    }

    #[test]
    fn lookups_return_the_empty_sentinel_when_absent() {
        let registry = MetadataRegistry::new();
        assert!(registry.find_by_id(ContractId::new(42)).is_empty());
        assert!(registry.find_by_output(&TypeTag::named("missing")).is_empty());

        let contract = Contract::new("Unknown", TypeTag::STRING, TypeTag::STRING);
        assert!(registry.find_for(&contract).is_empty());
    }

    #[test]
    fn contracts_match_by_their_io_pair() {
        let mut registry = MetadataRegistry::new();
        let id = registry.register(ping(1));

        // A caller-side instance with a different name but the same pair
        // still routes to the registered metadata.
        let caller_side = Contract::new(
            "SomethingElse",
            TypeTag::named("ping-request"),
            TypeTag::named("ping-response"),
        );
        assert_eq!(registry.find_for(&caller_side).id(), id);
    }

    #[test]
    fn output_lookup_finds_the_first_registrant() {
        let mut registry = MetadataRegistry::new();
        let id = registry.register(ping(1));
        assert_eq!(
            registry.find_by_output(&TypeTag::named("ping-response")).id(),
            id
        );
    }
}
