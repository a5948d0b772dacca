//! The dispatch façade.
//!
//! One [`DispatchService::execute`] call walks the full pipeline:
//! metadata lookup, provider resolution, connect-if-needed, the mutation
//! handler chain, the support check, transport execution, model decoding,
//! and the cache/publish step. Failures at any stage are folded into the
//! returned result as structured failure values; the call itself never
//! panics and never returns a Rust error.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use courier_contracts::{
    CallContext, CallMetadata, ConnectionResult, ConnectionState, Contract, ContractHandler,
    ContractId, DispatchFailure, ExecutionResult, Provider, ProviderId, TransportResult, TypeTag,
    content_hash,
};

use crate::cache::{ChangeStream, ResponseCache};
use crate::handlers::HandlerChain;
use crate::providers::ProviderRegistry;
use crate::registry::MetadataRegistry;
use crate::resolve::ProviderResolver;

const SERVICE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::service");

/// Façade coordinating resolution, connection, execution, caching, and
/// change publication.
pub struct DispatchService {
    metadata: MetadataRegistry,
    providers: RwLock<ProviderRegistry>,
    resolver: ProviderResolver,
    handlers: HandlerChain,
    cache: ResponseCache,
    stream: ChangeStream,
    cancel: CancellationToken,
    connection_id: Mutex<String>,
}

impl DispatchService {
    /// Builds the service over a metadata registry and a provider registry.
    #[must_use]
    pub fn new(metadata: MetadataRegistry, providers: ProviderRegistry) -> Self {
        Self {
            metadata,
            providers: RwLock::new(providers),
            resolver: ProviderResolver::default(),
            handlers: HandlerChain::default(),
            cache: ResponseCache::default(),
            stream: ChangeStream::default(),
            cancel: CancellationToken::new(),
            connection_id: Mutex::new(String::new()),
        }
    }

    /// Executes one contract end to end and returns its result.
    ///
    /// The result's `failure` field carries the structured reason when the
    /// call did not succeed; this method itself is infallible.
    pub async fn execute(&self, contract: Contract) -> ExecutionResult {
        let metadata = self.metadata.find_for(&contract).clone();
        if metadata.is_empty() {
            let failure = DispatchFailure::no_metadata(contract.name());
            warn!(target: SERVICE_TARGET, contract = contract.name(), "dispatch rejected");
            return ExecutionResult::failed(ContractId::EMPTY, failure);
        }

        let id = metadata.id();
        match self.dispatch(metadata, contract).await {
            Ok(result) => result,
            Err(failure) => {
                warn!(
                    target: SERVICE_TARGET,
                    id = %id,
                    kind = %failure.kind,
                    detail = %failure.message,
                    "dispatch failed"
                );
                ExecutionResult::failed(id, failure)
            }
        }
    }

    /// Drains one provider-originated result for the contract, feeding it
    /// through the same decode/cache/publish path as an executed call.
    #[must_use]
    pub fn try_dequeue(&self, contract: &Contract) -> Option<ExecutionResult> {
        let metadata = self.metadata.find_for(contract).clone();
        if metadata.is_empty() {
            return None;
        }
        let provider = self
            .providers
            .read()
            .get_or_default(metadata.provider())?;
        let transport = provider.try_dequeue()?;
        let call = CallContext::new(metadata, contract.clone());
        Some(self.commit(Self::register_result(&call, transport)))
    }

    /// Connects the current default provider, assigning a fresh connection
    /// id. Already-connected providers short-circuit.
    pub async fn connect(&self) -> ConnectionResult {
        let connection_id = Uuid::new_v4().to_string();
        debug!(target: SERVICE_TARGET, %connection_id, "connecting default provider");
        *self.connection_id.lock() = connection_id;

        let Some(provider) = self.providers.read().default_provider() else {
            return ConnectionResult::failed(
                "no default provider registered",
                ConnectionState::Disconnected,
            );
        };
        match Self::ensure_connected(provider.as_ref(), &self.cancel).await {
            Ok(result) => result,
            Err(failure) => {
                ConnectionResult::failed(failure.message, ConnectionState::Disconnected)
            }
        }
    }

    /// Disconnects the current default provider.
    pub async fn disconnect(&self) {
        let provider = self.providers.read().default_provider();
        if let Some(provider) = provider {
            provider.disconnect().await;
        }
    }

    /// Connection state of the current default provider.
    #[must_use]
    pub fn connection_state(&self) -> ConnectionState {
        self.providers
            .read()
            .default_provider()
            .map_or(ConnectionState::Disconnected, |provider| {
                provider.connection_state()
            })
    }

    /// Connection id assigned by the last [`DispatchService::connect`].
    #[must_use]
    pub fn connection_id(&self) -> String {
        self.connection_id.lock().clone()
    }

    /// Registers or replaces a provider at runtime.
    ///
    /// The swap is not synchronized against in-flight calls, and previously
    /// memoized resolutions keep the instance they resolved.
    pub fn register_provider(&self, id: ProviderId, provider: Arc<dyn Provider>) {
        self.providers.write().register(id, provider);
    }

    /// Switches the default provider; unknown ids keep the current default.
    pub fn switch_provider(&self, id: ProviderId) -> bool {
        self.providers.write().switch_default(id)
    }

    /// Adds a contract mutation handler; duplicate names are rejected.
    pub fn add_handler(&self, handler: Arc<dyn ContractHandler>) -> bool {
        self.handlers.add(handler)
    }

    /// Removes the mutation handler registered under a name.
    pub fn remove_handler(&self, name: &str) -> bool {
        self.handlers.remove(name)
    }

    /// Subscribes an independent listener to the change stream.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ExecutionResult> {
        self.stream.subscribe()
    }

    /// Latest cached result for a contract identity.
    #[must_use]
    pub fn latest(&self, id: ContractId) -> Option<ExecutionResult> {
        self.cache.latest(id)
    }

    /// Metadata matching the contract's (input, output) pair; the empty
    /// sentinel when no registered contract matches.
    #[must_use]
    pub fn find_metadata(&self, contract: &Contract) -> CallMetadata {
        self.metadata.find_for(contract).clone()
    }

    /// Metadata registered under an identity; the empty sentinel when
    /// absent.
    #[must_use]
    pub fn find_metadata_by_id(&self, id: ContractId) -> CallMetadata {
        self.metadata.find_by_id(id).clone()
    }

    /// Cancels the service token; in-flight suspensions resolve to
    /// cancelled results and later calls are rejected.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    async fn dispatch(
        &self,
        metadata: CallMetadata,
        contract: Contract,
    ) -> Result<ExecutionResult, DispatchFailure> {
        if self.cancel.is_cancelled() {
            return Err(DispatchFailure::cancelled());
        }

        let provider = self
            .resolve_provider(&contract, &metadata)
            .ok_or_else(|| DispatchFailure::connect_failed("no default provider registered"))?;

        let connection = Self::ensure_connected(provider.as_ref(), &self.cancel).await?;
        if !connection.success {
            return Err(DispatchFailure::connect_failed(connection.error));
        }

        let contract = self
            .handlers
            .apply(contract)
            .map_err(|error| DispatchFailure::handler_failed(&error))?;

        if !provider.is_contract_supported(&contract) {
            return Err(DispatchFailure::unsupported(contract.name()));
        }

        let call = CallContext::new(metadata, contract);
        let transport = tokio::select! {
            () = self.cancel.cancelled() => return Err(DispatchFailure::cancelled()),
            transport = provider.execute(&call) => transport,
        };

        Ok(self.commit(Self::register_result(&call, transport)))
    }

    fn resolve_provider(
        &self,
        contract: &Contract,
        metadata: &CallMetadata,
    ) -> Option<Arc<dyn Provider>> {
        let registry = self.providers.read();
        self.resolver.resolve(contract, metadata, &registry)
    }

    async fn ensure_connected(
        provider: &dyn Provider,
        cancel: &CancellationToken,
    ) -> Result<ConnectionResult, DispatchFailure> {
        if provider.connection_state() == ConnectionState::Connected {
            return Ok(ConnectionResult::connected());
        }
        tokio::select! {
            () = cancel.cancelled() => Err(DispatchFailure::cancelled()),
            result = provider.connect() => Ok(result),
        }
    }

    /// Builds the execution result from a transport outcome, decoding the
    /// raw payload according to the contract's output tag.
    fn register_result(call: &CallContext, transport: TransportResult) -> ExecutionResult {
        let raw = transport.data;
        let mut failure = transport.error.as_ref().map(DispatchFailure::from_transport);

        let model = if failure.is_none() {
            match Self::decode(&call.metadata, call.contract.output(), &raw) {
                Ok(model) => model,
                Err(decode_failure) => {
                    failure = Some(decode_failure);
                    Value::Null
                }
            }
        } else {
            Value::Null
        };

        if let Some(failure) = &failure {
            warn!(
                target: SERVICE_TARGET,
                method = %call.method,
                kind = %failure.kind,
                detail = %failure.message,
                "remote call failed"
            );
        }

        let mut result = ExecutionResult::empty(call.id);
        result.payload = call.contract.payload().clone();
        result.result_type = call.contract.output().clone();
        result.model = model;
        result.hash = content_hash(&raw);
        result.raw = raw;
        result.success = failure.is_none();
        result.failure = failure;
        result
    }

    /// Decodes the raw payload: raw passthrough for string outputs, the
    /// empty sentinel for void outputs, the registered converter when one
    /// applies, plain JSON otherwise.
    fn decode(
        metadata: &CallMetadata,
        output: &TypeTag,
        raw: &str,
    ) -> Result<Value, DispatchFailure> {
        if metadata.override_converter() {
            let converter = metadata
                .converter()
                .ok_or_else(|| DispatchFailure::converter_missing(metadata.method()))?;
            return converter
                .convert(raw)
                .map_err(|error| DispatchFailure::decode_failed(error.to_string()));
        }
        if output.is_string() {
            return Ok(Value::String(raw.to_owned()));
        }
        if output.is_void() || raw.is_empty() {
            return Ok(Value::Null);
        }
        if let Some(converter) = metadata.converter() {
            return converter
                .convert(raw)
                .map_err(|error| DispatchFailure::decode_failed(error.to_string()));
        }
        serde_json::from_str(raw)
            .map_err(|error| DispatchFailure::decode_failed(format!("invalid JSON payload: {error}")))
    }

    fn commit(&self, result: ExecutionResult) -> ExecutionResult {
        let changed = self.cache.register(&result);
        if changed && result.success {
            self.stream.publish(&result);
        }
        result
    }
}

impl Drop for DispatchService {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_contracts::{ConvertError, ErrorKind, ResultConverter};
    use courier_mock::{MockProvider, MockResponse};

    use crate::registry::ContractDescriptor;

    fn ping_contract() -> Contract {
        Contract::new("GetPingContract", TypeTag::STRING, TypeTag::named("ping"))
    }

    fn service_with(mock: Arc<MockProvider>) -> DispatchService {
        let metadata = MetadataRegistry::from_descriptors([ContractDescriptor::new(
            ping_contract(),
            ProviderId::new(1),
        )]);
        let mut providers = ProviderRegistry::new(ProviderId::new(1));
        providers.register(ProviderId::new(1), mock);
        DispatchService::new(metadata, providers)
    }

    #[tokio::test]
    async fn decodes_json_outputs_into_the_model() {
        let mock = Arc::new(MockProvider::new());
        mock.set_response("GetPing", MockResponse::ok("{\"value\":1}"));
        let service = service_with(mock);

        let result = service.execute(ping_contract()).await;
        assert!(result.success, "unexpected failure: {:?}", result.failure);
        assert_eq!(result.model, serde_json::json!({"value": 1}));
        assert_eq!(result.raw, "{\"value\":1}");
    }

    #[tokio::test]
    async fn string_outputs_pass_the_raw_payload_through() {
        let mock = Arc::new(MockProvider::new());
        mock.set_response("GetEcho", MockResponse::ok("not json at all"));
        let metadata = MetadataRegistry::from_descriptors([ContractDescriptor::new(
            Contract::new("GetEchoContract", TypeTag::STRING, TypeTag::STRING),
            ProviderId::new(1),
        )]);
        let mut providers = ProviderRegistry::new(ProviderId::new(1));
        providers.register(ProviderId::new(1), mock);
        let service = DispatchService::new(metadata, providers);

        let result = service
            .execute(Contract::new(
                "GetEchoContract",
                TypeTag::STRING,
                TypeTag::STRING,
            ))
            .await;
        assert!(result.success);
        assert_eq!(result.model, Value::String("not json at all".to_owned()));
    }

    #[tokio::test]
    async fn malformed_payloads_surface_as_decode_failures() {
        let mock = Arc::new(MockProvider::new());
        mock.set_response("GetPing", MockResponse::ok("{not json"));
        let service = service_with(mock);

        let result = service.execute(ping_contract()).await;
        assert!(!result.success);
        assert_eq!(result.error_kind(), Some(ErrorKind::DecodeFailed));
        // The raw payload is preserved for diagnosis.
        assert_eq!(result.raw, "{not json");
    }

    #[tokio::test]
    async fn failing_converters_surface_as_decode_failures() {
        struct Failing;
        impl ResultConverter for Failing {
            fn convert(&self, _raw: &str) -> Result<Value, ConvertError> {
                Err(ConvertError::new("cannot convert"))
            }
        }

        let metadata = MetadataRegistry::from_descriptors([ContractDescriptor::new(
            ping_contract(),
            ProviderId::new(1),
        )
        .with_converter(Arc::new(Failing), true)]);

        let mock = Arc::new(MockProvider::new());
        mock.set_response("GetPing", MockResponse::ok("payload"));
        let mut providers = ProviderRegistry::new(ProviderId::new(1));
        providers.register(ProviderId::new(1), mock);
        let service = DispatchService::new(metadata, providers);

        let result = service.execute(ping_contract()).await;
        assert_eq!(result.error_kind(), Some(ErrorKind::DecodeFailed));
    }

    #[tokio::test]
    async fn missing_required_converter_is_its_own_failure() {
        let metadata = MetadataRegistry::from_descriptors([ContractDescriptor::new(
            ping_contract(),
            ProviderId::new(1),
        )
        .with_required_converter()]);

        let mock = Arc::new(MockProvider::new());
        mock.set_response("GetPing", MockResponse::ok("payload"));
        let mut providers = ProviderRegistry::new(ProviderId::new(1));
        providers.register(ProviderId::new(1), mock);
        let service = DispatchService::new(metadata, providers);

        let result = service.execute(ping_contract()).await;
        assert_eq!(result.id, courier_contracts::contract_id(&ping_contract()));
        assert_eq!(result.error_kind(), Some(ErrorKind::ConverterMissing));
    }

    #[tokio::test]
    async fn shutdown_rejects_subsequent_calls() {
        let mock = Arc::new(MockProvider::new());
        mock.set_response("GetPing", MockResponse::ok("{}"));
        let service = service_with(mock);

        service.shutdown();
        let result = service.execute(ping_contract()).await;
        assert_eq!(result.error_kind(), Some(ErrorKind::Cancelled));
    }

    #[tokio::test]
    async fn pushed_results_flow_through_the_cache_and_stream() {
        let mock = Arc::new(MockProvider::new());
        mock.push(TransportResult::ok("GetPing", "{\"value\":9}", None));
        let service = service_with(mock);
        let mut stream = service.subscribe();

        let contract = ping_contract();
        let result = service.try_dequeue(&contract).expect("queued result");
        assert!(result.success);
        assert_eq!(result.model, serde_json::json!({"value": 9}));
        assert_eq!(stream.recv().await.expect("event").id, result.id);

        assert!(service.try_dequeue(&contract).is_none());
    }
}
