//! End-to-end dispatch pipeline scenarios against the mock provider.

use std::sync::Arc;

use serde_json::json;
use tokio::sync::broadcast::error::TryRecvError;

use courier_contracts::{
    Contract, ContractHandler, ErrorKind, HandlerError, ProviderId, TypeTag, contract_id,
};
use courier_core::{ContractDescriptor, DispatchService, MetadataRegistry, ProviderRegistry};
use courier_mock::{MockProvider, MockResponse};

fn ping_contract() -> Contract {
    Contract::new(
        "GetPingContract",
        TypeTag::named("ping-request"),
        TypeTag::named("ping-response"),
    )
    .with_path("api/ping")
}

fn service_over(mock: Arc<MockProvider>) -> DispatchService {
    let metadata = MetadataRegistry::from_descriptors([ContractDescriptor::new(
        ping_contract(),
        ProviderId::new(1),
    )]);
    let mut providers = ProviderRegistry::new(ProviderId::new(1));
    providers.register(ProviderId::new(1), mock);
    DispatchService::new(metadata, providers)
}

#[tokio::test]
async fn change_stream_publishes_only_content_changes() {
    let mock = Arc::new(MockProvider::new());
    mock.set_response("api/ping", MockResponse::ok("{\"value\":1}"));
    let service = service_over(mock.clone());
    let mut stream = service.subscribe();

    // First call: empty cache counts as changed, one event.
    let first = service.execute(ping_contract()).await;
    assert!(first.success, "unexpected failure: {:?}", first.failure);
    let event = stream.try_recv().expect("first call should publish");
    assert_eq!(event.model, json!({"value": 1}));

    // Identical payload: cache overwritten, nothing published.
    let second = service.execute(ping_contract()).await;
    assert!(second.success);
    assert_eq!(second.hash, first.hash);
    assert!(matches!(stream.try_recv(), Err(TryRecvError::Empty)));

    // Changed payload: second event.
    mock.set_response("api/ping", MockResponse::ok("{\"value\":2}"));
    let third = service.execute(ping_contract()).await;
    assert!(third.success);
    assert_ne!(third.hash, first.hash);
    let event = stream.try_recv().expect("changed payload should publish");
    assert_eq!(event.model, json!({"value": 2}));
}

#[tokio::test]
async fn failed_results_are_cached_but_never_published() {
    let mock = Arc::new(MockProvider::new());
    mock.set_response("api/ping", MockResponse::err("backend down"));
    let service = service_over(mock);
    let mut stream = service.subscribe();

    let result = service.execute(ping_contract()).await;
    assert!(!result.success);
    assert_eq!(result.error_kind(), Some(ErrorKind::TransportFailure));

    let cached = service.latest(result.id).expect("failure should be cached");
    assert!(!cached.success);
    assert!(matches!(stream.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn unsupported_contracts_short_circuit_before_execution() {
    // Nothing scripted: the mock declines the contract's support check.
    let mock = Arc::new(MockProvider::new());
    let service = service_over(mock.clone());

    let result = service.execute(ping_contract()).await;
    assert_eq!(result.error_kind(), Some(ErrorKind::UnsupportedContract));
    assert_eq!(mock.executions(), 0);
}

#[tokio::test]
async fn unknown_contracts_terminate_without_metadata() {
    let mock = Arc::new(MockProvider::new());
    let service = service_over(mock.clone());

    let stranger = Contract::new("Stranger", TypeTag::named("a"), TypeTag::named("b"));
    let result = service.execute(stranger).await;
    assert_eq!(result.error_kind(), Some(ErrorKind::NoMetadata));
    assert_eq!(mock.executions(), 0);
    assert_eq!(mock.connects(), 0);
}

#[tokio::test]
async fn failed_connects_terminate_without_a_transport_call() {
    let mock = Arc::new(MockProvider::new());
    mock.set_response("api/ping", MockResponse::ok("{}"));
    mock.fail_connections("nobody home");
    let service = service_over(mock.clone());

    let result = service.execute(ping_contract()).await;
    assert_eq!(result.error_kind(), Some(ErrorKind::ConnectFailed));
    assert_eq!(mock.executions(), 0);
}

#[tokio::test]
async fn connected_providers_skip_the_connect_round_trip() {
    let mock = Arc::new(MockProvider::new());
    mock.set_response("api/ping", MockResponse::ok("{\"value\":1}"));
    let service = service_over(mock.clone());

    service.execute(ping_contract()).await;
    service.execute(ping_contract()).await;
    assert_eq!(mock.connects(), 1);
}

#[tokio::test]
async fn resolution_is_memoized_across_calls() {
    let mock = Arc::new(MockProvider::new());
    mock.set_response("api/ping", MockResponse::ok("{\"value\":1}"));
    let service = service_over(mock.clone());

    service.execute(ping_contract()).await;
    let checks_after_first = mock.support_checks();
    service.execute(ping_contract()).await;

    // The second call re-checks support before executing but does not
    // re-scan the registry for resolution.
    assert_eq!(mock.support_checks(), checks_after_first + 1);
}

#[tokio::test]
async fn handlers_rewrite_the_contract_before_execution() {
    struct Stamp;
    impl ContractHandler for Stamp {
        fn name(&self) -> &str {
            "stamp"
        }

        fn update_contract(&self, contract: Contract) -> Result<Contract, HandlerError> {
            Ok(contract.with_payload(json!({"stamped": true})))
        }
    }

    let mock = Arc::new(MockProvider::new());
    mock.set_response("api/ping", MockResponse::ok("{\"value\":1}"));
    let service = service_over(mock);
    assert!(service.add_handler(Arc::new(Stamp)));

    let result = service.execute(ping_contract()).await;
    assert!(result.success);
    assert_eq!(result.payload, json!({"stamped": true}));
}

#[tokio::test]
async fn a_failing_handler_aborts_the_call() {
    struct Reject;
    impl ContractHandler for Reject {
        fn name(&self) -> &str {
            "reject"
        }

        fn update_contract(&self, _contract: Contract) -> Result<Contract, HandlerError> {
            Err(HandlerError::new("reject", "not today"))
        }
    }

    let mock = Arc::new(MockProvider::new());
    mock.set_response("api/ping", MockResponse::ok("{\"value\":1}"));
    let service = service_over(mock.clone());
    service.add_handler(Arc::new(Reject));

    let result = service.execute(ping_contract()).await;
    assert_eq!(result.error_kind(), Some(ErrorKind::HandlerFailed));
    assert_eq!(mock.executions(), 0);

    // Removing the handler restores the pipeline.
    assert!(service.remove_handler("reject"));
    let result = service.execute(ping_contract()).await;
    assert!(result.success);
}

#[tokio::test]
async fn results_carry_the_registered_identity() {
    let mock = Arc::new(MockProvider::new());
    mock.set_response("api/ping", MockResponse::ok("{\"value\":1}"));
    let service = service_over(mock);

    let result = service.execute(ping_contract()).await;
    assert_eq!(result.id, contract_id(&ping_contract()));
    assert_eq!(
        service.find_metadata(&ping_contract()).id(),
        result.id
    );
}

#[tokio::test]
async fn switched_defaults_serve_fresh_contract_types() {
    let first = Arc::new(MockProvider::new());
    let second = Arc::new(MockProvider::new());
    second.set_response("api/pong", MockResponse::ok("{\"value\":3}"));

    let pong = Contract::new(
        "GetPongContract",
        TypeTag::named("pong-request"),
        TypeTag::named("pong-response"),
    )
    .with_path("api/pong");

    let metadata = MetadataRegistry::from_descriptors([
        ContractDescriptor::new(ping_contract(), ProviderId::new(1)),
        ContractDescriptor::new(pong.clone(), ProviderId::new(1)),
    ]);
    let mut providers = ProviderRegistry::new(ProviderId::new(1));
    providers.register(ProviderId::new(1), first);
    providers.register(ProviderId::new(2), second.clone());
    let service = DispatchService::new(metadata, providers);

    assert!(service.switch_provider(ProviderId::new(2)));
    let result = service.execute(pong).await;
    assert!(result.success);
    assert_eq!(second.executions(), 1);
}
