//! Scriptable mock provider for scenario testing and offline development.
//!
//! The mock serves canned responses keyed by method name. Responses can be
//! rescripted between calls, connects can be forced to fail, and pushed
//! results can be queued for [`Provider::try_dequeue`]. Call counters on the
//! support check and on execution make resolution-memoization and
//! short-circuit behaviour observable from tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use courier_contracts::{
    CallContext, ConnectionResult, ConnectionState, Contract, Provider, TransportResult,
};

/// Canned response served for one method.
#[derive(Debug, Clone, Default)]
pub struct MockResponse {
    /// Whether the call reports success.
    pub success: bool,
    /// Raw payload handed back on success.
    pub result: String,
    /// Error message handed back on failure.
    pub error: String,
}

impl MockResponse {
    /// Successful response with the given raw payload.
    #[must_use]
    pub fn ok(result: impl Into<String>) -> Self {
        Self {
            success: true,
            result: result.into(),
            error: String::new(),
        }
    }

    /// Failed response with the given error message.
    #[must_use]
    pub fn err(error: impl Into<String>) -> Self {
        Self {
            success: false,
            result: String::new(),
            error: error.into(),
        }
    }
}

/// Provider serving scripted responses without any transport.
#[derive(Default)]
pub struct MockProvider {
    responses: Mutex<HashMap<String, MockResponse>>,
    state: Mutex<ConnectionState>,
    connect_failure: Mutex<Option<String>>,
    pushed: Mutex<VecDeque<TransportResult>>,
    support_checks: AtomicUsize,
    executions: AtomicUsize,
    connects: AtomicUsize,
}

impl MockProvider {
    /// Builds a disconnected mock with no scripted responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the response served for a method, replacing any previous one.
    pub fn set_response(&self, method: impl Into<String>, response: MockResponse) {
        self.responses.lock().insert(method.into(), response);
    }

    /// Removes the scripted response for a method, so the mock declines it.
    pub fn clear_response(&self, method: &str) {
        self.responses.lock().remove(method);
    }

    /// Forces subsequent connects to fail with the given error.
    pub fn fail_connections(&self, error: impl Into<String>) {
        *self.connect_failure.lock() = Some(error.into());
    }

    /// Queues a provider-originated result for [`Provider::try_dequeue`].
    pub fn push(&self, result: TransportResult) {
        self.pushed.lock().push_back(result);
    }

    /// Number of support checks performed so far.
    #[must_use]
    pub fn support_checks(&self) -> usize {
        self.support_checks.load(Ordering::SeqCst)
    }

    /// Number of executions performed so far.
    #[must_use]
    pub fn executions(&self) -> usize {
        self.executions.load(Ordering::SeqCst)
    }

    /// Number of connect attempts performed so far.
    #[must_use]
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn connection_state(&self) -> ConnectionState {
        *self.state.lock()
    }

    async fn connect(&self) -> ConnectionResult {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.connect_failure.lock().clone() {
            *self.state.lock() = ConnectionState::Disconnected;
            return ConnectionResult::failed(error, ConnectionState::Disconnected);
        }
        *self.state.lock() = ConnectionState::Connected;
        ConnectionResult::connected()
    }

    async fn disconnect(&self) {
        *self.state.lock() = ConnectionState::Disconnected;
    }

    fn is_contract_supported(&self, contract: &Contract) -> bool {
        self.support_checks.fetch_add(1, Ordering::SeqCst);
        self.responses.lock().contains_key(&contract.method_name())
    }

    async fn execute(&self, call: &CallContext) -> TransportResult {
        self.executions.fetch_add(1, Ordering::SeqCst);
        let scripted = self.responses.lock().get(&call.method).cloned();
        match scripted {
            Some(response) if response.success => {
                TransportResult::ok(call.method.clone(), response.result, Some(200))
            }
            Some(response) => TransportResult::failed(call.method.clone(), response.error, None),
            None => TransportResult::unsupported(call.method.clone()),
        }
    }

    fn try_dequeue(&self) -> Option<TransportResult> {
        self.pushed.lock().pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_contracts::{CallMetadata, ContractId, ProviderId, TransportError, TypeTag};

    fn ping_call() -> CallContext {
        let contract = Contract::new("PingContract", TypeTag::STRING, TypeTag::STRING);
        let metadata = CallMetadata::new(ContractId::new(1), "Ping", ProviderId::new(1));
        CallContext::new(metadata, contract)
    }

    #[tokio::test]
    async fn serves_rescripted_responses() {
        let provider = MockProvider::new();
        provider.set_response("Ping", MockResponse::ok("{\"value\":1}"));

        let call = ping_call();
        let first = provider.execute(&call).await;
        assert!(first.is_success());
        assert_eq!(first.data, "{\"value\":1}");

        provider.set_response("Ping", MockResponse::ok("{\"value\":2}"));
        let second = provider.execute(&call).await;
        assert_eq!(second.data, "{\"value\":2}");
        assert_eq!(provider.executions(), 2);
    }

    #[tokio::test]
    async fn declines_unscripted_methods() {
        let provider = MockProvider::new();
        let call = ping_call();
        let result = provider.execute(&call).await;
        assert_eq!(result.error, Some(TransportError::Unsupported));
    }

    #[tokio::test]
    async fn forced_connect_failures_keep_the_provider_disconnected() {
        let provider = MockProvider::new();
        provider.fail_connections("nobody home");

        let result = provider.connect().await;
        assert!(!result.success);
        assert_eq!(result.state, ConnectionState::Disconnected);
        assert_eq!(provider.connection_state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn connect_marks_the_provider_connected() {
        let provider = MockProvider::new();
        let result = provider.connect().await;
        assert!(result.success);
        assert_eq!(provider.connection_state(), ConnectionState::Connected);
    }

    #[test]
    fn pushed_results_drain_in_order() {
        let provider = MockProvider::new();
        provider.push(TransportResult::ok("Ping", "1", None));
        provider.push(TransportResult::ok("Ping", "2", None));

        assert_eq!(provider.try_dequeue().map(|result| result.data), Some("1".to_owned()));
        assert_eq!(provider.try_dequeue().map(|result| result.data), Some("2".to_owned()));
        assert!(provider.try_dequeue().is_none());
    }
}
