//! Capability traits implemented by transports and mutation hooks.

use async_trait::async_trait;

use crate::contract::Contract;
use crate::error::HandlerError;
use crate::identity::ContractId;
use crate::metadata::CallMetadata;
use crate::result::{ConnectionResult, ConnectionState, TransportResult};

/// Per-call context handed from the dispatch service to a provider.
///
/// Lives only for the duration of one dispatch and is never shared across
/// calls.
#[derive(Debug, Clone)]
pub struct CallContext {
    /// Identity of the contract being executed.
    pub id: ContractId,
    /// Resolved remote method name.
    pub method: String,
    /// Registered routing metadata.
    pub metadata: CallMetadata,
    /// The (possibly handler-rewritten) contract to execute.
    pub contract: Contract,
}

impl CallContext {
    /// Builds the context for one dispatch call.
    #[must_use]
    pub fn new(metadata: CallMetadata, contract: Contract) -> Self {
        Self {
            id: metadata.id(),
            method: metadata.method().to_owned(),
            metadata,
            contract,
        }
    }
}

/// Transport capability consumed by the dispatch service.
///
/// Implementations own their [`ConnectionState`]; the dispatch service reads
/// it to decide whether a connect round trip is needed but never mutates it
/// directly. Execution failures are returned as data on the
/// [`TransportResult`], never as panics.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Current connection lifecycle state.
    fn connection_state(&self) -> ConnectionState;

    /// Establishes the transport connection.
    async fn connect(&self) -> ConnectionResult;

    /// Tears the transport connection down.
    async fn disconnect(&self);

    /// Whether this provider can execute the given contract.
    fn is_contract_supported(&self, contract: &Contract) -> bool;

    /// Executes one call and returns the raw transport outcome.
    async fn execute(&self, call: &CallContext) -> TransportResult;

    /// Drains one provider-originated result, for transports that push
    /// payloads outside the request/response cycle. The default transport
    /// has nothing to drain.
    fn try_dequeue(&self) -> Option<TransportResult> {
        None
    }
}

/// Mutation hook allowed to rewrite a contract before execution.
///
/// Handlers run in registration order and must be pure transformations:
/// contract in, contract out. A handler error aborts the call; the dispatch
/// service neither retries nor skips a failing handler.
pub trait ContractHandler: Send + Sync {
    /// Stable name used for registration and removal.
    fn name(&self) -> &str;

    /// Returns the (possibly rewritten) contract.
    ///
    /// # Errors
    ///
    /// Returns a [`HandlerError`] to abort the call.
    fn update_contract(&self, contract: Contract) -> Result<Contract, HandlerError>;
}
