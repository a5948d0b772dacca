//! Connection, transport, and execution result values.
//!
//! All failure information travels as data. Providers return a
//! [`TransportResult`] whose optional [`TransportError`] distinguishes plain
//! failures, exhausted timeouts, and declined contracts; the dispatch layer
//! folds those into the [`ExecutionResult`] returned to callers.

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::contract::TypeTag;
use crate::error::DispatchFailure;
use crate::identity::ContractId;

/// Connection lifecycle of a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    /// No connection has been established.
    #[default]
    Disconnected,
    /// A connect operation is in flight.
    Connecting,
    /// The provider is ready to execute calls.
    Connected,
    /// The provider has been shut down and will not reconnect.
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Closed => "closed",
        };
        formatter.write_str(label)
    }
}

/// Outcome of a provider connect operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionResult {
    /// Whether the provider reached the connected state.
    pub success: bool,
    /// Transport-supplied detail for failed connects; empty on success.
    pub error: String,
    /// The provider's state after the operation.
    pub state: ConnectionState,
}

impl ConnectionResult {
    /// Result for a provider that is connected and ready.
    #[must_use]
    pub fn connected() -> Self {
        Self {
            success: true,
            error: String::new(),
            state: ConnectionState::Connected,
        }
    }

    /// Result for a connect operation that did not succeed.
    #[must_use]
    pub fn failed(error: impl Into<String>, state: ConnectionState) -> Self {
        Self {
            success: false,
            error: error.into(),
            state,
        }
    }
}

/// Transport-level error carried as data through the provider boundary.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// Network or protocol failure.
    #[error("{message}")]
    Failed {
        /// Transport-supplied detail.
        message: String,
    },
    /// The overall timeout elapsed before a successful attempt.
    #[error("request timeout after {attempts} attempt(s) in {elapsed:?}")]
    Timeout {
        /// Attempts made before giving up.
        attempts: u32,
        /// Wall-clock time since the first attempt.
        elapsed: Duration,
    },
    /// The provider declined the contract at execution time.
    #[error("contract not supported by the provider")]
    Unsupported,
}

/// Raw outcome of one transport execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResult {
    /// Method name the transport executed, echoed for logging.
    pub id: String,
    /// Raw response payload; empty on failure.
    pub data: String,
    /// Protocol response code, when the transport has one.
    pub response_code: Option<u16>,
    /// Failure detail; `None` marks success.
    pub error: Option<TransportError>,
}

impl TransportResult {
    /// Successful result carrying the raw response payload.
    #[must_use]
    pub fn ok(id: impl Into<String>, data: impl Into<String>, response_code: Option<u16>) -> Self {
        Self {
            id: id.into(),
            data: data.into(),
            response_code,
            error: None,
        }
    }

    /// Failed result with a transport-supplied message.
    #[must_use]
    pub fn failed(
        id: impl Into<String>,
        message: impl Into<String>,
        response_code: Option<u16>,
    ) -> Self {
        Self {
            id: id.into(),
            data: String::new(),
            response_code,
            error: Some(TransportError::Failed {
                message: message.into(),
            }),
        }
    }

    /// Result for an exhausted overall timeout.
    #[must_use]
    pub fn timeout(id: impl Into<String>, attempts: u32, elapsed: Duration) -> Self {
        Self {
            id: id.into(),
            data: String::new(),
            response_code: None,
            error: Some(TransportError::Timeout { attempts, elapsed }),
        }
    }

    /// Result for a contract the provider declines.
    #[must_use]
    pub fn unsupported(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            data: String::new(),
            response_code: None,
            error: Some(TransportError::Unsupported),
        }
    }

    /// Returns `true` when the execution succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Final outcome of one dispatch call.
///
/// The latest result per contract identity is cached by the dispatch
/// service; successful, content-changed results are additionally published
/// on the change stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Identity of the executed contract.
    pub id: ContractId,
    /// Echo of the request payload.
    pub payload: Value,
    /// Output tag the model was decoded against.
    pub result_type: TypeTag,
    /// Decoded model; `Null` for void outputs and failed calls.
    pub model: Value,
    /// Raw transport payload the model was decoded from.
    pub raw: String,
    /// Whether the call succeeded end to end.
    pub success: bool,
    /// Structured failure detail for unsuccessful calls.
    pub failure: Option<DispatchFailure>,
    /// Content hash of the raw payload, used for change detection.
    pub hash: u64,
    /// Unix timestamp (seconds) the result was registered at.
    pub timestamp: u64,
}

impl ExecutionResult {
    /// Empty sentinel result for calls that terminated before a transport
    /// round trip.
    #[must_use]
    pub fn empty(id: ContractId) -> Self {
        Self {
            id,
            payload: Value::Null,
            result_type: TypeTag::VOID,
            model: Value::Null,
            raw: String::new(),
            success: false,
            failure: None,
            hash: 0,
            timestamp: unix_timestamp(),
        }
    }

    /// Sentinel result annotated with a structured failure.
    #[must_use]
    pub fn failed(id: ContractId, failure: DispatchFailure) -> Self {
        Self {
            failure: Some(failure),
            ..Self::empty(id)
        }
    }

    /// Classification of the failure, when the call did not succeed.
    #[must_use]
    pub fn error_kind(&self) -> Option<crate::error::ErrorKind> {
        self.failure.as_ref().map(|failure| failure.kind)
    }

    /// Deserializes the decoded model into a caller-supplied type.
    ///
    /// # Errors
    ///
    /// Returns the underlying serde error when the model does not match the
    /// requested shape.
    pub fn model_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.model.clone())
    }
}

/// Seconds since the Unix epoch; zero when the system clock precedes it.
#[must_use]
pub(crate) fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}
