//! Structured failure values for dispatch calls.
//!
//! The dispatch layer never panics and never returns a Rust error to the
//! caller: every failure is folded into the returned result as a
//! [`DispatchFailure`] carrying a machine-checkable [`ErrorKind`] plus a
//! human-readable message. Transport-level failures travel as data through
//! the provider boundary and are mapped onto the same kinds here.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::result::TransportError;

/// Classification of a failed dispatch call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The contract has no registered identity.
    NoMetadata,
    /// The provider's connect operation did not succeed.
    ConnectFailed,
    /// The resolved provider declines the contract.
    UnsupportedContract,
    /// The provider reported a network or protocol error.
    TransportFailure,
    /// Elapsed time exceeded the configured bound.
    Timeout,
    /// The metadata demands a converter but none is registered.
    ConverterMissing,
    /// A contract mutation handler aborted the call.
    HandlerFailed,
    /// The raw payload did not decode into the declared model.
    DecodeFailed,
    /// The owning service was shut down while the call was in flight.
    Cancelled,
}

impl ErrorKind {
    /// Canonical label used in logs and messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoMetadata => "no metadata",
            Self::ConnectFailed => "connect failed",
            Self::UnsupportedContract => "unsupported contract",
            Self::TransportFailure => "transport failure",
            Self::Timeout => "timeout",
            Self::ConverterMissing => "converter missing",
            Self::HandlerFailed => "handler failed",
            Self::DecodeFailed => "decode failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Failure value attached to an unsuccessful execution result.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct DispatchFailure {
    /// Machine-checkable failure classification.
    pub kind: ErrorKind,
    /// Human-readable detail.
    pub message: String,
}

impl DispatchFailure {
    /// Builds a failure from its parts.
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Failure for a contract without registered metadata.
    #[must_use]
    pub fn no_metadata(contract: &str) -> Self {
        Self::new(
            ErrorKind::NoMetadata,
            format!("no metadata registered for contract '{contract}'"),
        )
    }

    /// Failure for an unsuccessful provider connect.
    #[must_use]
    pub fn connect_failed(error: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConnectFailed, error)
    }

    /// Failure for a provider that declines the contract.
    #[must_use]
    pub fn unsupported(contract: &str) -> Self {
        Self::new(
            ErrorKind::UnsupportedContract,
            format!("contract '{contract}' is not supported by the resolved provider"),
        )
    }

    /// Failure for a transport-level error.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TransportFailure, message)
    }

    /// Failure for an exhausted overall timeout.
    #[must_use]
    pub fn timeout(attempts: u32, elapsed: Duration) -> Self {
        Self::new(
            ErrorKind::Timeout,
            format!("request timeout after {attempts} attempt(s) in {elapsed:?}"),
        )
    }

    /// Failure for metadata that demands an absent converter.
    #[must_use]
    pub fn converter_missing(method: &str) -> Self {
        Self::new(
            ErrorKind::ConverterMissing,
            format!("metadata for '{method}' requires a converter but none is registered"),
        )
    }

    /// Failure for an aborting mutation handler.
    #[must_use]
    pub fn handler_failed(error: &HandlerError) -> Self {
        Self::new(ErrorKind::HandlerFailed, error.to_string())
    }

    /// Failure for a payload that did not decode into the declared model.
    #[must_use]
    pub fn decode_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DecodeFailed, message)
    }

    /// Failure for a call interrupted by service shutdown.
    #[must_use]
    pub fn cancelled() -> Self {
        Self::new(ErrorKind::Cancelled, "service shut down while call was in flight")
    }

    /// Maps a transport-level error onto a dispatch failure.
    #[must_use]
    pub fn from_transport(error: &TransportError) -> Self {
        match error {
            TransportError::Failed { message } => Self::transport(message.clone()),
            TransportError::Timeout { attempts, elapsed } => Self::timeout(*attempts, *elapsed),
            TransportError::Unsupported => Self::new(
                ErrorKind::UnsupportedContract,
                "provider declined the contract at execution time",
            ),
        }
    }
}

/// Error returned by a contract mutation handler to abort a call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("contract handler '{handler}' failed: {message}")]
pub struct HandlerError {
    /// Name of the failing handler.
    pub handler: String,
    /// Human-readable detail.
    pub message: String,
}

impl HandlerError {
    /// Builds a handler error.
    #[must_use]
    pub fn new(handler: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            handler: handler.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_errors_map_onto_their_kinds() {
        let failed = TransportError::Failed {
            message: "boom".to_owned(),
        };
        assert_eq!(
            DispatchFailure::from_transport(&failed).kind,
            ErrorKind::TransportFailure
        );

        let timeout = TransportError::Timeout {
            attempts: 2,
            elapsed: Duration::from_secs(3),
        };
        let mapped = DispatchFailure::from_transport(&timeout);
        assert_eq!(mapped.kind, ErrorKind::Timeout);
        assert!(mapped.message.contains("2 attempt(s)"));

        assert_eq!(
            DispatchFailure::from_transport(&TransportError::Unsupported).kind,
            ErrorKind::UnsupportedContract
        );
    }

    #[test]
    fn displays_kind_and_message() {
        let failure = DispatchFailure::no_metadata("PingContract");
        assert_eq!(
            failure.to_string(),
            "no metadata: no metadata registered for contract 'PingContract'"
        );
    }
}
