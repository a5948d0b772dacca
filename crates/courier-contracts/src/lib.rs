//! Shared contract types for the Courier dispatch layer.
//!
//! A *contract* describes one remote operation: its input and output type
//! identities, an optional routing path, and a JSON payload. Contracts are
//! routed by the dispatch service to a *provider* — a transport
//! implementation capable of connecting, reporting its connection state, and
//! executing calls. This crate holds the value types and capability traits
//! shared between the dispatch core, the transport crates, and external
//! collaborators; it carries no execution logic of its own.
//!
//! Identity is structural: a contract's [`ContractId`] is a deterministic
//! hash of its name and its input/output type tags, so independently
//! constructed descriptions of the same operation always agree on their
//! identity.

mod contract;
mod error;
mod identity;
mod metadata;
mod provider;
mod result;

pub use contract::{Contract, TypeTag};
pub use error::{DispatchFailure, ErrorKind, HandlerError};
pub use identity::{ContractId, content_hash, contract_id, identity_of};
pub use metadata::{CallMetadata, ConvertError, ProviderId, ResultConverter};
pub use provider::{CallContext, ContractHandler, Provider};
pub use result::{
    ConnectionResult, ConnectionState, ExecutionResult, TransportError, TransportResult,
};
