//! HTTP provider for the Courier dispatch layer.
//!
//! The provider maps contract methods onto configured endpoints, builds wire
//! requests from contract payloads (query parameters for GET, JSON bodies
//! for POST/PATCH), and executes them through an engine that retries failed
//! attempts under an overall wall-clock timeout. Endpoints flagged for debug
//! mode skip the network entirely and return their preconfigured stub.
//!
//! The transport is stateless: the provider reports itself connected from
//! construction and connect/disconnect are no-ops, so the dispatch service's
//! connect-before-execute step always takes its fast path.

mod engine;
mod provider;
mod request;

pub use provider::{HttpProvider, HttpProviderError};
pub use request::{PreparedRequest, RequestBuildError};
