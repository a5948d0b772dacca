//! Dispatch core for the Courier remote-procedure layer.
//!
//! The [`DispatchService`] is the façade callers talk to: it matches an
//! incoming contract against startup-registered metadata, resolves and
//! memoizes the provider that will serve it, drives the connect-then-execute
//! protocol, runs the contract-mutation handler chain, decodes the transport
//! payload into the declared model, and feeds the result through the
//! response cache so the change stream only carries successful results whose
//! content actually changed.
//!
//! Construction goes through [`ServiceContext::initialise`], which wires
//! telemetry, validates the default provider, and builds the metadata
//! registry from an explicit table of [`ContractDescriptor`]s — there is no
//! runtime contract discovery and no ambient global service.
//!
//! Calls never panic and never return a Rust error: every failure mode is
//! folded into the returned result as a structured
//! [`courier_contracts::DispatchFailure`].

mod cache;
mod context;
mod handlers;
mod providers;
mod registry;
mod resolve;
mod service;
pub mod telemetry;

pub use context::{BootstrapError, ServiceContext};
pub use providers::ProviderRegistry;
pub use registry::{ContractDescriptor, MetadataRegistry};
pub use service::DispatchService;
pub use telemetry::{TelemetryError, TelemetryHandle};
