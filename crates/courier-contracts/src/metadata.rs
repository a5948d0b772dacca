//! Call metadata owned by the metadata registry.
//!
//! Metadata is built once at startup from an explicit registration table and
//! is immutable afterwards. Failed lookups return the
//! [`CallMetadata::empty`] sentinel rather than an option so the dispatch
//! pipeline stays branch-free until the single emptiness check at its entry.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::identity::ContractId;

/// Identifier of a registered provider.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct ProviderId(u32);

impl ProviderId {
    /// Wraps a raw provider id.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw provider id.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Error raised by a [`ResultConverter`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ConvertError {
    /// Human-readable detail.
    pub message: String,
}

impl ConvertError {
    /// Builds a conversion error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Converts a raw transport payload into a decoded model.
///
/// Converters are attached to metadata at registration time for contracts
/// whose payloads are not plain JSON documents.
pub trait ResultConverter: Send + Sync {
    /// Converts the raw payload into a model value.
    ///
    /// # Errors
    ///
    /// Returns a [`ConvertError`] when the payload cannot be converted.
    fn convert(&self, raw: &str) -> Result<Value, ConvertError>;
}

/// Routing and conversion metadata for one contract identity.
#[derive(Clone)]
pub struct CallMetadata {
    id: ContractId,
    method: String,
    provider: ProviderId,
    override_provider: bool,
    override_converter: bool,
    converter: Option<Arc<dyn ResultConverter>>,
}

impl CallMetadata {
    /// Builds metadata routing a contract to a provider.
    #[must_use]
    pub fn new(id: ContractId, method: impl Into<String>, provider: ProviderId) -> Self {
        Self {
            id,
            method: method.into(),
            provider,
            override_provider: false,
            override_converter: false,
            converter: None,
        }
    }

    /// Pins resolution to the metadata's provider, bypassing support scans.
    #[must_use]
    pub fn with_override_provider(mut self, override_provider: bool) -> Self {
        self.override_provider = override_provider;
        self
    }

    /// Attaches a result converter. When `required` is set, decoding fails
    /// with a converter-missing error if the converter is absent at call
    /// time instead of falling back to plain JSON decoding.
    #[must_use]
    pub fn with_converter(mut self, converter: Arc<dyn ResultConverter>, required: bool) -> Self {
        self.converter = Some(converter);
        self.override_converter = required;
        self
    }

    /// Marks the metadata as requiring a converter without supplying one.
    #[must_use]
    pub fn with_required_converter(mut self) -> Self {
        self.override_converter = true;
        self
    }

    /// Sentinel metadata returned by failed lookups.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(ContractId::EMPTY, String::new(), ProviderId::default())
    }

    /// Returns `true` for the lookup-failure sentinel.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.id.is_empty()
    }

    /// The contract identity this metadata belongs to.
    #[must_use]
    pub fn id(&self) -> ContractId {
        self.id
    }

    /// The resolved remote method name.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The provider this contract routes to.
    #[must_use]
    pub fn provider(&self) -> ProviderId {
        self.provider
    }

    /// Whether resolution must use [`CallMetadata::provider`] directly.
    #[must_use]
    pub fn override_provider(&self) -> bool {
        self.override_provider
    }

    /// Whether decoding requires the attached converter.
    #[must_use]
    pub fn override_converter(&self) -> bool {
        self.override_converter
    }

    /// The attached result converter, when one is registered.
    #[must_use]
    pub fn converter(&self) -> Option<&Arc<dyn ResultConverter>> {
        self.converter.as_ref()
    }
}

impl fmt::Debug for CallMetadata {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("CallMetadata")
            .field("id", &self.id)
            .field("method", &self.method)
            .field("provider", &self.provider)
            .field("override_provider", &self.override_provider)
            .field("override_converter", &self.override_converter)
            .field("converter", &self.converter.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_metadata_is_empty() {
        assert!(CallMetadata::empty().is_empty());
        assert!(!CallMetadata::new(ContractId::new(9), "Ping", ProviderId::new(1)).is_empty());
    }

    #[test]
    fn converter_attachment_sets_the_override_flag_only_when_required() {
        struct Upper;
        impl ResultConverter for Upper {
            fn convert(&self, raw: &str) -> Result<Value, ConvertError> {
                Ok(Value::String(raw.to_uppercase()))
            }
        }

        let optional = CallMetadata::new(ContractId::new(1), "Ping", ProviderId::new(1))
            .with_converter(Arc::new(Upper), false);
        assert!(!optional.override_converter());
        assert!(optional.converter().is_some());

        let required = CallMetadata::new(ContractId::new(1), "Ping", ProviderId::new(1))
            .with_required_converter();
        assert!(required.override_converter());
        assert!(required.converter().is_none());
    }
}
