//! Explicit service lifecycle owner.
//!
//! The context replaces any ambient global wiring: callers initialise it
//! once with configuration, providers, and the contract descriptor table,
//! hold on to the [`DispatchService`] it owns, and tear it down explicitly
//! when the application shuts down.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use courier_config::Config;
use courier_contracts::{Provider, ProviderId};

use crate::providers::ProviderRegistry;
use crate::registry::{ContractDescriptor, MetadataRegistry};
use crate::service::DispatchService;
use crate::telemetry::{self, TelemetryError};

const CONTEXT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::context");

/// Errors surfaced during context initialisation.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// The configured default provider id has no registered provider.
    #[error("default provider {0} is not registered")]
    UnknownDefaultProvider(ProviderId),
}

/// Owner of one dispatch service instance.
pub struct ServiceContext {
    service: Arc<DispatchService>,
}

impl ServiceContext {
    /// Initialises telemetry, validates the provider set, builds the
    /// metadata registry from the descriptor table, and wires the service.
    ///
    /// # Errors
    ///
    /// Returns a [`BootstrapError`] when telemetry cannot be installed or
    /// the configured default provider is missing from the provider set.
    pub fn initialise(
        config: &Config,
        providers: impl IntoIterator<Item = (ProviderId, Arc<dyn Provider>)>,
        descriptors: impl IntoIterator<Item = ContractDescriptor>,
    ) -> Result<Self, BootstrapError> {
        telemetry::initialise(&config.log).map_err(|source| BootstrapError::Telemetry { source })?;

        let default_id = ProviderId::new(config.default_provider);
        let mut registry = ProviderRegistry::new(default_id);
        for (id, provider) in providers {
            registry.register(id, provider);
        }
        if registry.default_provider().is_none() {
            return Err(BootstrapError::UnknownDefaultProvider(default_id));
        }

        let metadata = MetadataRegistry::from_descriptors(descriptors);
        info!(
            target: CONTEXT_TARGET,
            contracts = metadata.len(),
            providers = registry.len(),
            default = %default_id,
            "dispatch service initialised"
        );

        Ok(Self {
            service: Arc::new(DispatchService::new(metadata, registry)),
        })
    }

    /// The owned dispatch service.
    #[must_use]
    pub fn service(&self) -> &Arc<DispatchService> {
        &self.service
    }

    /// Cancels in-flight calls and disconnects the default provider.
    pub async fn shutdown(&self) {
        self.service.shutdown();
        self.service.disconnect().await;
        info!(target: CONTEXT_TARGET, "dispatch service shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_contracts::{Contract, TypeTag};
    use courier_mock::MockProvider;

    fn descriptor() -> ContractDescriptor {
        ContractDescriptor::new(
            Contract::new("GetPingContract", TypeTag::STRING, TypeTag::STRING),
            ProviderId::new(1),
        )
    }

    fn config_with_default(default_provider: u32) -> Config {
        Config {
            default_provider,
            ..Config::default()
        }
    }

    #[test]
    fn initialise_validates_the_default_provider() {
        let result = ServiceContext::initialise(
            &config_with_default(9),
            [(
                ProviderId::new(1),
                Arc::new(MockProvider::new()) as Arc<dyn Provider>,
            )],
            [descriptor()],
        );
        assert!(matches!(
            result,
            Err(BootstrapError::UnknownDefaultProvider(id)) if id == ProviderId::new(9)
        ));
    }

    #[tokio::test]
    async fn shutdown_cancels_the_owned_service() {
        let context = ServiceContext::initialise(
            &config_with_default(1),
            [(
                ProviderId::new(1),
                Arc::new(MockProvider::new()) as Arc<dyn Provider>,
            )],
            [descriptor()],
        )
        .expect("context should initialise");

        context.shutdown().await;
        let result = context
            .service()
            .execute(Contract::new(
                "GetPingContract",
                TypeTag::STRING,
                TypeTag::STRING,
            ))
            .await;
        assert_eq!(
            result.error_kind(),
            Some(courier_contracts::ErrorKind::Cancelled)
        );
    }
}
