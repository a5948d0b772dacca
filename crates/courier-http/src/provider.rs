//! HTTP provider implementation.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use thiserror::Error;
use tracing::debug;
use url::Url;

use courier_config::{HttpSettings, StubResult};
use courier_contracts::{
    CallContext, ConnectionResult, ConnectionState, Contract, Provider, TransportResult,
};

use crate::engine::{ExecutionEngine, RequestSender, SenderResponse};
use crate::request::{PreparedRequest, build_request};

const PROVIDER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::provider");

/// Errors raised while constructing the provider.
#[derive(Debug, Error)]
pub enum HttpProviderError {
    /// The underlying HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Provider executing contracts against configured HTTP endpoints.
///
/// The transport is stateless, so the provider reports itself connected from
/// construction; connect and disconnect are no-ops. The auth token can be
/// replaced at runtime when a session is (re)established.
pub struct HttpProvider {
    base_url: Option<Url>,
    debug_mode: bool,
    endpoints: HashMap<String, courier_config::EndpointConfig>,
    engine: ExecutionEngine<HttpSender>,
    token: RwLock<String>,
}

impl HttpProvider {
    /// Builds the provider from its settings.
    ///
    /// # Errors
    ///
    /// Returns [`HttpProviderError::Client`] when the HTTP client cannot be
    /// constructed.
    pub fn new(settings: HttpSettings) -> Result<Self, HttpProviderError> {
        let client = reqwest::Client::builder().build()?;
        let engine = ExecutionEngine::new(
            HttpSender { client },
            settings.request_retry,
            settings.timeout(),
            settings.request_timeout(),
        );
        let endpoints = settings
            .endpoints
            .iter()
            .map(|endpoint| (endpoint.contract.clone(), endpoint.clone()))
            .collect();
        Ok(Self {
            base_url: settings.base_url,
            debug_mode: settings.debug_mode,
            endpoints,
            engine,
            token: RwLock::new(settings.auth_token),
        })
    }

    /// Replaces the session token attached to subsequent requests.
    pub fn set_token(&self, token: impl Into<String>) {
        *self.token.write() = token.into();
    }

    fn stub_result(method: &str, stub: &StubResult) -> TransportResult {
        if stub.success {
            TransportResult::ok(method, stub.result.clone(), Some(200))
        } else {
            TransportResult::failed(method, stub.error.clone(), None)
        }
    }
}

#[async_trait]
impl Provider for HttpProvider {
    fn connection_state(&self) -> ConnectionState {
        ConnectionState::Connected
    }

    async fn connect(&self) -> ConnectionResult {
        ConnectionResult::connected()
    }

    async fn disconnect(&self) {}

    fn is_contract_supported(&self, contract: &Contract) -> bool {
        self.endpoints.contains_key(&contract.method_name())
    }

    async fn execute(&self, call: &CallContext) -> TransportResult {
        let Some(endpoint) = self.endpoints.get(&call.method) else {
            return TransportResult::unsupported(call.method.clone());
        };

        if self.debug_mode || endpoint.debug {
            debug!(
                target: PROVIDER_TARGET,
                method = %call.method,
                "debug mode, returning stub"
            );
            return Self::stub_result(&call.method, &endpoint.stub);
        }

        let token = self.token.read().clone();
        let request = match build_request(
            &call.contract,
            endpoint,
            self.base_url.as_ref(),
            &token,
        ) {
            Ok(request) => request,
            Err(error) => {
                return TransportResult::failed(call.method.clone(), error.to_string(), None);
            }
        };

        debug!(
            target: PROVIDER_TARGET,
            method = %call.method,
            url = %request.url,
            "executing request"
        );
        self.engine.execute(&call.method, &request).await
    }
}

/// Attempt sender backed by `reqwest`.
struct HttpSender {
    client: reqwest::Client,
}

#[async_trait]
impl RequestSender for HttpSender {
    async fn send(
        &self,
        request: &PreparedRequest,
        timeout: Duration,
    ) -> Result<SenderResponse, String> {
        let mut builder = match request.method {
            courier_config::RequestMethod::Get => self.client.get(request.url.clone()),
            courier_config::RequestMethod::Post => self.client.post(request.url.clone()),
            courier_config::RequestMethod::Patch => self.client.patch(request.url.clone()),
        }
        .timeout(timeout);

        if !request.token.is_empty() {
            builder = builder.bearer_auth(&request.token);
        }
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|error| error.to_string())?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|error| error.to_string())?;
        Ok(SenderResponse { status, body })
    }
}
