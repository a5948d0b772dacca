//! Per-contract endpoint declarations for the HTTP transport.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use url::Url;

/// HTTP request method an endpoint is executed with.
///
/// The method also selects payload serialization: GET flattens the payload
/// into query parameters, POST and PATCH send a JSON body.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum RequestMethod {
    /// Query-parameter request.
    #[default]
    Get,
    /// JSON-body request.
    Post,
    /// JSON-body request.
    Patch,
}

/// Preconfigured result returned when an endpoint runs in debug mode.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct StubResult {
    /// Whether the stubbed call reports success.
    #[serde(default)]
    pub success: bool,
    /// Raw payload handed back on success.
    #[serde(default)]
    pub result: String,
    /// Error message handed back on failure.
    #[serde(default)]
    pub error: String,
}

/// Declaration mapping one contract onto an HTTP endpoint.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct EndpointConfig {
    /// Method name of the contract this endpoint serves.
    pub contract: String,
    /// Base URL override; the provider default applies when absent.
    #[serde(default)]
    pub url: Option<Url>,
    /// Path template joined onto the base URL. `{field}` placeholders are
    /// substituted from the contract payload.
    #[serde(default)]
    pub path: String,
    /// Request method, selecting the payload serialization.
    #[serde(default)]
    pub method: RequestMethod,
    /// When set, the transport call is skipped and [`EndpointConfig::stub`]
    /// is returned synchronously.
    #[serde(default)]
    pub debug: bool,
    /// Stub returned in debug mode.
    #[serde(default)]
    pub stub: StubResult,
}

impl EndpointConfig {
    /// Builds a minimal endpoint declaration for a contract and path.
    #[must_use]
    pub fn new(contract: impl Into<String>, path: impl Into<String>, method: RequestMethod) -> Self {
        Self {
            contract: contract.into(),
            url: None,
            path: path.into(),
            method,
            debug: false,
            stub: StubResult::default(),
        }
    }

    /// Switches the endpoint into debug mode with the given stub.
    #[must_use]
    pub fn with_stub(mut self, stub: StubResult) -> Self {
        self.debug = true;
        self.stub = stub;
        self
    }
}
