//! HTTP transport settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::defaults::{
    default_request_retry, default_request_timeout_secs, default_timeout_secs,
};
use crate::endpoint::EndpointConfig;

/// Settings consumed by the HTTP provider and its execution engine.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct HttpSettings {
    /// Base URL applied to endpoints without their own.
    #[serde(default)]
    pub base_url: Option<Url>,
    /// Bearer token attached to every request until replaced at runtime.
    #[serde(default)]
    pub auth_token: String,
    /// Retries granted after a failed attempt; the first attempt is free.
    #[serde(default = "default_request_retry")]
    pub request_retry: u32,
    /// Overall wall-clock bound for one call across all attempts, in
    /// seconds. Zero disables the bound.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Per-attempt request timeout, in seconds. Zero selects the default.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// When set, every endpoint runs in debug mode regardless of its own
    /// flag.
    #[serde(default)]
    pub debug_mode: bool,
    /// Per-contract endpoint declarations.
    #[serde(default)]
    pub endpoints: Vec<EndpointConfig>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            auth_token: String::new(),
            request_retry: default_request_retry(),
            timeout_secs: default_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            debug_mode: false,
            endpoints: Vec::new(),
        }
    }
}

impl HttpSettings {
    /// Overall timeout for one call, or `None` when disabled.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    /// Per-attempt request timeout, falling back to the default when unset.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        let secs = if self.request_timeout_secs > 0 {
            self.request_timeout_secs
        } else {
            crate::defaults::DEFAULT_REQUEST_TIMEOUT_SECS
        };
        Duration::from_secs(secs)
    }
}
