//! Configuration surface for the Courier dispatch layer.
//!
//! Configuration is plain data loaded once at process start from a TOML
//! file, with a small set of environment-variable overrides applied on top.
//! The dispatch core and the transport crates consume the resolved values;
//! nothing in this crate performs I/O after loading.
//!
//! ## Layout
//!
//! ```toml
//! default_provider = 1
//!
//! [log]
//! filter = "info"
//! format = "compact"
//!
//! [http]
//! base_url = "https://api.example.test/"
//! auth_token = "secret"
//! request_retry = 3
//! timeout_secs = 30
//! request_timeout_secs = 10
//!
//! [[http.endpoints]]
//! contract = "GetPing"
//! path = "api/ping"
//! method = "get"
//! ```

mod defaults;
mod endpoint;
mod http;
mod logging;

use std::env;
use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

pub use defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_REQUEST_RETRY, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_TIMEOUT_SECS,
};
pub use endpoint::{EndpointConfig, RequestMethod, StubResult};
pub use http::HttpSettings;
pub use logging::{LogFormat, LogSettings};

/// Environment variable overriding the HTTP base URL.
pub const ENV_BASE_URL: &str = "COURIER_BASE_URL";
/// Environment variable overriding the HTTP auth token.
pub const ENV_AUTH_TOKEN: &str = "COURIER_AUTH_TOKEN";
/// Environment variable overriding the log filter expression.
pub const ENV_LOG_FILTER: &str = "COURIER_LOG_FILTER";

/// Resolved configuration consumed by the dispatch service and transports.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Identifier of the provider used when resolution has no better match.
    #[serde(default)]
    pub default_provider: u32,
    /// Structured logging settings.
    #[serde(default)]
    pub log: LogSettings,
    /// HTTP transport settings, including the per-contract endpoint map.
    #[serde(default)]
    pub http: HttpSettings,
}

impl Config {
    /// Loads configuration from a TOML file and applies environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the file cannot be read, does not
    /// parse, or an override value is malformed.
    pub fn load(path: impl AsRef<Utf8Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&raw)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Parses configuration from TOML text without touching the filesystem.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the document does not match the
    /// configuration schema.
    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(ConfigError::from)
    }

    /// Applies environment-variable overrides onto the loaded values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOverride`] when an override value does
    /// not parse (currently only the base URL).
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(value) = env::var(ENV_BASE_URL) {
            let url = Url::parse(&value).map_err(|source| ConfigError::InvalidOverride {
                variable: ENV_BASE_URL,
                message: source.to_string(),
            })?;
            self.http.base_url = Some(url);
        }
        if let Ok(value) = env::var(ENV_AUTH_TOKEN) {
            self.http.auth_token = value;
        }
        if let Ok(value) = env::var(ENV_LOG_FILTER) {
            self.log.filter = value;
        }
        Ok(())
    }
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The settings file could not be read.
    #[error("failed to read configuration file '{path}': {source}")]
    Read {
        /// Path of the unreadable file.
        path: Utf8PathBuf,
        /// Underlying filesystem error.
        #[source]
        source: std::io::Error,
    },
    /// The settings document did not match the schema.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    /// An environment override carried a malformed value.
    #[error("invalid value in {variable}: {message}")]
    InvalidOverride {
        /// Name of the offending variable.
        variable: &'static str,
        /// Parse failure detail.
        message: String,
    },
}
