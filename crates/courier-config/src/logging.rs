//! Structured logging settings.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::defaults::default_log_filter;

/// Supported logging output formats.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// Structured JSON suitable for ingestion by logging stacks.
    #[default]
    Json,
    /// Human-readable single line output.
    Compact,
}

/// Telemetry settings consumed at service initialisation.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LogSettings {
    /// Filter expression in `tracing-subscriber` env-filter syntax.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            format: LogFormat::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn parses_formats_case_insensitively() {
        assert_eq!(LogFormat::from_str("json").expect("json"), LogFormat::Json);
        assert_eq!(
            LogFormat::from_str("Compact").expect("compact"),
            LogFormat::Compact
        );
        assert!(LogFormat::from_str("verbose").is_err());
    }
}
