//! Default values shared between the schema and its serde hooks.

/// Default log filter expression.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default number of retries after a failed transport attempt.
pub const DEFAULT_REQUEST_RETRY: u32 = 3;

/// Default overall timeout for one dispatch call, in seconds. Zero disables
/// the overall bound.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default per-attempt request timeout, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

pub(crate) fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

pub(crate) fn default_request_retry() -> u32 {
    DEFAULT_REQUEST_RETRY
}

pub(crate) fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

pub(crate) fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}
