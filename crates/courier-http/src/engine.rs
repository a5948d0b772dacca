//! Bounded retry/timeout execution loop.
//!
//! The engine owns the resilience policy of HTTP execution: an attempt
//! that fails is retried until the retry budget is spent, but the
//! overall wall-clock bound is checked after *every* attempt, so a single
//! long-hanging attempt can exhaust the timeout before any retry occurs.
//! The attempt itself sits behind [`RequestSender`] so the loop is testable
//! without a network.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::debug;

use courier_contracts::TransportResult;

use crate::request::PreparedRequest;

const ENGINE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::engine");

/// One transport attempt, isolated from the retry policy.
#[async_trait]
pub(crate) trait RequestSender: Send + Sync {
    /// Performs a single attempt bounded by `timeout`.
    async fn send(
        &self,
        request: &PreparedRequest,
        timeout: Duration,
    ) -> Result<SenderResponse, String>;
}

/// Raw response of a completed attempt.
#[derive(Debug, Clone)]
pub(crate) struct SenderResponse {
    /// Protocol status code.
    pub status: u16,
    /// Response body text.
    pub body: String,
}

impl SenderResponse {
    fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Retry/timeout policy applied around a [`RequestSender`].
pub(crate) struct ExecutionEngine<S> {
    sender: S,
    retry_limit: u32,
    overall_timeout: Option<Duration>,
    attempt_timeout: Duration,
}

impl<S: RequestSender> ExecutionEngine<S> {
    pub(crate) fn new(
        sender: S,
        retry_limit: u32,
        overall_timeout: Option<Duration>,
        attempt_timeout: Duration,
    ) -> Self {
        Self {
            sender,
            retry_limit,
            overall_timeout,
            attempt_timeout,
        }
    }

    /// Executes one call, retrying failed attempts within the overall bound.
    ///
    /// On timeout the result is annotated with the attempt count and the
    /// elapsed wall-clock time; once the retry budget is spent the last
    /// failure is returned unchanged.
    pub(crate) async fn execute(&self, method: &str, request: &PreparedRequest) -> TransportResult {
        let started = Instant::now();
        let mut attempts: u32 = 0;
        let mut retries: u32 = 0;

        loop {
            attempts += 1;
            let last = match self.sender.send(request, self.attempt_timeout).await {
                Ok(response) if response.is_success() => {
                    debug!(
                        target: ENGINE_TARGET,
                        method,
                        attempts,
                        status = response.status,
                        "request succeeded"
                    );
                    return TransportResult::ok(method, response.body, Some(response.status));
                }
                Ok(response) => TransportResult::failed(
                    method,
                    format!("request failed with status {}", response.status),
                    Some(response.status),
                ),
                Err(message) => TransportResult::failed(method, message, None),
            };

            let elapsed = started.elapsed();
            if let Some(bound) = self.overall_timeout
                && elapsed > bound
            {
                debug!(
                    target: ENGINE_TARGET,
                    method,
                    attempts,
                    ?elapsed,
                    "request timed out"
                );
                return TransportResult::timeout(method, attempts, elapsed);
            }

            retries += 1;
            if retries > self.retry_limit {
                debug!(target: ENGINE_TARGET, method, attempts, "retry budget spent");
                return last;
            }
        }
    }
}
