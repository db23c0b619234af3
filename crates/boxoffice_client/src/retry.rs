//! Generic retry execution with exponential backoff.

use crate::classify::{classify, should_retry};
use crate::config::RetryPolicy;
use crate::error::{SyncError, SyncResult};
use boxoffice_store::StoreError;
use chrono::Utc;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error};

/// Observes the lifecycle of one retried operation.
///
/// Default implementations log through `tracing`; implement the trait to
/// surface retry progress to the UI instead.
pub trait RetryObserver: Send + Sync {
    /// Called after a transient failure, before suspending for `delay`.
    fn on_retry(&self, attempt: u32, delay: Duration) {
        debug!(
            attempt,
            delay_ms = delay.as_millis() as u64,
            "transient failure, retrying"
        );
    }

    /// Called once when the operation succeeds.
    fn on_success(&self) {}

    /// Called once with the terminal error.
    fn on_error(&self, error: &SyncError) {
        error!(
            code = %error.code,
            path = error.path.as_deref().unwrap_or("-"),
            retries = error.retry_count,
            "operation failed terminally: {}",
            error.message
        );
    }
}

/// The default observer: logs and nothing else.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl RetryObserver for LogObserver {}

/// Runs `operation`, retrying classified-transient failures per `policy`.
///
/// Attempts are strictly sequential: attempt *n+1* never starts before
/// attempt *n* resolves. Suspension between attempts is a non-blocking
/// timed wait, so unrelated operations on the same runtime proceed.
///
/// There is no cancellation token; abandoning the returned future
/// abandons the loop.
pub async fn execute_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    path: Option<&str>,
    observer: &dyn RetryObserver,
    mut operation: F,
) -> SyncResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => {
                observer.on_success();
                return Ok(value);
            }
            Err(source) => {
                let code = classify(&source);
                if !should_retry(code, attempt, policy.max_retries) {
                    let mut terminal = SyncError::new(code, source.message);
                    terminal.timestamp = Utc::now();
                    terminal.retry_count = attempt;
                    terminal.path = source.path.or_else(|| path.map(String::from));
                    observer.on_error(&terminal);
                    return Err(terminal);
                }

                let delay = policy.delay_for_attempt(attempt);
                observer.on_retry(attempt, delay);
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
