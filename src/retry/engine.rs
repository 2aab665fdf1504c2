//! # Retry engine for fallible remote operations.
//!
//! [`retry_with_backoff`] wraps a zero-argument async operation and re-invokes
//! it on transient failure, sleeping between attempts per [`BackoffPolicy`].
//!
//! ## Loop shape
//! ```text
//! loop {
//!   ├─► operation()
//!   │       ├─ Ok  ──► return immediately (no delay, ever)
//!   │       └─ Err ──► is_retryable()?
//!   │             ├─ no, or budget spent ──► return the error unchanged
//!   │             └─ yes ──► sleep(backoff.delay_for(attempt)), attempt += 1
//! }
//! ```
//!
//! ## Rules
//! - A fatal error is returned after exactly one invocation, regardless of
//!   the remaining attempt budget.
//! - The error the caller receives is the last one the operation produced —
//!   never rewrapped, so its classification survives for downstream handling.
//! - The engine owns no shared state; the sleep suspends only the calling
//!   task, and registry locks are never held across it.

use std::future::Future;

use tokio::time;
use tracing::debug;

use crate::error::RemoteError;
use crate::retry::backoff::BackoffPolicy;

/// Attempt budget plus backoff parameters for one class of remote call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total invocation budget (first try included). Treated as at least 1.
    pub max_attempts: u32,
    /// Delay schedule between retryable failures.
    pub backoff: BackoffPolicy,
}

impl Default for RetryPolicy {
    /// Returns a policy with 3 attempts and the default backoff
    /// (1 s base, 30 s cap).
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: BackoffPolicy::default(),
        }
    }
}

/// Invokes `operation` until it succeeds, fails fatally, or the attempt
/// budget runs out.
///
/// On success the value is returned immediately — even the first attempt
/// incurs no delay. On failure the error's own
/// [`is_retryable`](RemoteError::is_retryable) classification decides whether
/// another attempt is scheduled; fatal errors short-circuit regardless of the
/// remaining budget. Whatever error the final attempt produced is returned
/// unchanged.
///
/// # Example
/// ```no_run
/// use taskreg::{retry_with_backoff, RemoteError, RetryPolicy};
///
/// # async fn call_remote() -> Result<String, RemoteError> { Ok(String::new()) }
/// # async fn demo() -> Result<(), RemoteError> {
/// let snapshot = retry_with_backoff(|| call_remote(), &RetryPolicy::default()).await?;
/// # Ok(())
/// # }
/// ```
pub async fn retry_with_backoff<T, F, Fut>(
    mut operation: F,
    policy: &RetryPolicy,
) -> Result<T, RemoteError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RemoteError>>,
{
    let budget = policy.max_attempts.max(1);
    let mut attempt: u32 = 0;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !err.is_retryable() || attempt + 1 >= budget {
                    return Err(err);
                }

                let delay = policy.backoff.delay_for(attempt);
                debug!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = err.as_label(),
                    "retry scheduled"
                );
                time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
