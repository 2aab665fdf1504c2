//! # Retry layer for remote calls.
//!
//! This module provides the pieces that tolerate transient remote failures:
//! - [`backoff`]: exponential delay schedule with additive jitter;
//! - [`engine`]: the retry loop driving a fallible async operation.
//!
//! Failure classification lives on
//! [`RemoteError`](crate::RemoteError) itself; the engine only asks
//! `is_retryable()`.

mod backoff;
mod engine;

pub use backoff::BackoffPolicy;
pub use engine::{retry_with_backoff, RetryPolicy};
