//! # Global registry configuration.
//!
//! Provides [`Config`] centralized settings for the task registry and the
//! retry layer.
//!
//! Config is used in two ways:
//! 1. **Registry creation**: `TaskRegistry::new(config)`
//! 2. **Retry defaults**: `config.retry` is handed to `retry_with_backoff`
//!    by callers that do not need per-call overrides.
//!
//! ## Ranges
//! Out-of-range values are not rejected at construction; the clamping
//! accessors bring them into range at the point of use so that a
//! hand-assembled config can never produce a zero-interval sweeper or an
//! unbounded running-task ceiling.

use std::time::Duration;

use crate::retry::RetryPolicy;

/// Bounds for [`Config::max_concurrent`].
const MAX_CONCURRENT_RANGE: (usize, usize) = (1, 100);
/// Bounds for [`Config::task_timeout`] (60 s to 24 h).
const TASK_TIMEOUT_RANGE: (Duration, Duration) =
    (Duration::from_secs(60), Duration::from_secs(86_400));
/// Bounds for [`Config::cleanup_interval`] (10 s to 1 h).
const CLEANUP_INTERVAL_RANGE: (Duration, Duration) =
    (Duration::from_secs(10), Duration::from_secs(3_600));

/// Global configuration for the task registry.
///
/// Defines:
/// - **Concurrency limit**: how many tasks may be `Running` simultaneously
/// - **Task deadline**: default timeout applied to tasks created without one
/// - **Sweeper cadence**: how often overdue tasks are expired and stale
///   terminal entries evicted
/// - **Retry defaults**: attempt budget and backoff parameters for remote calls
///
/// ## Field semantics
/// - `max_concurrent`: running-task ceiling, clamped to 1–100
/// - `task_timeout`: default per-task deadline measured from creation,
///   clamped to 60 s–24 h
/// - `cleanup_interval`: sweep period, clamped to 10 s–1 h; terminal entries
///   are retained for a small multiple of this before eviction
/// - `retry`: default [`RetryPolicy`] for remote calls
///
/// All fields are public for flexibility. Prefer the clamping accessors over
/// reading fields directly when a range guarantee matters.
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum number of tasks in `Running` status at once.
    pub max_concurrent: usize,

    /// Default deadline for tasks created without an explicit timeout.
    ///
    /// Measured from the task's creation time; fixed per task at creation.
    pub task_timeout: Duration,

    /// Period between sweeps of the timeout/eviction loop.
    pub cleanup_interval: Duration,

    /// Default retry policy for remote calls.
    pub retry: RetryPolicy,
}

impl Config {
    /// Returns the running-task ceiling clamped to its valid range (1–100).
    #[inline]
    pub fn max_concurrent_clamped(&self) -> usize {
        self.max_concurrent
            .clamp(MAX_CONCURRENT_RANGE.0, MAX_CONCURRENT_RANGE.1)
    }

    /// Returns the default task timeout clamped to its valid range (60 s–24 h).
    #[inline]
    pub fn task_timeout_clamped(&self) -> Duration {
        self.task_timeout
            .clamp(TASK_TIMEOUT_RANGE.0, TASK_TIMEOUT_RANGE.1)
    }

    /// Returns the sweep period clamped to its valid range (10 s–1 h).
    #[inline]
    pub fn cleanup_interval_clamped(&self) -> Duration {
        self.cleanup_interval
            .clamp(CLEANUP_INTERVAL_RANGE.0, CLEANUP_INTERVAL_RANGE.1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `max_concurrent = 10`
    /// - `task_timeout = 1 h`
    /// - `cleanup_interval = 5 min`
    /// - `retry = RetryPolicy::default()` (3 attempts, 1 s base, 30 s cap)
    fn default() -> Self {
        Self {
            max_concurrent: 10,
            task_timeout: Duration::from_secs(3_600),
            cleanup_interval: Duration::from_secs(300),
            retry: RetryPolicy::default(),
        }
    }
}
