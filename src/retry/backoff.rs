//! # Backoff policy for retrying remote calls.
//!
//! [`BackoffPolicy`] controls how retry delays grow after repeated transient
//! failures. It is parameterized by:
//! - [`BackoffPolicy::base`] the delay before the first retry;
//! - [`BackoffPolicy::max`] the maximum delay cap.
//!
//! The delay for attempt `n` is `base × 2^n` plus additive jitter, capped at
//! `max`. Because the base delay is derived purely from the attempt number,
//! jitter output never feeds back into subsequent calculations.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use taskreg::BackoffPolicy;
//!
//! let backoff = BackoffPolicy {
//!     base: Duration::from_millis(1000),
//!     max: Duration::from_secs(10),
//! };
//!
//! // Attempt 0 — 1000ms plus up to 20% jitter
//! let d = backoff.delay_for(0);
//! assert!(d >= Duration::from_millis(1000) && d < Duration::from_millis(1200));
//!
//! // Attempt 10 — 1000ms × 2^10 blows past the cap
//! assert_eq!(backoff.delay_for(10), Duration::from_secs(10));
//! ```

use std::time::Duration;

use rand::Rng;

/// Retry backoff policy: exponential growth with additive jitter.
///
/// The jitter is 20% of the raw exponential delay, added on top — the
/// pre-cap delay for attempt `n` lies in `[base·2ⁿ, 1.2·base·2ⁿ)`. Spreading
/// delays upward (never below the raw value) keeps retries from synchronizing
/// across callers without ever retrying early.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Delay before the first retry (attempt 0).
    pub base: Duration,
    /// Maximum delay cap for retries.
    pub max: Duration,
}

impl Default for BackoffPolicy {
    /// Returns a policy with `base = 1s` and `max = 30s`.
    fn default() -> Self {
        Self {
            base: Duration::from_secs(1),
            max: Duration::from_secs(30),
        }
    }
}

impl BackoffPolicy {
    /// Computes the delay for the given attempt number (0-indexed).
    ///
    /// - `raw = base × 2^attempt`, evaluated in `f64` so huge attempt numbers
    ///   saturate cleanly instead of overflowing into zero or negative delays;
    /// - once `raw` alone reaches [`BackoffPolicy::max`], the result is
    ///   exactly `max` (no jitter on top of the cap);
    /// - otherwise additive jitter in `[0, 0.2·raw)` is applied and the sum is
    ///   capped at `max`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base_ms = self.base.as_millis() as u64;
        let max_ms = self.max.as_millis() as u64;

        let exp = attempt.min(i32::MAX as u32) as i32;
        let raw = base_ms as f64 * 2f64.powi(exp);
        if !raw.is_finite() || raw >= max_ms as f64 {
            return self.max;
        }

        let raw = raw as u64;
        let jitter_bound = raw / 5;
        let jitter = if jitter_bound == 0 {
            0
        } else {
            rand::rng().random_range(0..jitter_bound)
        };

        Duration::from_millis((raw + jitter).min(max_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(base_ms: u64, max_ms: u64) -> BackoffPolicy {
        BackoffPolicy {
            base: Duration::from_millis(base_ms),
            max: Duration::from_millis(max_ms),
        }
    }

    #[test]
    fn attempt_zero_within_jitter_band() {
        let p = policy(1000, 10_000);
        for _ in 0..100 {
            let d = p.delay_for(0);
            assert!(
                d >= Duration::from_millis(1000) && d < Duration::from_millis(1200),
                "delay {d:?} outside [1000ms, 1200ms)"
            );
        }
    }

    #[test]
    fn attempt_one_doubles_the_band() {
        let p = policy(1000, 10_000);
        for _ in 0..100 {
            let d = p.delay_for(1);
            assert!(
                d >= Duration::from_millis(2000) && d < Duration::from_millis(2400),
                "delay {d:?} outside [2000ms, 2400ms)"
            );
        }
    }

    #[test]
    fn capped_at_max() {
        let p = policy(1000, 60_000);
        assert!(p.delay_for(10) <= Duration::from_millis(60_000));
    }

    #[test]
    fn raw_past_cap_returns_exactly_max() {
        let p = policy(1000, 10_000);
        // 1000 × 2^4 = 16000 >= 10000
        for _ in 0..20 {
            assert_eq!(p.delay_for(4), Duration::from_millis(10_000));
        }
    }

    #[test]
    fn huge_attempt_stays_at_max() {
        let p = policy(100, 30_000);
        assert_eq!(p.delay_for(100), Duration::from_millis(30_000));
        assert_eq!(p.delay_for(u32::MAX), Duration::from_millis(30_000));
    }

    #[test]
    fn tiny_base_never_yields_zero_band_panic() {
        // jitter bound of 0 (base < 5ms) simply skips jitter
        let p = policy(1, 1000);
        assert_eq!(p.delay_for(0), Duration::from_millis(1));
        assert_eq!(p.delay_for(1), Duration::from_millis(2));
    }

    #[test]
    fn delays_never_shrink_below_raw() {
        let p = policy(500, 60_000);
        for attempt in 0..6 {
            let raw = 500u64 << attempt;
            for _ in 0..50 {
                assert!(
                    p.delay_for(attempt) >= Duration::from_millis(raw),
                    "attempt {attempt}: delay below raw {raw}ms"
                );
            }
        }
    }
}
