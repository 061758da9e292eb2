//! # Retry policy for telemetry delivery.
//!
//! [`RetryPolicy`] controls how many times a failed delivery is retried and how
//! long the dispatcher waits before each retry. It is parameterized by:
//! - [`RetryPolicy::max_retries`] retries after the initial attempt;
//! - [`RetryPolicy::base_delay`] the delay before the first retry;
//! - [`RetryPolicy::backoff_multiplier`] the multiplicative growth factor;
//! - [`RetryPolicy::max_delay`] the cap applied after jitter.
//!
//! The delay before retry `n + 1` (attempt `n` just failed, 0-indexed) is
//! `min(base_delay × multiplier^n + jitter, max_delay)`. The base is derived
//! purely from the attempt number, so jitter never feeds back into later delays.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use pulsebus::{JitterPolicy, RetryPolicy};
//!
//! let policy = RetryPolicy {
//!     max_retries: 3,
//!     base_delay: Duration::from_millis(1000),
//!     max_delay: Duration::from_millis(10_000),
//!     backoff_multiplier: 2.0,
//!     jitter: JitterPolicy::None,
//! };
//!
//! assert_eq!(policy.delay(0), Duration::from_millis(1000));
//! assert_eq!(policy.delay(1), Duration::from_millis(2000));
//! assert_eq!(policy.delay(2), Duration::from_millis(4000));
//! assert_eq!(policy.delay(10), Duration::from_millis(10_000));
//! assert!(policy.allows_retry(2));
//! assert!(!policy.allows_retry(3));
//! ```

use std::time::Duration;

use crate::policies::jitter::JitterPolicy;

/// Delivery retry policy. Immutable value object; copy it to override per call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the initial attempt (`0` = deliver once).
    pub max_retries: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Upper bound on any single delay, jitter included.
    pub max_delay: Duration,
    /// Multiplicative growth factor (`>= 1.0` recommended).
    pub backoff_multiplier: f64,
    /// Randomization added on top of the exponential base.
    pub jitter: JitterPolicy,
}

impl Default for RetryPolicy {
    /// Returns a policy with:
    /// - `max_retries = 3`;
    /// - `base_delay = 1s`, `backoff_multiplier = 2.0`;
    /// - `max_delay = 10s`;
    /// - `jitter = Additive { max: 1s }`.
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(10_000),
            backoff_multiplier: 2.0,
            jitter: JitterPolicy::Additive {
                max: Duration::from_millis(1000),
            },
        }
    }
}

impl RetryPolicy {
    /// Returns a copy with a different jitter policy.
    pub fn with_jitter(mut self, jitter: JitterPolicy) -> Self {
        self.jitter = jitter;
        self
    }

    /// Returns true if a retry may follow the failed attempt `attempt` (0-indexed).
    #[inline]
    pub fn allows_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }

    /// Exponential base for `attempt`, clamped to [`RetryPolicy::max_delay`].
    ///
    /// # Notes
    /// - If `backoff_multiplier` is less than 1.0, delays shrink (not typical).
    /// - Overflow and non-finite values clamp to `max_delay`.
    pub fn base(&self, attempt: u32) -> Duration {
        let max_secs = self.max_delay.as_secs_f64();
        let exp = attempt.min(i32::MAX as u32) as i32;
        let secs = self.base_delay.as_secs_f64() * self.backoff_multiplier.powi(exp);

        if !secs.is_finite() || secs < 0.0 || secs > max_secs {
            self.max_delay
        } else {
            Duration::from_secs_f64(secs)
        }
    }

    /// Delay to wait after the failed attempt `attempt`, jitter applied and capped.
    pub fn delay(&self, attempt: u32) -> Duration {
        self.jitter.apply(self.base(attempt)).min(self.max_delay)
    }
}
