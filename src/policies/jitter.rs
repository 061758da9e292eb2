//! # Jitter policy for retry delays.
//!
//! [`JitterPolicy`] adds randomness to backoff delays so that several
//! dispatchers recovering from the same outage do not retry in lockstep.
//!
//! - [`JitterPolicy::None`]: no randomization, predictable delays
//! - [`JitterPolicy::Additive`]: delay + random[0, max] (default for delivery)
//! - [`JitterPolicy::Full`]: random delay in [0, delay]
//! - [`JitterPolicy::Equal`]: delay/2 + random[0, delay/2]

use rand::Rng;
use std::time::Duration;

/// Policy controlling randomization of retry delays.
///
/// ## Trade-offs
/// - **None**: Predictable, but risks synchronized retry storms
/// - **Additive**: Never shortens the exponential base
/// - **Full**: Maximum spread, can retry almost immediately
/// - **Equal**: Keeps at least half of the base
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum JitterPolicy {
    /// No jitter: use exact backoff delay.
    ///
    /// Use for tests and single-instance deployments.
    #[default]
    None,

    /// Additive jitter: delay + random[0, max].
    Additive {
        /// Upper bound of the random addition.
        max: Duration,
    },

    /// Full jitter: random delay in [0, delay].
    Full,

    /// Equal jitter: delay/2 + random[0, delay/2].
    Equal,
}

impl JitterPolicy {
    /// Applies jitter to the given delay.
    pub fn apply(&self, delay: Duration) -> Duration {
        match self {
            JitterPolicy::None => delay,
            JitterPolicy::Additive { max } => delay.saturating_add(random_up_to(*max)),
            JitterPolicy::Full => random_up_to(delay),
            JitterPolicy::Equal => {
                let half = delay / 2;
                half + random_up_to(half)
            }
        }
    }
}

/// Uniform random duration in [0, upper], millisecond resolution.
fn random_up_to(upper: Duration) -> Duration {
    let ms = upper.as_millis().min(u128::from(u64::MAX)) as u64;
    if ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::rng().random_range(0..=ms))
}
