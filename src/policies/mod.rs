//! Delivery policies.
//!
//! This module groups the knobs that control **how often** and **how patiently**
//! the dispatcher retries, and **what it gives up** when the failure queue fills.
//!
//! ## Contents
//! - [`RetryPolicy`]    retries, exponential base, cap
//! - [`JitterPolicy`]   randomization strategy to avoid synchronized retries
//! - [`EvictionPolicy`] which entry the failure queue drops when full
//!
//! ## Quick wiring
//! ```text
//! DispatchConfig { retry: RetryPolicy, queue_capacity, eviction: EvictionPolicy, .. }
//!      └─► Dispatcher uses:
//!           - retry.allows_retry(attempt) to continue or give up
//!           - retry.delay(attempt) to sleep before the next attempt
//!           - eviction when pushing onto a full FailureQueue
//! ```
//!
//! ## Defaults
//! - `RetryPolicy::default()` → 3 retries, 1s base, ×2, 10s cap, additive jitter up to 1s.
//! - `JitterPolicy::None` by default when built by hand.
//! - `EvictionPolicy::DropOldest`.

mod eviction;
mod jitter;
mod retry;

pub use eviction::EvictionPolicy;
pub use jitter::JitterPolicy;
pub use retry::RetryPolicy;
