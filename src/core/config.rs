//! # Runtime configuration.
//!
//! Provides [`Config`], centralized settings for the two buses and the dispatcher.
//!
//! Config is used in two ways:
//! 1. **Runtime creation**: `Runtime::builder(config)`
//! 2. **Standalone parts**: `EventBus::new(name, cfg.ui)`, `Dispatcher::new(sink, cfg.dispatch)`
//!
//! ## Sentinel values
//! - `listener_timeout = 0s` → no per-listener timeout
//! - `slow_threshold = 0s` → slow fan-out warning disabled
//! - `sink_timeout = 0s` → no request timeout on the HTTP sink
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use pulsebus::{Config, EvictionPolicy};
//!
//! let mut cfg = Config::default();
//! cfg.dispatch.queue_capacity = 250;
//! cfg.dispatch.eviction = EvictionPolicy::DropNewest;
//! cfg.ui.listener_timeout = Duration::from_secs(2);
//!
//! assert_eq!(cfg.ui.listener_timeout(), Some(Duration::from_secs(2)));
//! assert_eq!(cfg.app.history_capacity, 500);
//! ```

use std::time::Duration;

use crate::policies::{EvictionPolicy, RetryPolicy};

/// Settings for one [`EventBus`](crate::EventBus).
///
/// ## Field semantics
/// - `history_capacity`: audit ring buffer size (min 1; clamped)
/// - `slow_threshold`: fan-out duration above which a warning is logged (`0s` = off)
/// - `listener_timeout`: per-listener time limit (`0s` = wait indefinitely)
#[derive(Clone, Debug, PartialEq)]
pub struct BusConfig {
    /// Capacity of the history ring buffer.
    pub history_capacity: usize,
    /// Soft limit on fan-out duration; exceeding it only logs a warning.
    pub slow_threshold: Duration,
    /// Time limit for a single listener invocation.
    ///
    /// A listener that exceeds it is reported like a failed listener.
    pub listener_timeout: Duration,
}

impl BusConfig {
    /// Configuration of the UI/component bus (history 1000, 16ms slow threshold).
    pub fn ui() -> Self {
        Self {
            history_capacity: 1000,
            slow_threshold: Duration::from_millis(16),
            listener_timeout: Duration::ZERO,
        }
    }

    /// Configuration of the application/domain bus (history 500, 50ms slow threshold).
    pub fn app() -> Self {
        Self {
            history_capacity: 500,
            slow_threshold: Duration::from_millis(50),
            listener_timeout: Duration::ZERO,
        }
    }

    /// Returns the per-listener timeout as an `Option`.
    ///
    /// - `None` → no timeout
    /// - `Some(d)` → applied to each listener invocation
    #[inline]
    pub fn listener_timeout(&self) -> Option<Duration> {
        if self.listener_timeout == Duration::ZERO {
            None
        } else {
            Some(self.listener_timeout)
        }
    }

    /// Returns a history capacity clamped to a minimum of 1.
    #[inline]
    pub fn history_capacity_clamped(&self) -> usize {
        self.history_capacity.max(1)
    }
}

impl Default for BusConfig {
    /// Same as [`BusConfig::app`].
    fn default() -> Self {
        Self::app()
    }
}

/// Settings for the [`Dispatcher`](crate::Dispatcher).
///
/// ## Field semantics
/// - `retry`: default retry policy (can be overridden per call)
/// - `queue_capacity`: failure queue cap (min 1; clamped)
/// - `eviction`: what to drop when the failure queue is full
/// - `health_threshold`: queue depth at which the dispatcher reports unhealthy
/// - `sink_timeout`: request timeout for network sinks (`0s` = none)
#[derive(Clone, Debug, PartialEq)]
pub struct DispatchConfig {
    /// Default retry policy.
    pub retry: RetryPolicy,
    /// Maximum number of queued failed deliveries.
    pub queue_capacity: usize,
    /// Eviction policy for a full failure queue.
    pub eviction: EvictionPolicy,
    /// `healthy = queue_depth < health_threshold`.
    pub health_threshold: usize,
    /// Request timeout applied by network sinks.
    pub sink_timeout: Duration,
}

impl DispatchConfig {
    /// Returns a queue capacity clamped to a minimum of 1.
    #[inline]
    pub fn queue_capacity_clamped(&self) -> usize {
        self.queue_capacity.max(1)
    }

    /// Returns the sink request timeout as an `Option`.
    #[inline]
    pub fn sink_timeout(&self) -> Option<Duration> {
        if self.sink_timeout == Duration::ZERO {
            None
        } else {
            Some(self.sink_timeout)
        }
    }
}

impl Default for DispatchConfig {
    /// Default configuration:
    ///
    /// - `retry = RetryPolicy::default()` (3 retries, 1s → 10s)
    /// - `queue_capacity = 100`
    /// - `eviction = DropOldest`
    /// - `health_threshold = 10`
    /// - `sink_timeout = 5s`
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            queue_capacity: 100,
            eviction: EvictionPolicy::default(),
            health_threshold: 10,
            sink_timeout: Duration::from_secs(5),
        }
    }
}

/// Global configuration for the runtime.
///
/// ## Notes
/// All fields are public for flexibility. Prefer the helper accessors to avoid
/// sprinkling sentinel checks (`0`) across the codebase.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// UI/component-level bus.
    pub ui: BusConfig,
    /// Application/domain-level bus.
    pub app: BusConfig,
    /// Telemetry dispatcher.
    pub dispatch: DispatchConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ui: BusConfig::ui(),
            app: BusConfig::app(),
            dispatch: DispatchConfig::default(),
        }
    }
}
