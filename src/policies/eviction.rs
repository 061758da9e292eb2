//! # Eviction policy for the failure queue.
//!
//! [`EvictionPolicy`] decides which event is lost when the dispatcher's
//! failure queue is full and another delivery fails.
//!
//! ```text
//! queue (cap = 3): [e1, e2, e3]   + e4
//!   DropOldest  →  [e2, e3, e4]   (e1 lost)
//!   DropNewest  →  [e1, e2, e3]   (e4 lost)
//! ```
//!
//! **DropOldest** keeps the most recent telemetry during a sustained outage;
//! **DropNewest** preserves the first failures (the start of the outage).

/// Which entry to discard when the failure queue is at capacity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum EvictionPolicy {
    /// Evict the oldest queued entry (FIFO eviction, default).
    #[default]
    DropOldest,
    /// Reject the incoming entry.
    DropNewest,
}

impl EvictionPolicy {
    /// Short name for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            EvictionPolicy::DropOldest => "drop_oldest",
            EvictionPolicy::DropNewest => "drop_newest",
        }
    }
}
