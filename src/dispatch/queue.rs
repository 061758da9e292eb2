//! # Bounded failure queue.
//!
//! Holds telemetry events whose delivery failed with a retryable error (or that
//! were produced while offline). The queue is capped; what happens at the cap is
//! decided by [`EvictionPolicy`].

use std::collections::VecDeque;

use crate::dispatch::event::TelemetryEvent;
use crate::policies::EvictionPolicy;

/// A failed delivery waiting for the next flush.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueEntry {
    /// The undelivered event.
    pub event: TelemetryEvent,
    /// Number of flushes that already failed for this entry.
    pub retry_count: u32,
}

impl QueueEntry {
    /// Wraps a freshly failed event.
    pub fn new(event: TelemetryEvent) -> Self {
        Self {
            event,
            retry_count: 0,
        }
    }
}

/// FIFO queue with a hard cap.
#[derive(Debug)]
pub struct FailureQueue {
    entries: VecDeque<QueueEntry>,
    capacity: usize,
    eviction: EvictionPolicy,
    evicted_total: u64,
}

impl FailureQueue {
    /// Creates an empty queue. The minimum capacity is 1 (clamped).
    pub fn new(capacity: usize, eviction: EvictionPolicy) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
            eviction,
            evicted_total: 0,
        }
    }

    /// Enqueues `entry`, returning the entry that was given up if the queue was full.
    ///
    /// With [`EvictionPolicy::DropOldest`] that is the front entry; with
    /// [`EvictionPolicy::DropNewest`] it is `entry` itself.
    pub fn push(&mut self, entry: QueueEntry) -> Option<QueueEntry> {
        if self.entries.len() < self.capacity {
            self.entries.push_back(entry);
            return None;
        }
        self.evicted_total += 1;
        match self.eviction {
            EvictionPolicy::DropOldest => {
                let evicted = self.entries.pop_front();
                self.entries.push_back(entry);
                evicted
            }
            EvictionPolicy::DropNewest => Some(entry),
        }
    }

    /// Takes the oldest entry.
    pub fn pop(&mut self) -> Option<QueueEntry> {
        self.entries.pop_front()
    }

    /// Current depth.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Configured cap.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Entries lost to eviction since creation.
    pub fn evicted_total(&self) -> u64 {
        self.evicted_total
    }

    /// Copies the queued entries, oldest first.
    pub fn snapshot(&self) -> Vec<QueueEntry> {
        self.entries.iter().cloned().collect()
    }
}
