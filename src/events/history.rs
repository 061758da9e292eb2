//! # Bounded audit history.
//!
//! [`History`] is a fixed-capacity ring buffer of [`HistoryEntry`] records.
//! When full, the oldest entry is evicted first. Nothing is persisted.
//!
//! ## Ordering guarantees
//! Each entry carries the sequence number (`seq`) assigned by its bus: contiguous
//! and increasing per bus, starting at 0. Sequence numbers of different buses are
//! unrelated.

use std::collections::VecDeque;

use crate::events::kind::EventKind;
use crate::events::payload::Payload;

/// One recorded emission.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry<K> {
    /// Per-bus emission sequence number.
    pub seq: u64,
    /// Event kind.
    pub kind: K,
    /// Validated, timestamped payload.
    pub payload: Payload,
    /// Wall-clock time of the emission in ms since the Unix epoch.
    pub emitted_at_ms: u64,
}

impl<K: EventKind> HistoryEntry<K> {
    /// Creates an entry.
    pub fn new(seq: u64, kind: K, payload: Payload, emitted_at_ms: u64) -> Self {
        Self {
            seq,
            kind,
            payload,
            emitted_at_ms,
        }
    }
}

/// Fixed-capacity ring buffer, oldest evicted first.
#[derive(Debug)]
pub struct History<K> {
    entries: VecDeque<HistoryEntry<K>>,
    capacity: usize,
}

impl<K: EventKind> History<K> {
    /// Creates an empty history. The minimum capacity is 1 (clamped).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    /// Appends an entry, returning the evicted one if the buffer was full.
    pub fn push(&mut self, entry: HistoryEntry<K>) -> Option<HistoryEntry<K>> {
        let evicted = if self.entries.len() >= self.capacity {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(entry);
        evicted
    }

    /// Copies entries in emission order, optionally restricted to one kind.
    pub fn snapshot(&self, filter: Option<K>) -> Vec<HistoryEntry<K>> {
        self.entries
            .iter()
            .filter(|e| filter.is_none_or(|k| e.kind == k))
            .cloned()
            .collect()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing has been recorded (or everything was cleared).
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
