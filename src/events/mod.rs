//! Event data model and the typed bus.
//!
//! This module groups the event **data model** (kinds, payloads, history) and
//! the **bus** that validates, records and fans events out to listeners.
//!
//! ## Contents
//! - [`EventKind`], [`validate`] registry contract and presence validation
//! - [`Payload`] producer-supplied event data
//! - [`History`], [`HistoryEntry`] bounded audit ring buffer
//! - [`EventBus`] publish/subscribe with per-listener isolation
//!
//! ## Quick reference
//! - **Publishers**: application code calling [`EventBus::emit`].
//! - **Consumers**: [`Listen`](crate::Listen) implementations, the bus
//!   [`Tracker`] (telemetry) and the health reporter (history reads).

mod bus;
mod history;
mod kind;
mod payload;

pub use bus::{EmitReport, EventBus, INTERNAL_SOURCE, Tracker};
pub use history::{History, HistoryEntry};
pub use kind::{EventKind, validate};
pub use payload::Payload;
