//! # Health and audit reporter.
//!
//! [`HealthReporter`] never mutates what it observes: every method is a read
//! of bus history, listener registrations or dispatcher state.
//!
//! ```text
//! HealthReporter
//!   ├─► ui bus   ── history(filter), counts per kind
//!   ├─► app bus  ── history(filter), counts per kind
//!   └─► dispatcher ── health() { healthy, queue_depth, online }
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::catalog::{AppEvent, UiEvent};
use crate::dispatch::{Dispatcher, HealthStatus};
use crate::events::{EventBus, EventKind, HistoryEntry};

/// Diagnostics for one bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BusDiagnostics {
    /// Bus name.
    pub name: &'static str,
    /// Entries currently held in history.
    pub history_len: usize,
    /// History ring capacity.
    pub history_capacity: usize,
    /// Entries in history per event name (only kinds with at least one entry).
    pub counts: BTreeMap<&'static str, usize>,
    /// Registered listeners per event name (only kinds with listeners).
    pub listeners: BTreeMap<&'static str, usize>,
    /// Sequence number of the most recent entry.
    pub last_seq: Option<u64>,
}

impl BusDiagnostics {
    fn collect<K: EventKind>(bus: &EventBus<K>) -> Self {
        let history = bus.history(None);

        let mut counts = BTreeMap::new();
        for entry in &history {
            *counts.entry(entry.kind.name()).or_insert(0) += 1;
        }
        let listeners = K::all()
            .iter()
            .filter_map(|k| match bus.listener_count(*k) {
                0 => None,
                n => Some((k.name(), n)),
            })
            .collect();

        Self {
            name: bus.name(),
            history_len: history.len(),
            history_capacity: bus.config().history_capacity_clamped(),
            counts,
            listeners,
            last_seq: history.last().map(|e| e.seq),
        }
    }
}

/// Point-in-time summary of the whole runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticsSnapshot {
    pub ui: BusDiagnostics,
    pub app: BusDiagnostics,
    pub dispatcher: HealthStatus,
}

/// Read-only view over both buses and the dispatcher.
#[derive(Clone)]
pub struct HealthReporter {
    ui: Arc<EventBus<UiEvent>>,
    app: Arc<EventBus<AppEvent>>,
    dispatcher: Dispatcher,
}

impl HealthReporter {
    /// Creates a reporter over the given instances.
    pub fn new(
        ui: Arc<EventBus<UiEvent>>,
        app: Arc<EventBus<AppEvent>>,
        dispatcher: Dispatcher,
    ) -> Self {
        Self { ui, app, dispatcher }
    }

    /// UI bus history in emission order, optionally filtered by kind.
    pub fn ui_history(&self, filter: Option<UiEvent>) -> Vec<HistoryEntry<UiEvent>> {
        self.ui.history(filter)
    }

    /// App bus history in emission order, optionally filtered by kind.
    pub fn app_history(&self, filter: Option<AppEvent>) -> Vec<HistoryEntry<AppEvent>> {
        self.app.history(filter)
    }

    /// Current dispatcher health.
    pub fn dispatcher_health(&self) -> HealthStatus {
        self.dispatcher.health()
    }

    /// Collects a serializable summary.
    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        DiagnosticsSnapshot {
            ui: BusDiagnostics::collect(&self.ui),
            app: BusDiagnostics::collect(&self.app),
            dispatcher: self.dispatcher.health(),
        }
    }
}
