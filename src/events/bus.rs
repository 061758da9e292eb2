//! # Typed event bus.
//!
//! [`EventBus`] validates payloads against the registry, records a bounded audit
//! history, notifies an optional telemetry [`Tracker`] and fans each event out to
//! the listeners registered for its kind.
//!
//! ## Architecture
//! ```text
//! emit(kind, payload)
//!   ├─► validate()                 ─► Err(ValidationError)  (nothing recorded)
//!   ├─► stamp timestamp if missing
//!   ├─► history.push()             (ring buffer, oldest evicted)
//!   ├─► tracker.track()            (spawned; fires with or without listeners)
//!   ├─► ListenerSet::fan_out()     (snapshot, concurrent, isolated)
//!   │       └─► per failure: error!() + emit internal_error
//!   │                         (failures while handling internal_error are only logged)
//!   └─► elapsed > slow_threshold   ─► warn!()
//! ```
//!
//! ## Rules
//! - **Validation first**: an invalid payload has no side effect at all.
//! - **Total order**: history entries are appended in emission order.
//! - **Isolation**: listener failures never reach the caller of `emit`.
//! - **No globals**: buses are explicit instances; create one per test.

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::time::Instant;
use tracing::{debug, error, warn};

use crate::core::BusConfig;
use crate::error::{BoxError, ListenerError, ValidationError};
use crate::events::history::{History, HistoryEntry};
use crate::events::kind::{EventKind, validate};
use crate::events::payload::Payload;
use crate::subscribers::{FanOut, ListenerFn, ListenerRef, ListenerSet, Subscription};

/// Source identifier used for internal error events.
pub const INTERNAL_SOURCE: &str = "event_bus";

/// Telemetry hook notified of every valid emission.
///
/// The bus spawns the call and never awaits it, so a slow or failing sink
/// cannot delay `emit`.
#[async_trait]
pub trait Tracker: Send + Sync + 'static {
    /// Records one emitted event.
    async fn track(&self, name: &'static str, properties: Map<String, Value>);
}

/// Outcome of a successful [`EventBus::emit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmitReport {
    /// Per-bus sequence number of the recorded history entry.
    pub seq: u64,
    /// Listeners that completed successfully.
    pub delivered: usize,
    /// Listeners removed between the snapshot and their invocation.
    pub skipped: usize,
    /// Listeners that failed, panicked or timed out.
    pub failed: usize,
    /// Wall-clock duration of the fan-out.
    pub elapsed: Duration,
}

/// In-process publish/subscribe bus over event kinds `K`.
pub struct EventBus<K: EventKind> {
    name: &'static str,
    cfg: BusConfig,
    listeners: ListenerSet<K>,
    history: Mutex<History<K>>,
    next_seq: AtomicU64,
    last_ts: AtomicU64,
    tracker: Option<Arc<dyn Tracker>>,
}

impl<K: EventKind> EventBus<K> {
    /// Creates a bus. `name` only appears in logs.
    pub fn new(name: &'static str, cfg: BusConfig) -> Self {
        Self {
            name,
            history: Mutex::new(History::new(cfg.history_capacity_clamped())),
            cfg,
            listeners: ListenerSet::new(),
            next_seq: AtomicU64::new(0),
            last_ts: AtomicU64::new(0),
            tracker: None,
        }
    }

    /// Attaches the telemetry tracker notified of every emission.
    pub fn with_tracker(mut self, tracker: Arc<dyn Tracker>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    /// Bus name, as given to [`EventBus::new`].
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Bus configuration.
    pub fn config(&self) -> &BusConfig {
        &self.cfg
    }

    /// Registers `listener` for `kind`.
    ///
    /// Multiple listeners per kind are allowed. The returned [`Subscription`]
    /// removes exactly this registration.
    pub fn subscribe(&self, kind: K, listener: ListenerRef<K>) -> Subscription {
        debug!(bus = self.name, event = kind.name(), listener = listener.name(), "subscribe");
        self.listeners.insert(kind, listener)
    }

    /// Registers an async closure for `kind`. See [`ListenerFn`].
    pub fn subscribe_fn<F, Fut>(&self, kind: K, name: &'static str, f: F) -> Subscription
    where
        F: Fn(K, Payload) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        self.subscribe(kind, ListenerFn::arc(name, f))
    }

    /// Number of listeners registered for `kind`.
    pub fn listener_count(&self, kind: K) -> usize {
        self.listeners.count(kind)
    }

    /// Validates, records and fans out one event.
    ///
    /// Resolves once every listener has been attempted. The only error is a
    /// [`ValidationError`], returned before any side effect.
    pub async fn emit(&self, kind: K, payload: Payload) -> Result<EmitReport, ValidationError> {
        validate(kind, &payload)?;
        let entry = self.record(kind, payload);
        let (fan, elapsed) = self.fan_out(&entry).await;

        for failure in &fan.failures {
            self.report_failure(&entry, failure).await;
        }

        if !self.cfg.slow_threshold.is_zero() && elapsed > self.cfg.slow_threshold {
            warn!(
                bus = self.name,
                event = kind.name(),
                elapsed_ms = elapsed.as_millis() as u64,
                threshold_ms = self.cfg.slow_threshold.as_millis() as u64,
                "slow event fan-out"
            );
        }

        Ok(EmitReport {
            seq: entry.seq,
            delivered: fan.delivered,
            skipped: fan.skipped,
            failed: fan.failures.len(),
            elapsed,
        })
    }

    /// Copies the audit history in emission order, optionally filtered by kind.
    pub fn history(&self, filter: Option<K>) -> Vec<HistoryEntry<K>> {
        self.lock_history().snapshot(filter)
    }

    /// Number of entries currently held in the history.
    pub fn history_len(&self) -> usize {
        self.lock_history().len()
    }

    /// Drops every history entry.
    pub fn clear_history(&self) {
        self.lock_history().clear();
    }

    fn lock_history(&self) -> std::sync::MutexGuard<'_, History<K>> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stamps, records and tracks a validated payload.
    fn record(&self, kind: K, mut payload: Payload) -> HistoryEntry<K> {
        payload.stamp_if_missing(|| self.next_timestamp());
        let entry = {
            // seq taken under the history lock: history order == seq order.
            let mut history = self.lock_history();
            let seq = self.next_seq.fetch_add(1, AtomicOrdering::Relaxed);
            let entry = HistoryEntry::new(seq, kind, payload, now_ms());
            history.push(entry.clone());
            entry
        };

        if let Some(tracker) = &self.tracker {
            let tracker = Arc::clone(tracker);
            let name = kind.name();
            let properties = entry.payload.to_properties();
            tokio::spawn(async move { tracker.track(name, properties).await });
        }
        entry
    }

    async fn fan_out(&self, entry: &HistoryEntry<K>) -> (FanOut, Duration) {
        let started = Instant::now();
        if self.listeners.count(entry.kind) == 0 {
            debug!(bus = self.name, event = entry.kind.name(), "no listeners");
            return (FanOut::default(), started.elapsed());
        }
        let fan = self
            .listeners
            .fan_out(entry.kind, &entry.payload, self.cfg.listener_timeout())
            .await;
        (fan, started.elapsed())
    }

    /// Logs a listener failure and republishes it as an internal error event.
    async fn report_failure(&self, entry: &HistoryEntry<K>, failure: &ListenerError) {
        let severity = failure.severity();
        error!(
            bus = self.name,
            event = entry.kind.name(),
            listener = failure.listener(),
            label = failure.as_label(),
            severity = severity.as_str(),
            "listener failed: {failure}"
        );
        if entry.kind.is_internal_error() {
            return;
        }

        let internal = K::internal_error();
        let payload = Payload::new(INTERNAL_SOURCE)
            .with("error", failure.to_string())
            .with("severity", severity.as_str())
            .with("listener", failure.listener())
            .with("originalEvent", entry.kind.name())
            .with("originalSeq", entry.seq);
        let entry = self.record(internal, payload);
        let (fan, _) = self.fan_out(&entry).await;

        for nested in &fan.failures {
            error!(
                bus = self.name,
                event = internal.name(),
                listener = nested.listener(),
                label = nested.as_label(),
                "listener failed while handling internal error: {nested}"
            );
        }
    }

    /// Wall-clock ms, forced strictly above the previously assigned value.
    fn next_timestamp(&self) -> u64 {
        let now = now_ms();
        let prev = self
            .last_ts
            .fetch_update(AtomicOrdering::Relaxed, AtomicOrdering::Relaxed, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or_else(|last| last);
        now.max(prev + 1)
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
