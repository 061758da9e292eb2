//! # Dispatcher: resilient delivery to a telemetry sink.
//!
//! Delivers one event at a time with retries, exponential backoff and jitter,
//! parks undeliverable events in a bounded [`FailureQueue`], and flushes that
//! queue when connectivity comes back.
//!
//! ## Delivery flow
//! ```text
//! track_event(name, props)
//!   ├─ offline? ──────────────────────────────► queue ─► Queued
//!   └─ attempt = 0
//!      loop {
//!        ├─ offline? ─────────────────────────► queue ─► Queued
//!        ├─ sink.deliver()
//!        │     ├─ Ok  ─► queue non-empty? spawn flush ─► Delivered { attempts }
//!        │     └─ Err ─► retryable && attempt < max_retries?
//!        │                 ├─ yes ─► sleep(policy.delay(attempt)), attempt += 1
//!        │                 ├─ no, retryable ─────► queue ─► Queued
//!        │                 └─ no, permanent ─────► log  ─► Dropped
//!      }
//! ```
//!
//! ## Flush flow
//! ```text
//! flush()  (online only, one at a time)
//!   for each entry queued when the flush started (oldest first):
//!     deliver with the default policy
//!       ├─ Ok         ─► delivered
//!       ├─ retryable  ─► re-queue with retry_count + 1
//!       └─ permanent  ─► dropped
//! ```
//!
//! ## Rules
//! - **Never throws**: callers get a [`TrackOutcome`], never an error.
//! - **Offline short-circuit**: no sink call while known-offline; queued events are kept.
//! - **Sequential flush**: queued entries are retried one after another.
//! - **No cancellation**: once started, a delivery runs to completion (sleeps included).

use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::DispatchConfig;
use crate::dispatch::event::TelemetryEvent;
use crate::dispatch::queue::{FailureQueue, QueueEntry};
use crate::dispatch::sink::TelemetrySink;
use crate::dispatch::timer::{Timer, TokioTimer};
use crate::error::DeliveryError;
use crate::events::Tracker;
use crate::policies::{EvictionPolicy, RetryPolicy};

/// What happened to a tracked event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackOutcome {
    /// Accepted by the sink after `attempts` calls (1 = first try).
    Delivered { attempts: u32 },
    /// Parked in the failure queue (offline, or retries exhausted).
    Queued,
    /// Permanently rejected, or evicted immediately by a full `DropNewest` queue.
    Dropped,
}

/// Point-in-time dispatcher health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    /// `queue_depth < health_threshold`.
    pub healthy: bool,
    /// Number of queued failed deliveries.
    pub queue_depth: usize,
    /// Last known connectivity state.
    pub online: bool,
    /// Queued entries lost to eviction since creation.
    pub evicted_total: u64,
}

/// Summary of one flush.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Entries taken from the queue.
    pub attempted: usize,
    /// Entries accepted by the sink.
    pub delivered: usize,
    /// Entries put back after failing again.
    pub requeued: usize,
    /// Entries dropped (permanent failure or eviction on re-queue).
    pub dropped: usize,
    /// True if the flush did not run (offline, or another flush in progress).
    pub skipped: bool,
}

struct DeliveryFailure {
    error: DeliveryError,
    attempts: u32,
}

struct Inner {
    sink: Arc<dyn TelemetrySink>,
    timer: Arc<dyn Timer>,
    cfg: DispatchConfig,
    queue: Mutex<FailureQueue>,
    online: AtomicBool,
    flushing: AtomicBool,
    flush_done: Notify,
    shutdown: CancellationToken,
}

/// Resilient telemetry dispatcher.
///
/// Cheap to clone (internally holds an `Arc`); all clones share the same queue,
/// connectivity flag and sink.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

impl Dispatcher {
    /// Creates a dispatcher using [`TokioTimer`] for backoff sleeps.
    pub fn new(sink: Arc<dyn TelemetrySink>, cfg: DispatchConfig) -> Self {
        Self::with_timer(sink, Arc::new(TokioTimer), cfg)
    }

    /// Creates a dispatcher with an explicit timer.
    pub fn with_timer(
        sink: Arc<dyn TelemetrySink>,
        timer: Arc<dyn Timer>,
        cfg: DispatchConfig,
    ) -> Self {
        let queue = FailureQueue::new(cfg.queue_capacity_clamped(), cfg.eviction);
        Self {
            inner: Arc::new(Inner {
                sink,
                timer,
                cfg,
                queue: Mutex::new(queue),
                online: AtomicBool::new(true),
                flushing: AtomicBool::new(false),
                flush_done: Notify::new(),
                shutdown: CancellationToken::new(),
            }),
        }
    }

    /// Dispatcher configuration.
    pub fn config(&self) -> &DispatchConfig {
        &self.inner.cfg
    }

    /// Tracks an event with the default retry policy.
    pub async fn track_event(
        &self,
        name: impl Into<String>,
        properties: Map<String, Value>,
    ) -> TrackOutcome {
        self.track_event_with(name, properties, self.inner.cfg.retry)
            .await
    }

    /// Tracks an event with an explicit retry policy.
    ///
    /// Never fails: delivery problems are retried, queued or dropped and logged.
    pub async fn track_event_with(
        &self,
        name: impl Into<String>,
        properties: Map<String, Value>,
        policy: RetryPolicy,
    ) -> TrackOutcome {
        let event = TelemetryEvent::new(name, properties);

        if !self.is_online() {
            debug!(event = %event.name, "offline; queueing without delivery attempt");
            return self.enqueue(QueueEntry::new(event));
        }

        match self.deliver(&event, policy).await {
            Ok(attempts) => {
                if !self.lock_queue().is_empty() {
                    self.spawn_flush();
                }
                TrackOutcome::Delivered { attempts }
            }
            Err(failure) if failure.error.is_retryable() => {
                warn!(
                    event = %event.name,
                    attempts = failure.attempts,
                    label = failure.error.as_label(),
                    "delivery failed; queueing: {}",
                    failure.error
                );
                self.enqueue(QueueEntry::new(event))
            }
            Err(failure) => {
                warn!(
                    event = %event.name,
                    label = failure.error.as_label(),
                    "delivery rejected; dropping: {}",
                    failure.error
                );
                TrackOutcome::Dropped
            }
        }
    }

    /// Retries every entry queued at call time, oldest first.
    ///
    /// Skipped while offline or when another flush is already running.
    pub async fn flush(&self) -> FlushReport {
        if !self.is_online() {
            return FlushReport {
                skipped: true,
                ..FlushReport::default()
            };
        }
        if self.inner.flushing.swap(true, AtomicOrdering::AcqRel) {
            debug!("flush already in progress");
            return FlushReport {
                skipped: true,
                ..FlushReport::default()
            };
        }
        let _guard = FlushGuard(&self.inner);

        let mut report = FlushReport::default();
        let pending = self.lock_queue().len();
        if pending > 0 {
            info!(pending, "flushing failure queue");
        }

        for _ in 0..pending {
            if !self.is_online() {
                break;
            }
            let Some(mut entry) = self.lock_queue().pop() else {
                break;
            };
            report.attempted += 1;

            match self.deliver(&entry.event, self.inner.cfg.retry).await {
                Ok(_) => report.delivered += 1,
                Err(failure) if failure.error.is_retryable() => {
                    entry.retry_count += 1;
                    debug!(
                        event = %entry.event.name,
                        retry_count = entry.retry_count,
                        "flush delivery failed; re-queueing"
                    );
                    match self.enqueue(entry) {
                        TrackOutcome::Queued => report.requeued += 1,
                        _ => report.dropped += 1,
                    }
                }
                Err(failure) => {
                    warn!(
                        event = %entry.event.name,
                        label = failure.error.as_label(),
                        "queued event rejected; dropping: {}",
                        failure.error
                    );
                    report.dropped += 1;
                }
            }
        }
        report
    }

    /// Updates the connectivity flag. Returns true if the state changed.
    ///
    /// Going offline keeps the queue intact. Coming back online spawns a flush
    /// when anything is queued; use [`Dispatcher::go_online`] to await it instead.
    pub fn set_online(&self, online: bool) -> bool {
        let changed = self.mark_online(online);
        if changed && online && !self.lock_queue().is_empty() {
            self.spawn_flush();
        }
        changed
    }

    /// Marks the dispatcher online and flushes the failure queue.
    ///
    /// If a background flush is already running, waits for it to finish and then
    /// flushes whatever it left queued, so the returned report is never `skipped`
    /// unless the dispatcher went offline again meanwhile.
    pub async fn go_online(&self) -> FlushReport {
        self.mark_online(true);
        loop {
            let done = self.inner.flush_done.notified();
            tokio::pin!(done);
            done.as_mut().enable();

            let report = self.flush().await;
            if !report.skipped || !self.is_online() {
                return report;
            }
            done.await;
        }
    }

    /// Applies every change published on `rx` until [`Dispatcher::shutdown`].
    ///
    /// The current value is applied immediately. Each offline → online transition
    /// spawns a flush, so later transitions are observed while it runs.
    pub fn watch_connectivity(&self, mut rx: watch::Receiver<bool>) -> JoinHandle<()> {
        let this = self.clone();
        let token = self.inner.shutdown.clone();

        tokio::spawn(async move {
            this.set_online(*rx.borrow_and_update());
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    changed = rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        this.set_online(*rx.borrow_and_update());
                    }
                }
            }
        })
    }

    /// Stops background connectivity watchers.
    pub fn shutdown(&self) {
        self.inner.shutdown.cancel();
    }

    /// Last known connectivity state.
    pub fn is_online(&self) -> bool {
        self.inner.online.load(AtomicOrdering::Acquire)
    }

    /// Number of queued failed deliveries.
    pub fn queue_depth(&self) -> usize {
        self.lock_queue().len()
    }

    /// Copies the failure queue, oldest first.
    pub fn queued(&self) -> Vec<QueueEntry> {
        self.lock_queue().snapshot()
    }

    /// Queued entries lost to eviction since creation.
    pub fn evicted_total(&self) -> u64 {
        self.lock_queue().evicted_total()
    }

    /// Pure read of the current health.
    pub fn health(&self) -> HealthStatus {
        let (queue_depth, evicted_total) = {
            let queue = self.lock_queue();
            (queue.len(), queue.evicted_total())
        };
        HealthStatus {
            healthy: queue_depth < self.inner.cfg.health_threshold,
            queue_depth,
            online: self.is_online(),
            evicted_total,
        }
    }

    fn mark_online(&self, online: bool) -> bool {
        let was = self.inner.online.swap(online, AtomicOrdering::AcqRel);
        if was != online {
            if online {
                info!(queue_depth = self.queue_depth(), "connectivity restored");
            } else {
                warn!(queue_depth = self.queue_depth(), "connectivity lost");
            }
        }
        was != online
    }

    fn spawn_flush(&self) {
        let this = self.clone();
        tokio::spawn(async move {
            let report = this.flush().await;
            if !report.skipped && report.attempted > 0 {
                info!(
                    delivered = report.delivered,
                    requeued = report.requeued,
                    dropped = report.dropped,
                    "background flush finished"
                );
            }
        });
    }

    /// Attempts delivery until success, a permanent error, retry exhaustion or offline.
    async fn deliver(&self, event: &TelemetryEvent, policy: RetryPolicy) -> Result<u32, DeliveryFailure> {
        let mut attempt: u32 = 0;
        loop {
            if !self.is_online() {
                return Err(DeliveryFailure {
                    error: DeliveryError::NetworkUnavailable("offline".to_string()),
                    attempts: attempt,
                });
            }

            match self.inner.sink.deliver(std::slice::from_ref(event)).await {
                Ok(()) => return Ok(attempt + 1),
                Err(error) => {
                    if !error.is_retryable() || !policy.allows_retry(attempt) {
                        return Err(DeliveryFailure {
                            error,
                            attempts: attempt + 1,
                        });
                    }
                    let delay = policy.delay(attempt);
                    debug!(
                        event = %event.name,
                        sink = self.inner.sink.name(),
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        label = error.as_label(),
                        "delivery failed; backing off"
                    );
                    self.inner.timer.sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    fn enqueue(&self, entry: QueueEntry) -> TrackOutcome {
        let eviction = self.inner.cfg.eviction;
        let mut queue = self.lock_queue();
        let Some(lost) = queue.push(entry) else {
            return TrackOutcome::Queued;
        };
        warn!(
            evicted = %lost.event.name,
            capacity = queue.capacity(),
            policy = eviction.as_str(),
            "failure queue full; evicting"
        );
        match eviction {
            EvictionPolicy::DropOldest => TrackOutcome::Queued,
            EvictionPolicy::DropNewest => TrackOutcome::Dropped,
        }
    }

    fn lock_queue(&self) -> MutexGuard<'_, FailureQueue> {
        self.inner.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Clears the in-progress flag and wakes `go_online` waiters when a flush ends.
struct FlushGuard<'a>(&'a Inner);

impl Drop for FlushGuard<'_> {
    fn drop(&mut self) {
        self.0.flushing.store(false, AtomicOrdering::Release);
        self.0.flush_done.notify_waiters();
    }
}

#[async_trait]
impl Tracker for Dispatcher {
    async fn track(&self, name: &'static str, properties: Map<String, Value>) {
        self.track_event(name, properties).await;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::dispatch::Connectivity;
    use crate::policies::JitterPolicy;
    use crate::testing::{LogCapture, RecordingTimer, ScriptedSink};

    fn cfg() -> DispatchConfig {
        DispatchConfig {
            retry: RetryPolicy::default().with_jitter(JitterPolicy::None),
            ..DispatchConfig::default()
        }
    }

    fn dispatcher(sink: &Arc<ScriptedSink>, timer: &Arc<RecordingTimer>, cfg: DispatchConfig) -> Dispatcher {
        Dispatcher::with_timer(sink.clone(), timer.clone(), cfg)
    }

    fn ms(v: &[u64]) -> Vec<Duration> {
        v.iter().map(|m| Duration::from_millis(*m)).collect()
    }

    async fn settle(mut done: impl FnMut() -> bool) {
        for _ in 0..100 {
            if done() {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("condition not reached");
    }

    #[tokio::test]
    async fn test_exhausted_retries_queue_the_event() {
        let sink = Arc::new(ScriptedSink::failing(DeliveryError::SinkUnavailable { status: 503 }));
        let timer = Arc::new(RecordingTimer::default());
        let d = dispatcher(&sink, &timer, cfg());

        let outcome = d.track_event("cta_clicked", Map::new()).await;

        assert_eq!(outcome, TrackOutcome::Queued);
        assert_eq!(timer.delays(), ms(&[1000, 2000, 4000]));
        assert_eq!(sink.calls().len(), 4);
        assert_eq!(d.queue_depth(), 1);
        assert_eq!(d.queued()[0].retry_count, 0);
    }

    #[tokio::test]
    async fn test_delays_capped_at_max() {
        let sink = Arc::new(ScriptedSink::failing(DeliveryError::Timeout {
            after: Duration::from_secs(5),
        }));
        let timer = Arc::new(RecordingTimer::default());
        let mut cfg = cfg();
        cfg.retry.max_retries = 6;
        let d = dispatcher(&sink, &timer, cfg);

        d.track_event("slide_changed", Map::new()).await;

        assert_eq!(timer.delays(), ms(&[1000, 2000, 4000, 8000, 10_000, 10_000]));
    }

    #[tokio::test]
    async fn test_recovers_within_retry_budget() {
        let unavailable = || Err(DeliveryError::SinkUnavailable { status: 503 });
        let sink = Arc::new(ScriptedSink::new([unavailable(), unavailable(), unavailable()]));
        let timer = Arc::new(RecordingTimer::default());
        let d = dispatcher(&sink, &timer, cfg());

        let outcome = d.track_event("cta_clicked", Map::new()).await;

        assert_eq!(outcome, TrackOutcome::Delivered { attempts: 4 });
        assert_eq!(timer.delays(), ms(&[1000, 2000, 4000]));
        assert_eq!(d.health().queue_depth, 0);
    }

    #[tokio::test]
    async fn test_permanent_failure_dropped_without_retry() {
        let sink = Arc::new(ScriptedSink::new([Err(DeliveryError::Rejected { status: 400 })]));
        let timer = Arc::new(RecordingTimer::default());
        let d = dispatcher(&sink, &timer, cfg());

        let outcome = d.track_event("cta_clicked", Map::new()).await;

        assert_eq!(outcome, TrackOutcome::Dropped);
        assert!(timer.delays().is_empty());
        assert_eq!(sink.calls().len(), 1);
        assert_eq!(d.queue_depth(), 0);
    }

    #[tokio::test]
    async fn test_per_call_policy_override() {
        let sink = Arc::new(ScriptedSink::failing(DeliveryError::SinkNotReady("sdk".into())));
        let timer = Arc::new(RecordingTimer::default());
        let d = dispatcher(&sink, &timer, cfg());
        let once = RetryPolicy {
            max_retries: 1,
            ..cfg().retry
        };

        let outcome = d.track_event_with("cta_clicked", Map::new(), once).await;

        assert_eq!(outcome, TrackOutcome::Queued);
        assert_eq!(timer.delays(), ms(&[1000]));
    }

    #[tokio::test]
    async fn test_offline_short_circuits_then_flushes_on_reconnect() {
        let sink = Arc::new(ScriptedSink::default());
        let timer = Arc::new(RecordingTimer::default());
        let d = dispatcher(&sink, &timer, cfg());

        assert!(d.set_online(false));
        for name in ["a", "b", "c"] {
            assert_eq!(d.track_event(name, Map::new()).await, TrackOutcome::Queued);
        }
        assert!(sink.calls().is_empty());
        assert_eq!(
            d.health(),
            HealthStatus {
                healthy: true,
                queue_depth: 3,
                online: false,
                evicted_total: 0
            }
        );
        assert!(d.flush().await.skipped);

        let report = d.go_online().await;

        assert_eq!(report.attempted, 3);
        assert_eq!(report.delivered, 3);
        assert_eq!(sink.calls(), vec!["a", "b", "c"]);
        assert_eq!(d.queue_depth(), 0);
    }

    #[tokio::test]
    async fn test_flush_requeues_entries_that_fail_again() {
        let sink = Arc::new(ScriptedSink::default());
        let timer = Arc::new(RecordingTimer::default());
        let mut cfg = cfg();
        cfg.retry.max_retries = 0;
        let d = dispatcher(&sink, &timer, cfg);

        d.set_online(false);
        d.track_event("a", Map::new()).await;
        d.track_event("b", Map::new()).await;
        sink.set_fallback(Some(DeliveryError::NetworkUnavailable("dns".into())));

        let report = d.go_online().await;

        assert_eq!(report.requeued, 2);
        assert_eq!(d.queue_depth(), 2);
        assert!(d.queued().iter().all(|e| e.retry_count == 1));

        sink.set_fallback(None);
        let report = d.flush().await;
        assert_eq!(report.delivered, 2);
        assert_eq!(d.queue_depth(), 0);
    }

    #[tokio::test]
    async fn test_flush_drops_permanently_rejected_entries() {
        let sink = Arc::new(ScriptedSink::default());
        let timer = Arc::new(RecordingTimer::default());
        let d = dispatcher(&sink, &timer, cfg());

        d.set_online(false);
        d.track_event("a", Map::new()).await;
        sink.set_fallback(Some(DeliveryError::MalformedRequest("bad".into())));

        let report = d.go_online().await;

        assert_eq!(report.dropped, 1);
        assert_eq!(d.queue_depth(), 0);
    }

    #[tokio::test]
    async fn test_queue_cap_evicts_oldest() {
        let logs = LogCapture::default();
        let _guard = logs.set_default();
        let sink = Arc::new(ScriptedSink::default());
        let timer = Arc::new(RecordingTimer::default());
        let mut cfg = cfg();
        cfg.queue_capacity = 3;
        let d = dispatcher(&sink, &timer, cfg);

        d.set_online(false);
        for i in 1..=5 {
            d.track_event(format!("e{i}"), Map::new()).await;
        }

        let names: Vec<String> = d.queued().into_iter().map(|e| e.event.name).collect();
        assert_eq!(names, vec!["e3", "e4", "e5"]);
        assert_eq!(d.health().evicted_total, 2);
        assert_eq!(d.evicted_total(), 2);

        let out = logs.contents();
        assert!(out.contains("failure queue full; evicting"));
        assert!(out.contains("evicted=e1"));
        assert!(out.contains("evicted=e2"));
    }

    #[tokio::test]
    async fn test_queue_cap_drop_newest() {
        let sink = Arc::new(ScriptedSink::default());
        let timer = Arc::new(RecordingTimer::default());
        let mut cfg = cfg();
        cfg.queue_capacity = 1;
        cfg.eviction = EvictionPolicy::DropNewest;
        let d = dispatcher(&sink, &timer, cfg);

        d.set_online(false);
        assert_eq!(d.track_event("first", Map::new()).await, TrackOutcome::Queued);
        assert_eq!(d.track_event("second", Map::new()).await, TrackOutcome::Dropped);
        assert_eq!(d.queued()[0].event.name, "first");
        assert_eq!(d.health().evicted_total, 1);
    }

    #[tokio::test]
    async fn test_success_schedules_background_flush() {
        let sink = Arc::new(ScriptedSink::new([Err(DeliveryError::SinkUnavailable { status: 503 })]));
        let timer = Arc::new(RecordingTimer::default());
        let mut cfg = cfg();
        cfg.retry.max_retries = 0;
        let d = dispatcher(&sink, &timer, cfg);

        assert_eq!(d.track_event("stale", Map::new()).await, TrackOutcome::Queued);
        assert_eq!(d.queue_depth(), 1);

        let outcome = d.track_event("fresh", Map::new()).await;
        assert_eq!(outcome, TrackOutcome::Delivered { attempts: 1 });

        settle(|| d.queue_depth() == 0).await;
        assert_eq!(sink.calls(), vec!["stale", "fresh", "stale"]);
    }

    #[tokio::test]
    async fn test_set_online_spawns_flush() {
        let sink = Arc::new(ScriptedSink::default());
        let timer = Arc::new(RecordingTimer::default());
        let d = dispatcher(&sink, &timer, cfg());

        d.set_online(false);
        d.track_event("queued", Map::new()).await;
        assert!(d.set_online(true));
        assert!(!d.set_online(true));

        settle(|| d.queue_depth() == 0).await;
        assert_eq!(sink.calls(), vec!["queued"]);
    }

    #[tokio::test]
    async fn test_health_threshold() {
        let sink = Arc::new(ScriptedSink::default());
        let timer = Arc::new(RecordingTimer::default());
        let mut cfg = cfg();
        cfg.health_threshold = 2;
        let d = dispatcher(&sink, &timer, cfg);

        d.set_online(false);
        d.track_event("a", Map::new()).await;
        assert!(d.health().healthy);
        d.track_event("b", Map::new()).await;
        assert!(!d.health().healthy);
    }

    #[tokio::test]
    async fn test_watch_connectivity() {
        let sink = Arc::new(ScriptedSink::default());
        let timer = Arc::new(RecordingTimer::default());
        let d = dispatcher(&sink, &timer, cfg());
        let net = Connectivity::default();
        let handle = d.watch_connectivity(net.subscribe());

        net.set_online(false);
        settle(|| !d.is_online()).await;
        d.track_event("while_offline", Map::new()).await;
        assert_eq!(d.queue_depth(), 1);

        net.set_online(true);
        settle(|| d.is_online() && d.queue_depth() == 0).await;
        assert_eq!(sink.calls(), vec!["while_offline"]);

        d.shutdown();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_timer_waits_backoff() {
        let unavailable = || Err(DeliveryError::SinkUnavailable { status: 502 });
        let sink = Arc::new(ScriptedSink::new([unavailable(), unavailable()]));
        let d = Dispatcher::new(sink.clone(), cfg());

        let started = tokio::time::Instant::now();
        let outcome = d.track_event("cta_clicked", Map::new()).await;

        assert_eq!(outcome, TrackOutcome::Delivered { attempts: 3 });
        assert!(started.elapsed() >= Duration::from_millis(3000));
    }

    /// Blocks every delivery until the gate is opened.
    #[derive(Default)]
    struct GatedSink {
        gate: Notify,
        calls: std::sync::atomic::AtomicUsize,
    }

    #[async_trait]
    impl TelemetrySink for GatedSink {
        async fn deliver(&self, _batch: &[TelemetryEvent]) -> Result<(), DeliveryError> {
            self.calls.fetch_add(1, AtomicOrdering::SeqCst);
            self.gate.notified().await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_go_online_waits_for_running_flush() {
        let sink = Arc::new(GatedSink::default());
        let d = Dispatcher::with_timer(sink.clone(), Arc::new(RecordingTimer::default()), cfg());

        d.set_online(false);
        d.track_event("a", Map::new()).await;
        d.set_online(true);
        settle(|| sink.calls.load(AtomicOrdering::SeqCst) == 1).await;

        let waiter = d.clone();
        let handle = tokio::spawn(async move { waiter.go_online().await });
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(!handle.is_finished());

        sink.gate.notify_one();
        let report = handle.await.unwrap();

        assert!(!report.skipped);
        assert_eq!(d.queue_depth(), 0);
        assert_eq!(sink.calls.load(AtomicOrdering::SeqCst), 1);
    }
}
