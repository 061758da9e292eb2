//! # pulsebus
//!
//! **Pulsebus** is an in-process event bus with a resilient telemetry dispatcher.
//!
//! Producers emit typed events on one of two buses (UI/component level and
//! application/domain level). Each bus validates the payload against a static
//! registry, records it in a bounded audit history, fans it out to listeners with
//! per-listener failure isolation, and hands it to a dispatcher that delivers it
//! to an analytics sink with retries, backoff, jitter and an offline-aware queue.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!      producers                    producers
//!          │                            │
//!          ▼                            ▼
//! ┌───────────────────┐        ┌────────────────────┐
//! │ EventBus<UiEvent> │        │ EventBus<AppEvent> │
//! │ - validate        │        │ - validate         │
//! │ - History (1000)  │        │ - History (500)    │
//! │ - ListenerSet     │        │ - ListenerSet      │
//! └──┬─────────────┬──┘        └──┬──────────────┬──┘
//!    │ fan-out     │ Tracker      │ Tracker      │ fan-out
//!    ▼             └──────┬───────┘              ▼
//! listeners               ▼                  listeners
//! (isolated)      ┌───────────────┐          (isolated)
//!                 │  Dispatcher   │◄── Connectivity (watch)
//!                 │ retry/backoff │
//!                 └───┬───────┬───┘
//!                     ▼       ▼
//!         TelemetrySink       FailureQueue (100, evicting)
//!
//! HealthReporter ── reads ──► buses + Dispatcher ──► DiagnosticsSnapshot
//! ```
//!
//! ### Emission
//! ```text
//! emit(kind, payload)
//!   ├─► validate ─────────────────────► Err(ValidationError)
//!   ├─► timestamp + history.push
//!   ├─► tracker.track (spawned)
//!   ├─► listeners (concurrent; errors/panics ─► internal_error event)
//!   └─► Ok(EmitReport)
//! ```
//!
//! ## Features
//! | Area              | Description                                                | Key types / traits                          |
//! |-------------------|------------------------------------------------------------|---------------------------------------------|
//! | **Registry**      | Closed event catalogs with required-field schemas.         | [`EventKind`], [`UiEvent`], [`AppEvent`]    |
//! | **Bus**           | Publish/subscribe with isolation and audit history.        | [`EventBus`], [`Listen`], [`Subscription`]  |
//! | **Dispatch**      | Retries, backoff, offline queue, flush, health.            | [`Dispatcher`], [`TelemetrySink`]           |
//! | **Policies**      | Retry, jitter and queue eviction strategies.               | [`RetryPolicy`], [`JitterPolicy`], [`EvictionPolicy`] |
//! | **Diagnostics**   | Read-only history and health views.                        | [`HealthReporter`], [`DiagnosticsSnapshot`] |
//! | **Errors**        | Typed validation, listener and delivery errors.            | [`ValidationError`], [`ListenerError`], [`DeliveryError`] |
//! | **Configuration** | Centralized settings.                                      | [`Config`]                                  |
//!
//! ## Optional features
//! - `http` _(default)_: exports [`HttpSink`], a `reqwest`-based JSON sink.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use pulsebus::{Config, DeliveryError, FnSink, LogWriter, Payload, Runtime, UiEvent};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let sink = FnSink::new("vendor", |name: &str, _props: &serde_json::Map<String, serde_json::Value>| {
//!         if name.is_empty() {
//!             return Err(DeliveryError::MalformedRequest("empty name".into()));
//!         }
//!         Ok(())
//!     });
//!
//!     let rt = Runtime::builder(Config::default())
//!         .with_sink(Arc::new(sink))
//!         .with_ui_listener(UiEvent::CtaClicked, Arc::new(LogWriter::new()))
//!         .build();
//!
//!     let report = rt
//!         .ui()
//!         .emit(
//!             UiEvent::CtaClicked,
//!             Payload::new("hero").with("ctaLabel", "Join").with("ctaUrl", "/waitlist"),
//!         )
//!         .await?;
//!     assert_eq!(report.delivered, 1);
//!
//!     let snapshot = rt.reporter().snapshot();
//!     assert_eq!(snapshot.ui.counts.get("cta_clicked"), Some(&1));
//!     Ok(())
//! }
//! ```
mod catalog;
mod core;
mod dispatch;
mod error;
mod events;
mod health;
mod policies;
mod subscribers;

#[cfg(test)]
mod testing;

// ---- Public re-exports ----

pub use catalog::{AppEvent, UiEvent};
pub use crate::core::{BusConfig, Config, DispatchConfig, Runtime, RuntimeBuilder};
pub use dispatch::{
    Connectivity, DispatchListener, Dispatcher, FailureQueue, FlushReport, FnSink, HealthStatus,
    QueueEntry, TelemetryEvent, TelemetrySink, Timer, TokioTimer, TrackOutcome,
};
pub use error::{
    BoxError, DeliveryError, DeliveryErrorKind, ListenerError, RETRYABLE, Severity,
    ValidationError,
};
pub use events::{
    EmitReport, EventBus, EventKind, History, HistoryEntry, INTERNAL_SOURCE, Payload, Tracker,
    validate,
};
pub use health::{BusDiagnostics, DiagnosticsSnapshot, HealthReporter};
pub use policies::{EvictionPolicy, JitterPolicy, RetryPolicy};
pub use subscribers::{FanOut, Listen, ListenerFn, ListenerRef, ListenerSet, LogWriter, Subscription};

// Optional: HTTP JSON sink.
// Enable with: `--features http` (on by default)
#[cfg(feature = "http")]
pub use dispatch::HttpSink;
