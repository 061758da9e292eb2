//! Telemetry delivery: sinks, retry loop, failure queue and connectivity.
//!
//! ## Contents
//! - [`Dispatcher`] retries, queues and flushes; reports [`HealthStatus`]
//! - [`TelemetrySink`] delivery adapter ([`FnSink`], and `HttpSink` with feature `http`)
//! - [`Timer`] injectable backoff sleep ([`TokioTimer`] by default)
//! - [`FailureQueue`] bounded queue of undelivered [`QueueEntry`] values
//! - [`Connectivity`] online/offline signal fed into [`Dispatcher::watch_connectivity`]
//! - [`DispatchListener`] bus listener forwarding events to a dispatcher
//!
//! ## Wiring
//! ```text
//! EventBus ──(Tracker / DispatchListener)──► Dispatcher ──► TelemetrySink
//!                                               │  ▲
//!                                     retryable │  │ flush (online / success)
//!                                               ▼  │
//!                                           FailureQueue
//! ```

mod connectivity;
mod dispatcher;
mod event;
#[cfg(feature = "http")]
mod http;
mod listener;
mod queue;
mod sink;
mod timer;

pub use connectivity::Connectivity;
pub use dispatcher::{Dispatcher, FlushReport, HealthStatus, TrackOutcome};
pub use event::TelemetryEvent;
#[cfg(feature = "http")]
pub use http::HttpSink;
pub use listener::DispatchListener;
pub use queue::{FailureQueue, QueueEntry};
pub use sink::{FnSink, TelemetrySink};
pub use timer::{Timer, TokioTimer};
