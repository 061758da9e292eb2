//! # Telemetry sinks.
//!
//! A [`TelemetrySink`] is the adapter between the dispatcher and an analytics
//! backend. The dispatcher only relies on the returned [`DeliveryError`] to decide
//! between retrying, queueing and dropping.
//!
//! - [`HttpSink`](crate::HttpSink) posts `{ "events": [...] }` batches (feature `http`).
//! - [`FnSink`] wraps a vendor-SDK style `track(name, properties)` call.
//!
//! ## Example
//! ```rust
//! use pulsebus::{DeliveryError, FnSink, TelemetrySink};
//!
//! let sink = FnSink::new("console", |name: &str, _props: &serde_json::Map<String, serde_json::Value>| {
//!     if name.is_empty() {
//!         return Err(DeliveryError::MalformedRequest("empty name".into()));
//!     }
//!     Ok(())
//! });
//! assert_eq!(sink.name(), "console");
//! ```

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::dispatch::event::TelemetryEvent;
use crate::error::DeliveryError;

/// Destination for telemetry events.
///
/// ### Implementation requirements
/// - Classify failures precisely: only transient causes should map onto
///   retryable [`DeliveryError`] variants.
/// - Never panic; the dispatcher does not catch sink panics.
#[async_trait]
pub trait TelemetrySink: Send + Sync + 'static {
    /// Delivers a batch. Either the whole batch is accepted or an error is returned.
    async fn deliver(&self, batch: &[TelemetryEvent]) -> Result<(), DeliveryError>;

    /// Sink name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Sink backed by a synchronous `track(name, properties)` function.
pub struct FnSink<F> {
    name: &'static str,
    track: F,
}

impl<F> FnSink<F>
where
    F: Fn(&str, &Map<String, Value>) -> Result<(), DeliveryError> + Send + Sync + 'static,
{
    /// Wraps `track`, called once per event in a batch.
    pub fn new(name: &'static str, track: F) -> Self {
        Self { name, track }
    }
}

#[async_trait]
impl<F> TelemetrySink for FnSink<F>
where
    F: Fn(&str, &Map<String, Value>) -> Result<(), DeliveryError> + Send + Sync + 'static,
{
    async fn deliver(&self, batch: &[TelemetryEvent]) -> Result<(), DeliveryError> {
        for event in batch {
            (self.track)(&event.name, &event.properties)?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        self.name
    }
}
