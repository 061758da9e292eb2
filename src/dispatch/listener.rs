//! Bridge from an [`EventBus`](crate::EventBus) to the [`Dispatcher`].

use async_trait::async_trait;

use crate::dispatch::dispatcher::{Dispatcher, TrackOutcome};
use crate::error::BoxError;
use crate::events::{EventKind, Payload};
use crate::subscribers::Listen;

/// Listener that forwards every event it receives to a [`Dispatcher`].
///
/// The telemetry name is the event name and the properties are the payload
/// fields plus `source` and `timestamp`. Delivery problems are handled by the
/// dispatcher, so this listener never fails.
///
/// # Example
/// ```rust
/// use std::sync::Arc;
/// use pulsebus::{
///     DispatchConfig, DispatchListener, Dispatcher, EventBus, BusConfig, FnSink, UiEvent,
/// };
///
/// let sink = FnSink::new("noop", |_: &str, _: &serde_json::Map<String, serde_json::Value>| Ok(()));
/// let dispatcher = Dispatcher::new(Arc::new(sink), DispatchConfig::default());
/// let bus = EventBus::<UiEvent>::new("ui", BusConfig::ui());
/// let _sub = bus.subscribe(UiEvent::CtaClicked, Arc::new(DispatchListener::new(dispatcher)));
/// ```
#[derive(Clone)]
pub struct DispatchListener {
    dispatcher: Dispatcher,
}

impl DispatchListener {
    /// Wraps a dispatcher handle.
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }
}

#[async_trait]
impl<K: EventKind> Listen<K> for DispatchListener {
    async fn on_event(&self, kind: K, payload: &Payload) -> Result<(), BoxError> {
        let outcome = self
            .dispatcher
            .track_event(kind.name(), payload.to_properties())
            .await;
        if outcome == TrackOutcome::Dropped {
            tracing::debug!(event = kind.name(), "telemetry event dropped");
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "DispatchListener"
    }
}
