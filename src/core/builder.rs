use std::sync::Arc;

use serde_json::{Map, Value};

use crate::catalog::{AppEvent, UiEvent};
use crate::core::Config;
use crate::core::runtime::Runtime;
use crate::dispatch::{Dispatcher, FnSink, TelemetrySink, Timer, TokioTimer};
use crate::error::DeliveryError;
use crate::events::{EventBus, Tracker};
use crate::health::HealthReporter;
use crate::subscribers::ListenerRef;

/// Builder for constructing a [`Runtime`].
///
/// Without a sink, telemetry is discarded and the buses get no tracker.
pub struct RuntimeBuilder {
    cfg: Config,
    sink: Option<Arc<dyn TelemetrySink>>,
    timer: Arc<dyn Timer>,
    ui_listeners: Vec<(UiEvent, ListenerRef<UiEvent>)>,
    app_listeners: Vec<(AppEvent, ListenerRef<AppEvent>)>,
}

impl RuntimeBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            sink: None,
            timer: Arc::new(TokioTimer),
            ui_listeners: Vec::new(),
            app_listeners: Vec::new(),
        }
    }

    /// Sets the telemetry sink. Every valid emission on both buses is tracked.
    pub fn with_sink(mut self, sink: Arc<dyn TelemetrySink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Uses an [`HttpSink`](crate::HttpSink) posting to `endpoint`, with the
    /// request timeout taken from `DispatchConfig::sink_timeout`.
    #[cfg(feature = "http")]
    pub fn with_http_endpoint(self, endpoint: impl Into<String>) -> Result<Self, DeliveryError> {
        let sink = crate::dispatch::HttpSink::new(endpoint, self.cfg.dispatch.sink_timeout())?;
        Ok(self.with_sink(Arc::new(sink)))
    }

    /// Replaces the timer used for backoff sleeps.
    pub fn with_timer(mut self, timer: Arc<dyn Timer>) -> Self {
        self.timer = timer;
        self
    }

    /// Registers a UI bus listener at build time.
    pub fn with_ui_listener(mut self, kind: UiEvent, listener: ListenerRef<UiEvent>) -> Self {
        self.ui_listeners.push((kind, listener));
        self
    }

    /// Registers an app bus listener at build time.
    pub fn with_app_listener(mut self, kind: AppEvent, listener: ListenerRef<AppEvent>) -> Self {
        self.app_listeners.push((kind, listener));
        self
    }

    /// Builds the runtime.
    ///
    /// Pre-registered listeners stay subscribed for the lifetime of the buses.
    pub fn build(self) -> Runtime {
        let tracked = self.sink.is_some();
        let sink = self.sink.unwrap_or_else(|| {
            Arc::new(FnSink::new(
                "discard",
                |_: &str, _: &Map<String, Value>| -> Result<(), DeliveryError> { Ok(()) },
            ))
        });
        let dispatcher = Dispatcher::with_timer(sink, self.timer, self.cfg.dispatch.clone());

        let mut ui = EventBus::new("ui", self.cfg.ui.clone());
        let mut app = EventBus::new("app", self.cfg.app.clone());
        if tracked {
            let tracker: Arc<dyn Tracker> = Arc::new(dispatcher.clone());
            ui = ui.with_tracker(Arc::clone(&tracker));
            app = app.with_tracker(tracker);
        }
        let ui = Arc::new(ui);
        let app = Arc::new(app);

        for (kind, listener) in self.ui_listeners {
            let _ = ui.subscribe(kind, listener);
        }
        for (kind, listener) in self.app_listeners {
            let _ = app.subscribe(kind, listener);
        }

        let reporter = HealthReporter::new(Arc::clone(&ui), Arc::clone(&app), dispatcher.clone());
        Runtime::new_internal(self.cfg, ui, app, dispatcher, reporter)
    }
}

#[cfg(all(test, feature = "http"))]
mod tests {
    use std::time::Duration;

    use httpmock::Method::POST;
    use httpmock::MockServer;

    use super::*;
    use crate::dispatch::TrackOutcome;
    use crate::events::Payload;
    use crate::testing::RecordingTimer;

    #[tokio::test]
    async fn test_http_endpoint_receives_tracked_events() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/collect")
                .body_contains("\"name\":\"modal_opened\"");
            then.status(200);
        });

        let rt = Runtime::builder(Config::default())
            .with_http_endpoint(server.url("/collect"))
            .unwrap()
            .build();
        rt.ui()
            .emit(UiEvent::ModalOpened, Payload::new("nav").with("modalId", "faq"))
            .await
            .unwrap();

        for _ in 0..200 {
            if mock.hits() == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        mock.assert();
    }

    #[tokio::test]
    async fn test_http_endpoint_applies_sink_timeout() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/collect");
            then.status(200).delay(Duration::from_millis(500));
        });

        let mut cfg = Config::default();
        cfg.dispatch.sink_timeout = Duration::from_millis(50);
        cfg.dispatch.retry.max_retries = 0;
        let rt = Runtime::builder(cfg)
            .with_http_endpoint(server.url("/collect"))
            .unwrap()
            .with_timer(Arc::new(RecordingTimer::default()))
            .build();

        let outcome = rt
            .dispatcher()
            .track_event("manual", serde_json::Map::new())
            .await;

        assert_eq!(outcome, TrackOutcome::Queued);
        let queued = rt.dispatcher().queued();
        assert_eq!(queued[0].event.name, "manual");
    }
}
