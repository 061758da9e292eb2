//! # Runtime: the two buses, the dispatcher and the reporter, wired together.
//!
//! ```text
//! producers ─► ui bus  ─┐                 ┌─► listeners (per kind)
//!                       ├─ Tracker ─► Dispatcher ─► TelemetrySink
//! producers ─► app bus ─┘                 └─► FailureQueue (retryable failures / offline)
//!
//! HealthReporter ── reads ──► ui bus, app bus, Dispatcher
//! ```
//!
//! There are no globals: create one `Runtime` per process (or per test).
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use pulsebus::{Config, FnSink, Payload, Runtime, UiEvent};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let sink = FnSink::new("stdout", |name: &str, _: &serde_json::Map<String, serde_json::Value>| {
//!         println!("track {name}");
//!         Ok(())
//!     });
//!     let rt = Runtime::builder(Config::default()).with_sink(Arc::new(sink)).build();
//!
//!     rt.ui()
//!         .emit(UiEvent::ModalOpened, Payload::new("nav").with("modalId", "faq"))
//!         .await
//!         .unwrap();
//!     assert_eq!(rt.reporter().ui_history(None).len(), 1);
//! }
//! ```

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::catalog::{AppEvent, UiEvent};
use crate::core::Config;
use crate::core::builder::RuntimeBuilder;
use crate::dispatch::Dispatcher;
use crate::events::EventBus;
use crate::health::HealthReporter;

/// Explicitly constructed event runtime.
pub struct Runtime {
    cfg: Config,
    ui: Arc<EventBus<UiEvent>>,
    app: Arc<EventBus<AppEvent>>,
    dispatcher: Dispatcher,
    reporter: HealthReporter,
}

impl Runtime {
    /// Returns a builder for the given configuration.
    pub fn builder(cfg: Config) -> RuntimeBuilder {
        RuntimeBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        cfg: Config,
        ui: Arc<EventBus<UiEvent>>,
        app: Arc<EventBus<AppEvent>>,
        dispatcher: Dispatcher,
        reporter: HealthReporter,
    ) -> Self {
        Self {
            cfg,
            ui,
            app,
            dispatcher,
            reporter,
        }
    }

    /// Configuration the runtime was built with.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// UI/component-level bus.
    pub fn ui(&self) -> &Arc<EventBus<UiEvent>> {
        &self.ui
    }

    /// Application/domain-level bus.
    pub fn app(&self) -> &Arc<EventBus<AppEvent>> {
        &self.app
    }

    /// Telemetry dispatcher shared by both buses.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Read-only diagnostics.
    pub fn reporter(&self) -> &HealthReporter {
        &self.reporter
    }

    /// Feeds a connectivity signal into the dispatcher. See [`Dispatcher::watch_connectivity`].
    pub fn watch_connectivity(&self, rx: watch::Receiver<bool>) -> JoinHandle<()> {
        self.dispatcher.watch_connectivity(rx)
    }

    /// Stops background tasks started by the runtime.
    pub fn shutdown(&self) {
        self.dispatcher.shutdown();
    }

    /// Logs and returns a diagnostics snapshot. Debug builds only.
    #[cfg(debug_assertions)]
    pub fn debug_snapshot(&self) -> crate::health::DiagnosticsSnapshot {
        let snap = self.reporter.snapshot();
        tracing::debug!(
            ui_history = snap.ui.history_len,
            app_history = snap.app.history_len,
            queue_depth = snap.dispatcher.queue_depth,
            online = snap.dispatcher.online,
            "diagnostics snapshot"
        );
        snap
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::catalog::UiEvent;
    use crate::error::{BoxError, DeliveryError};
    use crate::events::Payload;
    use crate::subscribers::ListenerFn;
    use crate::testing::{RecordingTimer, ScriptedSink};

    #[tokio::test]
    async fn test_buses_track_through_dispatcher() {
        let sink = Arc::new(ScriptedSink::default());
        let rt = Runtime::builder(Config::default())
            .with_sink(sink.clone())
            .with_timer(Arc::new(RecordingTimer::default()))
            .build();

        rt.ui()
            .emit(UiEvent::ShareCardRequested, Payload::new("share").with("format", "png"))
            .await
            .unwrap();
        rt.app()
            .emit(AppEvent::SignupCompleted, Payload::new("form").with("userId", "u1"))
            .await
            .unwrap();

        for _ in 0..100 {
            if sink.calls().len() == 2 {
                break;
            }
            tokio::task::yield_now().await;
        }
        let mut calls = sink.calls();
        calls.sort();
        assert_eq!(calls, vec!["share_card_requested", "signup_completed"]);
    }

    #[tokio::test]
    async fn test_prebuilt_listeners_and_isolated_instances() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let listener = ListenerFn::arc("counter", move |_k: UiEvent, _p: Payload| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, BoxError>(())
            }
        });

        let a = Runtime::builder(Config::default())
            .with_ui_listener(UiEvent::FormSubmitted, listener)
            .build();
        let b = Runtime::builder(Config::default()).build();

        a.ui()
            .emit(UiEvent::FormSubmitted, Payload::new("form").with("formId", "w"))
            .await
            .unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(a.reporter().ui_history(None).len(), 1);
        assert!(b.reporter().ui_history(None).is_empty());
    }

    #[tokio::test]
    async fn test_debug_snapshot_reports_queue() {
        let sink = Arc::new(ScriptedSink::failing(DeliveryError::NetworkUnavailable("down".into())));
        let rt = Runtime::builder(Config::default())
            .with_sink(sink)
            .with_timer(Arc::new(RecordingTimer::default()))
            .build();

        rt.dispatcher().track_event("manual", serde_json::Map::new()).await;

        let snap = rt.debug_snapshot();
        assert_eq!(snap.dispatcher.queue_depth, 1);
        assert!(snap.dispatcher.healthy);
    }
}
