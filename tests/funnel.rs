use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pulsebus::{
    AppEvent, BoxError, Config, Connectivity, DeliveryError, JitterPolicy, Payload, Runtime,
    TelemetryEvent, TelemetrySink, UiEvent,
};

/// Answers with scripted HTTP statuses, then 200.
#[derive(Default)]
struct StatusSink {
    statuses: Mutex<VecDeque<u16>>,
    calls: Mutex<Vec<String>>,
}

impl StatusSink {
    fn new(statuses: &[u16]) -> Self {
        Self {
            statuses: Mutex::new(statuses.iter().copied().collect()),
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TelemetrySink for StatusSink {
    async fn deliver(&self, batch: &[TelemetryEvent]) -> Result<(), DeliveryError> {
        self.calls
            .lock()
            .unwrap()
            .extend(batch.iter().map(|e| e.name.clone()));
        let status = self.statuses.lock().unwrap().pop_front().unwrap_or(200);
        match DeliveryError::from_status(status) {
            None => Ok(()),
            Some(err) => Err(err),
        }
    }
}

fn config() -> Config {
    let mut cfg = Config::default();
    cfg.dispatch.retry = cfg.dispatch.retry.with_jitter(JitterPolicy::None);
    cfg
}

async fn wait_until(mut done: impl FnMut() -> bool) {
    for _ in 0..300 {
        if done() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    panic!("condition not reached");
}

#[tokio::test(start_paused = true)]
async fn cta_click_survives_sink_outage() {
    let sink = Arc::new(StatusSink::new(&[503, 503, 503]));
    let rt = Runtime::builder(config()).with_sink(sink.clone()).build();

    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    rt.ui().subscribe_fn(UiEvent::CtaClicked, "funnel", move |_k, _p| {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    });

    let started = tokio::time::Instant::now();
    let report = rt
        .ui()
        .emit(
            UiEvent::CtaClicked,
            Payload::new("hero").with("ctaLabel", "Join the waitlist").with("ctaUrl", "/waitlist"),
        )
        .await
        .unwrap();
    assert_eq!(report.delivered, 1);
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    let mut peak_depth = 0;
    wait_until(|| {
        peak_depth = peak_depth.max(rt.reporter().dispatcher_health().queue_depth);
        sink.calls().len() == 4
    })
    .await;
    assert_eq!(peak_depth, 0);

    assert!(started.elapsed() >= Duration::from_millis(7000));
    assert_eq!(sink.calls(), vec!["cta_clicked"; 4]);
    let health = rt.reporter().dispatcher_health();
    assert_eq!(health.queue_depth, 0);
    assert!(health.healthy);
}

#[tokio::test(start_paused = true)]
async fn offline_events_flush_on_reconnect() {
    let sink = Arc::new(StatusSink::default());
    let rt = Runtime::builder(config()).with_sink(sink.clone()).build();
    let net = Connectivity::default();
    let watcher = rt.watch_connectivity(net.subscribe());

    net.set_online(false);
    wait_until(|| !rt.dispatcher().is_online()).await;

    rt.app()
        .emit(AppEvent::WaitlistSignupStarted, Payload::new("hero"))
        .await
        .unwrap();
    rt.app()
        .emit(AppEvent::DreamModeStarted, Payload::new("dream").with("scenario", "beach"))
        .await
        .unwrap();
    wait_until(|| rt.dispatcher().queue_depth() == 2).await;
    assert!(sink.calls().is_empty());
    assert!(!rt.reporter().snapshot().dispatcher.online);

    net.set_online(true);
    wait_until(|| rt.dispatcher().queue_depth() == 0).await;

    let mut calls = sink.calls();
    calls.sort();
    assert_eq!(calls, vec!["dream_mode_started", "waitlist_signup_started"]);

    rt.shutdown();
    watcher.await.unwrap();
}

#[tokio::test]
async fn listener_failure_is_reported_not_raised() {
    let sink = Arc::new(StatusSink::default());
    let rt = Runtime::builder(config()).with_sink(sink.clone()).build();

    rt.app().subscribe_fn(AppEvent::SignupFailed, "toast", |_k, _p| async {
        Err::<(), BoxError>("TypeError: cannot read properties of undefined (render)".into())
    });

    let report = rt
        .app()
        .emit(AppEvent::SignupFailed, Payload::new("form").with("reason", "duplicate"))
        .await
        .unwrap();
    assert_eq!(report.failed, 1);

    let internal = rt.reporter().app_history(Some(AppEvent::InternalError));
    assert_eq!(internal.len(), 1);
    assert_eq!(
        internal[0].payload.get("severity").and_then(|v| v.as_str()),
        Some("high")
    );

    let err = rt
        .app()
        .emit(AppEvent::SignupFailed, Payload::new("form"))
        .await
        .unwrap_err();
    assert_eq!(err.as_label(), "validation_missing_field");
}
