//! # Example: Waitlist funnel with a flaky sink
//!
//! Emits a short landing-page funnel on both buses while the telemetry sink
//! fails its first calls and the network drops for a moment.
//!
//! ```text
//! cta_clicked ─► ui bus ─► LogWriter
//!                    └─► Dispatcher ─► FlakySink (503, 503, then 200)
//!
//! [offline] waitlist_signup_started ─► queued
//! [online]  flush ─► delivered
//! ```
//!
//! Run with:
//! ```bash
//! RUST_LOG=pulsebus=debug cargo run --example funnel
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use pulsebus::{
    AppEvent, Config, Connectivity, DeliveryError, FnSink, JitterPolicy, LogWriter, Payload,
    RetryPolicy, Runtime, UiEvent,
};
use serde_json::{Map, Value};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let failures = Arc::new(AtomicU32::new(2));
    let budget = Arc::clone(&failures);
    let sink = FnSink::new("flaky", move |name: &str, props: &Map<String, Value>| {
        if budget
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            println!("[sink] {name}: 503");
            return Err(DeliveryError::SinkUnavailable { status: 503 });
        }
        println!("[sink] {name}: accepted ({} props)", props.len());
        Ok(())
    });

    let mut cfg = Config::default();
    cfg.dispatch.retry = RetryPolicy {
        base_delay: Duration::from_millis(100),
        max_delay: Duration::from_secs(1),
        ..RetryPolicy::default()
    }
    .with_jitter(JitterPolicy::Equal);

    let rt = Runtime::builder(cfg)
        .with_sink(Arc::new(sink))
        .with_ui_listener(UiEvent::CtaClicked, Arc::new(LogWriter::new()))
        .with_app_listener(AppEvent::InternalError, Arc::new(LogWriter::new()))
        .build();

    let net = Connectivity::default();
    let watcher = rt.watch_connectivity(net.subscribe());

    rt.ui()
        .emit(
            UiEvent::CtaClicked,
            Payload::new("hero").with("ctaLabel", "Join").with("ctaUrl", "/waitlist"),
        )
        .await?;
    tokio::time::sleep(Duration::from_millis(500)).await;

    net.set_online(false);
    tokio::time::sleep(Duration::from_millis(10)).await;
    rt.app()
        .emit(AppEvent::WaitlistSignupStarted, Payload::new("hero"))
        .await?;
    tokio::time::sleep(Duration::from_millis(10)).await;
    println!("[demo] offline, queue depth = {}", rt.dispatcher().queue_depth());

    net.set_online(true);
    tokio::time::sleep(Duration::from_millis(200)).await;

    let snapshot = rt.reporter().snapshot();
    println!("[demo] diagnostics: {}", serde_json::to_string_pretty(&snapshot)?);

    rt.shutdown();
    watcher.await?;
    Ok(())
}
