//! Test doubles shared by unit tests.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::dispatch::{TelemetryEvent, TelemetrySink, Timer};
use crate::error::DeliveryError;

/// Sink that replays scripted results, then succeeds.
#[derive(Default)]
pub(crate) struct ScriptedSink {
    script: Mutex<VecDeque<Result<(), DeliveryError>>>,
    calls: Mutex<Vec<String>>,
    fallback: Mutex<Option<DeliveryError>>,
}

impl ScriptedSink {
    pub(crate) fn new(script: impl IntoIterator<Item = Result<(), DeliveryError>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Fails every call once the script is exhausted.
    pub(crate) fn failing(err: DeliveryError) -> Self {
        let sink = Self::default();
        *sink.fallback.lock().unwrap() = Some(err);
        sink
    }

    pub(crate) fn set_fallback(&self, err: Option<DeliveryError>) {
        *self.fallback.lock().unwrap() = err;
    }

    /// Names of every delivered-or-attempted event, in call order.
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TelemetrySink for ScriptedSink {
    async fn deliver(&self, batch: &[TelemetryEvent]) -> Result<(), DeliveryError> {
        self.calls
            .lock()
            .unwrap()
            .extend(batch.iter().map(|e| e.name.clone()));
        if let Some(next) = self.script.lock().unwrap().pop_front() {
            return next;
        }
        match self.fallback.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Timer that records requested delays and returns immediately.
#[derive(Default)]
pub(crate) struct RecordingTimer {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingTimer {
    pub(crate) fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

#[async_trait]
impl Timer for RecordingTimer {
    async fn sleep(&self, delay: Duration) {
        self.delays.lock().unwrap().push(delay);
        tokio::task::yield_now().await;
    }
}

/// In-memory `tracing` output for asserting on log lines.
#[derive(Clone, Default)]
pub(crate) struct LogCapture {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    /// Installs a plain-text fmt subscriber writing here, for the current thread.
    pub(crate) fn set_default(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub(crate) fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.lock().unwrap().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
