//! # LogWriter: event logger
//!
//! A minimal listener that writes every event it receives to `tracing`.
//! Internal error events are logged at `warn`, everything else at `debug`.
//!
//! ## Example output (with `tracing-subscriber`'s fmt layer)
//! ```text
//! DEBUG pulsebus::log: event=cta_clicked source="hero" ts=1718000000000
//! WARN  pulsebus::log: event=internal_error source="event_bus" error="listener confetti panicked: boom"
//! ```

use async_trait::async_trait;

use crate::error::BoxError;
use crate::events::{EventKind, Payload};
use crate::subscribers::Listen;

/// Event writer listener.
#[derive(Default, Debug, Clone, Copy)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl<K: EventKind> Listen<K> for LogWriter {
    async fn on_event(&self, kind: K, payload: &Payload) -> Result<(), BoxError> {
        if kind.is_internal_error() {
            tracing::warn!(
                target: "pulsebus::log",
                event = kind.name(),
                source = payload.source(),
                error = payload.get("error").and_then(|v| v.as_str()).unwrap_or("unknown"),
                severity = payload.get("severity").and_then(|v| v.as_str()).unwrap_or("low"),
                "listener failure"
            );
        } else {
            tracing::debug!(
                target: "pulsebus::log",
                event = kind.name(),
                source = payload.source(),
                ts = ?payload.timestamp(),
                "event"
            );
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "LogWriter"
    }
}
