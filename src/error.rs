//! Error types used by the bus and the delivery dispatcher.
//!
//! This module defines three main error enums:
//!
//! - [`ValidationError`]: a payload rejected by the event registry (the only error
//!   a producer has to handle).
//! - [`ListenerError`]: a listener that failed, panicked or timed out; never
//!   returned to the emitter, only logged and re-published as an internal error event.
//! - [`DeliveryError`]: a telemetry sink failure; absorbed by the dispatcher.
//!
//! All types provide `as_label` for logs/metrics; [`DeliveryError::is_retryable`]
//! classifies failures through the fixed [`RETRYABLE`] table.

use std::time::Duration;
use thiserror::Error;

/// Boxed error returned by listener callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// # Payload rejected before any side effect.
///
/// Returned synchronously by `EventBus::emit`: no history entry is recorded and
/// no listener runs.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The payload has an empty (or whitespace-only) `source`.
    #[error("event {kind}: payload is missing a non-empty `source`")]
    MissingSource {
        /// Wire name of the event kind.
        kind: &'static str,
    },

    /// A field required by the registry schema is absent.
    #[error("event {kind}: payload is missing required field `{field}`")]
    MissingField {
        /// Wire name of the event kind.
        kind: &'static str,
        /// The first missing field, in schema order.
        field: &'static str,
    },
}

impl ValidationError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use pulsebus::ValidationError;
    ///
    /// let err = ValidationError::MissingSource { kind: "cta_clicked" };
    /// assert_eq!(err.as_label(), "validation_missing_source");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ValidationError::MissingSource { .. } => "validation_missing_source",
            ValidationError::MissingField { .. } => "validation_missing_field",
        }
    }
}

/// Heuristic severity attached to listener failures.
///
/// Ordered from least to most severe so that `max` picks the worse one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// Message fragments (lowercase, all must match) and the severity they imply.
/// Rules are checked in order; the first match wins.
const SEVERITY_RULES: &[(&[&str], Severity)] = &[
    (&["chunkloaderror"], Severity::Critical),
    (&["loading chunk"], Severity::Critical),
    (&["dynamically imported module"], Severity::Critical),
    (&["typeerror", "render"], Severity::High),
    (&["type error", "render"], Severity::High),
    (&["referenceerror"], Severity::Medium),
    (&["reference error"], Severity::Medium),
    (&["typeerror"], Severity::Medium),
    (&["type error"], Severity::Medium),
];

impl Severity {
    /// Classifies a failure message through the fixed rule table.
    ///
    /// # Example
    /// ```
    /// use pulsebus::Severity;
    ///
    /// assert_eq!(Severity::classify("ChunkLoadError: Loading chunk 7 failed"), Severity::Critical);
    /// assert_eq!(Severity::classify("TypeError while rendering hero"), Severity::High);
    /// assert_eq!(Severity::classify("ReferenceError: x is not defined"), Severity::Medium);
    /// assert_eq!(Severity::classify("quota exceeded"), Severity::Low);
    /// ```
    pub fn classify(message: &str) -> Severity {
        let lower = message.to_lowercase();
        SEVERITY_RULES
            .iter()
            .find(|(needles, _)| needles.iter().all(|n| lower.contains(n)))
            .map(|(_, severity)| *severity)
            .unwrap_or(Severity::Low)
    }

    /// Returns the lowercase name used in internal error payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

/// # A listener that did not complete successfully.
///
/// Isolated by the bus: logged and surfaced as an internal error event, never
/// propagated to the emitter.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum ListenerError {
    /// The listener returned an error.
    #[error("listener {listener} failed: {message}")]
    Failed {
        /// Listener name.
        listener: String,
        /// Rendered error.
        message: String,
    },

    /// The listener panicked; the panic was caught.
    #[error("listener {listener} panicked: {message}")]
    Panicked {
        /// Listener name.
        listener: String,
        /// Panic payload, if it was a string.
        message: String,
    },

    /// The listener exceeded the bus' listener timeout.
    #[error("listener {listener} timed out after {timeout:?}")]
    TimedOut {
        /// Listener name.
        listener: String,
        /// The configured timeout.
        timeout: Duration,
    },
}

impl ListenerError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ListenerError::Failed { .. } => "listener_failed",
            ListenerError::Panicked { .. } => "listener_panicked",
            ListenerError::TimedOut { .. } => "listener_timed_out",
        }
    }

    /// Name of the listener that failed.
    pub fn listener(&self) -> &str {
        match self {
            ListenerError::Failed { listener, .. }
            | ListenerError::Panicked { listener, .. }
            | ListenerError::TimedOut { listener, .. } => listener,
        }
    }

    /// Heuristic severity of this failure.
    ///
    /// Panics are never reported below [`Severity::Medium`].
    pub fn severity(&self) -> Severity {
        match self {
            ListenerError::Failed { message, .. } => Severity::classify(message),
            ListenerError::Panicked { message, .. } => {
                Severity::classify(message).max(Severity::Medium)
            }
            ListenerError::TimedOut { .. } => Severity::Low,
        }
    }
}

/// Classification of sink failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeliveryErrorKind {
    NetworkUnavailable,
    Timeout,
    SinkUnavailable,
    SinkNotReady,
    MalformedRequest,
    Rejected,
    Other,
}

/// Transient failure causes; everything else is dropped after logging.
pub const RETRYABLE: &[DeliveryErrorKind] = &[
    DeliveryErrorKind::NetworkUnavailable,
    DeliveryErrorKind::Timeout,
    DeliveryErrorKind::SinkUnavailable,
    DeliveryErrorKind::SinkNotReady,
];

/// # Errors produced by telemetry sinks.
///
/// Never surfaced to the producer: the dispatcher retries, queues or drops.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// The sink could not be reached (DNS, connect, offline).
    #[error("network unavailable: {0}")]
    NetworkUnavailable(String),

    /// The request did not complete in time.
    #[error("delivery timed out after {after:?}")]
    Timeout {
        /// The configured request timeout.
        after: Duration,
    },

    /// The sink answered but is temporarily unable to accept events (5xx, 429).
    #[error("sink unavailable (status {status})")]
    SinkUnavailable {
        /// HTTP status (or vendor equivalent).
        status: u16,
    },

    /// The sink client or SDK is not initialized yet.
    #[error("sink not ready: {0}")]
    SinkNotReady(String),

    /// The request itself is invalid; retrying cannot help.
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    /// The sink permanently refused the events.
    #[error("rejected by sink (status {status})")]
    Rejected {
        /// HTTP status (or vendor equivalent).
        status: u16,
    },

    /// Any other failure.
    #[error("delivery failed: {0}")]
    Other(String),
}

impl DeliveryError {
    /// Returns the classification of this error.
    pub fn kind(&self) -> DeliveryErrorKind {
        match self {
            DeliveryError::NetworkUnavailable(_) => DeliveryErrorKind::NetworkUnavailable,
            DeliveryError::Timeout { .. } => DeliveryErrorKind::Timeout,
            DeliveryError::SinkUnavailable { .. } => DeliveryErrorKind::SinkUnavailable,
            DeliveryError::SinkNotReady(_) => DeliveryErrorKind::SinkNotReady,
            DeliveryError::MalformedRequest(_) => DeliveryErrorKind::MalformedRequest,
            DeliveryError::Rejected { .. } => DeliveryErrorKind::Rejected,
            DeliveryError::Other(_) => DeliveryErrorKind::Other,
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self.kind() {
            DeliveryErrorKind::NetworkUnavailable => "delivery_network_unavailable",
            DeliveryErrorKind::Timeout => "delivery_timeout",
            DeliveryErrorKind::SinkUnavailable => "delivery_sink_unavailable",
            DeliveryErrorKind::SinkNotReady => "delivery_sink_not_ready",
            DeliveryErrorKind::MalformedRequest => "delivery_malformed_request",
            DeliveryErrorKind::Rejected => "delivery_rejected",
            DeliveryErrorKind::Other => "delivery_other",
        }
    }

    /// Indicates whether the failure is transient and worth retrying.
    ///
    /// # Example
    /// ```
    /// use pulsebus::DeliveryError;
    ///
    /// assert!(DeliveryError::SinkUnavailable { status: 503 }.is_retryable());
    /// assert!(!DeliveryError::Rejected { status: 400 }.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        RETRYABLE.contains(&self.kind())
    }

    /// Maps an HTTP status code onto the taxonomy.
    ///
    /// Returns `None` for success codes.
    pub fn from_status(status: u16) -> Option<DeliveryError> {
        match status {
            200..=299 => None,
            408 => Some(DeliveryError::Timeout {
                after: Duration::ZERO,
            }),
            429 | 500..=599 => Some(DeliveryError::SinkUnavailable { status }),
            400 | 413 | 422 => Some(DeliveryError::MalformedRequest(format!(
                "sink answered {status}"
            ))),
            _ => Some(DeliveryError::Rejected { status }),
        }
    }
}
