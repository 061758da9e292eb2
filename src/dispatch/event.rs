//! Telemetry records handed to sinks.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One event as seen by the telemetry sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryEvent {
    /// Event name (`"cta_clicked"`).
    pub name: String,
    /// Flat property bag, `source` and `timestamp` included when known.
    pub properties: Map<String, Value>,
}

impl TelemetryEvent {
    /// Creates a telemetry event.
    pub fn new(name: impl Into<String>, properties: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            properties,
        }
    }
}
