//! # Event payloads.
//!
//! A [`Payload`] always carries a free-text `source` and an optional
//! `timestamp` (assigned by the bus when absent). Everything else lives in a
//! JSON object whose required keys are dictated by the event kind's schema.
//!
//! ## Example
//! ```rust
//! use pulsebus::Payload;
//!
//! let p = Payload::new("hero")
//!     .with("ctaLabel", "Start")
//!     .with("ctaUrl", "/start");
//!
//! assert_eq!(p.source(), "hero");
//! assert!(p.contains("ctaLabel"));
//! assert_eq!(p.timestamp(), None);
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Structured event payload.
///
/// Listeners receive it by shared reference only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timestamp: Option<u64>,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl Payload {
    /// Creates a payload with the given source and no extra fields.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            timestamp: None,
            fields: Map::new(),
        }
    }

    /// Attaches a field.
    #[inline]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Sets an explicit timestamp (ms since the Unix epoch).
    #[inline]
    pub fn with_timestamp(mut self, ms: u64) -> Self {
        self.timestamp = Some(ms);
        self
    }

    /// Origin identifier supplied by the producer.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Timestamp in ms, once assigned.
    pub fn timestamp(&self) -> Option<u64> {
        self.timestamp
    }

    /// Returns true if `key` is present (a JSON `null` counts as present).
    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Returns a field value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Extra fields, without `source` and `timestamp`.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Flattens the payload into telemetry properties, `source` and `timestamp` included.
    pub fn to_properties(&self) -> Map<String, Value> {
        let mut props = self.fields.clone();
        props.insert("source".to_string(), Value::from(self.source.clone()));
        if let Some(ts) = self.timestamp {
            props.insert("timestamp".to_string(), Value::from(ts));
        }
        props
    }

    pub(crate) fn stamp_if_missing(&mut self, ms: impl FnOnce() -> u64) {
        if self.timestamp.is_none() {
            self.timestamp = Some(ms());
        }
    }
}
