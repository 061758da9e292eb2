//! # HTTP sink.
//!
//! Posts batches as JSON to a collector endpoint:
//!
//! ```text
//! POST <endpoint>
//! content-type: application/json
//!
//! { "events": [ { "name": "cta_clicked", "properties": { ... } } ] }
//! ```
//!
//! Response mapping (see [`DeliveryError::from_status`]):
//! - `2xx` → delivered
//! - `408`, `429`, `5xx` → retryable
//! - other `4xx` → permanent
//!
//! Transport failures (`connect`, request timeout) map onto the retryable
//! [`DeliveryError::NetworkUnavailable`] and [`DeliveryError::Timeout`].

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::dispatch::event::TelemetryEvent;
use crate::dispatch::sink::TelemetrySink;
use crate::error::DeliveryError;

#[derive(Serialize)]
struct Envelope<'a> {
    events: &'a [TelemetryEvent],
}

/// Sink that posts JSON batches with `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpSink {
    client: reqwest::Client,
    endpoint: String,
    timeout: Option<Duration>,
}

impl HttpSink {
    /// Creates a sink for `endpoint` with an optional per-request timeout.
    pub fn new(endpoint: impl Into<String>, timeout: Option<Duration>) -> Result<Self, DeliveryError> {
        let mut builder = reqwest::Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        let client = builder
            .build()
            .map_err(|e| DeliveryError::Other(format!("http client init failed: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            timeout,
        })
    }

    /// Collector URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn map_transport(&self, err: reqwest::Error) -> DeliveryError {
        if err.is_timeout() {
            DeliveryError::Timeout {
                after: self.timeout.unwrap_or_default(),
            }
        } else if err.is_connect() || err.is_request() {
            DeliveryError::NetworkUnavailable(err.to_string())
        } else if err.is_builder() {
            DeliveryError::MalformedRequest(err.to_string())
        } else {
            DeliveryError::Other(err.to_string())
        }
    }
}

#[async_trait]
impl TelemetrySink for HttpSink {
    async fn deliver(&self, batch: &[TelemetryEvent]) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&Envelope { events: batch })
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        match DeliveryError::from_status(response.status().as_u16()) {
            None => Ok(()),
            Some(err) => Err(err),
        }
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::Method::POST;
    use httpmock::MockServer;
    use serde_json::{Map, json};

    fn batch() -> Vec<TelemetryEvent> {
        let mut props = Map::new();
        props.insert("ctaLabel".into(), json!("Join"));
        vec![TelemetryEvent::new("cta_clicked", props)]
    }

    #[tokio::test]
    async fn posts_envelope_and_accepts_2xx() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/collect")
                .header("content-type", "application/json")
                .body_contains("\"events\"")
                .body_contains("\"name\":\"cta_clicked\"")
                .body_contains("\"ctaLabel\":\"Join\"");
            then.status(202);
        });

        let sink = HttpSink::new(server.url("/collect"), Some(Duration::from_secs(2))).unwrap();
        sink.deliver(&batch()).await.unwrap();

        mock.assert();
    }

    #[tokio::test]
    async fn maps_server_errors_to_retryable() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/collect");
            then.status(503);
        });

        let sink = HttpSink::new(server.url("/collect"), None).unwrap();
        let err = sink.deliver(&batch()).await.unwrap_err();

        assert_eq!(err, DeliveryError::SinkUnavailable { status: 503 });
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn maps_client_errors_to_permanent() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/collect");
            then.status(401);
        });

        let sink = HttpSink::new(server.url("/collect"), None).unwrap();
        let err = sink.deliver(&batch()).await.unwrap_err();

        assert_eq!(err, DeliveryError::Rejected { status: 401 });
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_network_unavailable() {
        // Port 9 (discard) on localhost is not expected to accept connections.
        let sink = HttpSink::new("http://127.0.0.1:9/collect", Some(Duration::from_secs(2))).unwrap();
        let err = sink.deliver(&batch()).await.unwrap_err();

        assert!(err.is_retryable(), "unexpected error: {err:?}");
    }
}
