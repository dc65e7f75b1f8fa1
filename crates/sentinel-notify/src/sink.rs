//! Pluggable notification sinks (spec §4.11): queue, webhook, no-op, and
//! fan-out.

use crate::event::Event;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// A sink delivery failure. Always logged by the dispatcher, never
/// surfaced to the mutating caller (spec §4.11 "Dispatch semantics").
#[derive(Debug, Error)]
pub enum SinkError {
    /// The queue publisher backend rejected the message.
    #[error("queue publish failed: {0}")]
    Queue(String),
    /// The webhook endpoint returned a non-retryable status or retries
    /// were exhausted.
    #[error("webhook delivery failed: {0}")]
    Webhook(String),
    /// Two or more fan-out children failed; each message is preserved.
    #[error("{0} of {1} sinks failed: {2}")]
    FanOut(usize, usize, String),
}

/// A notification destination. Implementations must not block the
/// triggering store mutation — the dispatcher spawns delivery, it does not
/// call `publish` inline on the mutation path.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Deliver `event` to this sink.
    ///
    /// # Errors
    /// Returns [`SinkError`] on delivery failure. The dispatcher logs and
    /// swallows this; it must never propagate to the store caller.
    async fn publish(&self, event: &Event) -> Result<(), SinkError>;
}

/// Abstraction over an SNS-style message queue publish call. The concrete
/// cloud SDK is out of scope; this is the seam a deployment wires a real
/// backend into.
#[async_trait]
pub trait QueuePublisher: Send + Sync {
    /// Publish `body` with the given filterable message attributes.
    ///
    /// # Errors
    /// Implementation-defined backend failure.
    async fn publish(&self, body: String, attributes: HashMap<String, String>) -> Result<(), String>;
}

/// Publishes a JSON message with a filterable `event_type` attribute equal
/// to the event's dotted type string.
pub struct QueueSink {
    publisher: Arc<dyn QueuePublisher>,
}

impl QueueSink {
    /// Wrap a queue publisher backend.
    #[must_use]
    pub fn new(publisher: Arc<dyn QueuePublisher>) -> Self {
        Self { publisher }
    }
}

#[async_trait]
impl Sink for QueueSink {
    async fn publish(&self, event: &Event) -> Result<(), SinkError> {
        let body = serde_json::to_string(event).map_err(|e| SinkError::Queue(e.to_string()))?;
        let mut attrs = HashMap::new();
        attrs.insert("event_type".to_string(), event.event_type.clone());
        self.publisher.publish(body, attrs).await.map_err(SinkError::Queue)
    }
}

/// HTTP POST delivery with `Content-Type: application/json` and
/// `X-Sentinel-Event: <event_type>`. Retries on 5xx and transport errors
/// with exponential backoff (`base · 2^(attempt-1)`); never retries 4xx.
pub struct WebhookSink {
    url: url::Url,
    client: reqwest::Client,
    max_retries: u32,
    base_delay: Duration,
}

impl WebhookSink {
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
    /// Default maximum retry attempts after the first.
    pub const DEFAULT_MAX_RETRIES: u32 = 3;
    /// Default base backoff delay.
    pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

    /// Construct a webhook sink targeting `url`.
    ///
    /// # Errors
    /// Returns an error if `url` is empty or fails to parse as a URI.
    pub fn new(url: impl AsRef<str>) -> Result<Self, SinkError> {
        let raw = url.as_ref();
        if raw.trim().is_empty() {
            return Err(SinkError::Webhook("webhook URL must not be empty".to_string()));
        }
        let parsed = url::Url::parse(raw).map_err(|e| SinkError::Webhook(format!("invalid webhook URL: {e}")))?;
        let client = reqwest::Client::builder()
            .timeout(Self::DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| SinkError::Webhook(e.to_string()))?;
        Ok(Self { url: parsed, client, max_retries: Self::DEFAULT_MAX_RETRIES, base_delay: Self::DEFAULT_BASE_DELAY })
    }

    /// Override the default retry count and base delay.
    #[must_use]
    pub fn with_retry(mut self, max_retries: u32, base_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.base_delay = base_delay;
        self
    }
}

#[async_trait]
impl Sink for WebhookSink {
    async fn publish(&self, event: &Event) -> Result<(), SinkError> {
        let body = serde_json::to_vec(event).map_err(|e| SinkError::Webhook(e.to_string()))?;
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let result = self
                .client
                .post(self.url.clone())
                .header("Content-Type", "application/json")
                .header("X-Sentinel-Event", event.event_type.clone())
                .body(body.clone())
                .send()
                .await;

            match result {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        return Ok(());
                    }
                    if status.is_client_error() {
                        return Err(SinkError::Webhook(format!("non-retryable status {status}")));
                    }
                    if attempt > self.max_retries {
                        return Err(SinkError::Webhook(format!("exhausted retries, last status {status}")));
                    }
                }
                Err(e) => {
                    if attempt > self.max_retries {
                        return Err(SinkError::Webhook(format!("transport error: {e}")));
                    }
                    warn!(attempt, error = %e, "webhook delivery attempt failed, retrying");
                }
            }

            let delay = self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1));
            tokio::time::sleep(delay).await;
        }
    }
}

/// A sink that always succeeds without delivering anywhere, for
/// disabled-notifications mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

#[async_trait]
impl Sink for NoopSink {
    async fn publish(&self, _event: &Event) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Invokes each child sink in sequence, collecting errors into a joined
/// message rather than short-circuiting on the first failure.
pub struct FanOutSink {
    children: Vec<Arc<dyn Sink>>,
}

impl FanOutSink {
    /// Construct a fan-out over `children`, filtering out `None` entries.
    #[must_use]
    pub fn new(children: Vec<Option<Arc<dyn Sink>>>) -> Self {
        Self { children: children.into_iter().flatten().collect() }
    }
}

#[async_trait]
impl Sink for FanOutSink {
    async fn publish(&self, event: &Event) -> Result<(), SinkError> {
        let mut failures = Vec::new();
        for child in &self.children {
            if let Err(e) = child.publish(event).await {
                failures.push(e.to_string());
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(SinkError::FanOut(failures.len(), self.children.len(), failures.join("; ")))
        }
    }
}
