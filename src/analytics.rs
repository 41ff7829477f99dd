use serde_json::{json, Value};
use tracing::debug;

/// Fire-and-forget event capture. No ordering or delivery guarantee.
pub trait Analytics: Send + Sync {
    fn capture(&self, event: &str, properties: Value);
}

/// Drops every event. Used in tests and when no capture key is configured.
pub struct NoopAnalytics;

impl Analytics for NoopAnalytics {
    fn capture(&self, _event: &str, _properties: Value) {}
}

/// PostHog capture client. Events are posted from a spawned task, so callers
/// never block on the analytics backend; send failures are logged and dropped.
/// Must be used from within a tokio runtime.
pub struct Posthog {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl Posthog {
    pub fn new(http: reqwest::Client, api_key: impl Into<String>, host: &str) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            endpoint: format!("{}/capture/", host.trim_end_matches('/')),
        }
    }
}

impl Analytics for Posthog {
    fn capture(&self, event: &str, properties: Value) {
        let payload = json!({
            "api_key": self.api_key,
            "event": event,
            "properties": properties,
        });
        let http = self.http.clone();
        let endpoint = self.endpoint.clone();
        tokio::spawn(async move {
            if let Err(e) = http.post(&endpoint).json(&payload).send().await {
                debug!(error = %e, "analytics capture dropped");
            }
        });
    }
}
