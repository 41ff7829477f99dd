use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use super::sse::SseDecoder;
use super::{LlmClient, ObjectStream};
use crate::config::OpenAiConfig;

#[derive(Debug, Error)]
pub enum OpenAiError {
    #[error("provider returned status {status}: {body}")]
    Provider {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Streaming structured-generation client for the OpenAI chat completions API.
pub struct OpenAiClient {
    http: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiClient {
    pub fn new(http: reqwest::Client, config: OpenAiConfig) -> Self {
        Self { http, config }
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn stream_object(
        &self,
        prompt: &str,
        schema: serde_json::Value,
    ) -> anyhow::Result<ObjectStream> {
        let body = json!({
            "model": self.config.model,
            "stream": true,
            "messages": [{ "role": "user", "content": prompt }],
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": "extracted_data",
                    "schema": schema,
                },
            },
        });

        let resp = self
            .http
            .post(self.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(OpenAiError::Request)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(OpenAiError::Provider { status, body }.into());
        }

        // Relay decoded content deltas; the SSE framing stays on this side.
        let (tx, rx) = futures::channel::mpsc::unbounded();
        let mut upstream = resp.bytes_stream();
        tokio::spawn(async move {
            let mut decoder = SseDecoder::new();
            while let Some(chunk) = upstream.next().await {
                match chunk {
                    Ok(bytes) => {
                        for delta in decoder.feed(&bytes) {
                            if tx.unbounded_send(Ok(Bytes::from(delta))).is_err() {
                                // Receiver dropped; stop reading.
                                return;
                            }
                        }
                    }
                    Err(e) => {
                        error!(error = %e, "llm stream error");
                        let _ = tx.unbounded_send(Err(e.into()));
                        return;
                    }
                }
            }
        });

        Ok(rx.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OpenAiConfig;

    #[test]
    fn completions_url_strips_trailing_slash() {
        let client = OpenAiClient::new(
            reqwest::Client::new(),
            OpenAiConfig {
                api_key: "k".into(),
                model: "gpt-4".into(),
                base_url: "https://api.openai.com/v1/".into(),
            },
        );
        assert_eq!(
            client.completions_url(),
            "https://api.openai.com/v1/chat/completions"
        );
    }
}
