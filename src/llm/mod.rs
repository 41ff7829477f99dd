use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

mod openai;
mod sse;

pub use openai::OpenAiClient;

/// Partial structured-output text, delivered as it arrives from the provider.
pub type ObjectStream = BoxStream<'static, anyhow::Result<Bytes>>;

/// A hosted model that can stream a JSON object conforming to a schema.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn stream_object(
        &self,
        prompt: &str,
        schema: serde_json::Value,
    ) -> anyhow::Result<ObjectStream>;
}
