use qacache_common::Result;
use crate::client::OllamaClient;
use crate::types::GenerateRequest;
use async_trait::async_trait;

/// Common trait for embedding and generation backends
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate text from a prompt
    async fn generate(&self, request: GenerateRequest) -> Result<String>;

    /// Generate embedding for text
    async fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>>;
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn generate(&self, request: GenerateRequest) -> Result<String> {
        OllamaClient::generate(self, request).await
    }

    async fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>> {
        OllamaClient::embed(self, model, text).await
    }
}
