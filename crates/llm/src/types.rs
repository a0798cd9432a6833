use serde::{Deserialize, Serialize};

/// Ollama embedding request (`/api/embeddings`)
#[derive(Debug, Clone, Serialize)]
pub struct EmbedRequest {
    /// Embedding model name (e.g., "nomic-embed-text")
    pub model: String,

    /// Text to embed
    pub prompt: String,
}

/// Ollama embedding response
///
/// `embedding` is optional so a reply without it can be reported
/// instead of failing inside serde.
#[derive(Debug, Clone, Deserialize)]
pub struct EmbedResponse {
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
}

/// Ollama generate request (`/api/generate`)
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    /// Model name (e.g., "llama3.2:3b")
    pub model: String,

    /// Fully composed prompt
    pub prompt: String,

    /// Always false here: one non-streamed reply
    pub stream: bool,
}

impl GenerateRequest {
    /// Non-streaming request for `model`
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            stream: false,
        }
    }
}

/// Ollama generate response
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse {
    /// Generated text
    #[serde(default)]
    pub response: Option<String>,

    /// Whether generation is complete
    #[serde(default)]
    pub done: bool,
}
