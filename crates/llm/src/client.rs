use qacache_common::{QaCacheError, Result};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use tracing::{debug, info};

use crate::prompts::GENERATION_FALLBACK;
use crate::types::{EmbedRequest, EmbedResponse, GenerateRequest, GenerateResponse};

/// Embedding endpoint path
pub const EMBEDDINGS_PATH: &str = "/api/embeddings";

/// Generation endpoint path
pub const GENERATE_PATH: &str = "/api/generate";

/// Ollama API client
///
/// One `reqwest::Client` for the process lifetime; library default timeouts.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
    client: Client,
}

impl OllamaClient {
    /// Create new Ollama client
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = Client::builder()
            .build()
            .map_err(|e| QaCacheError::network(format!("Failed to create HTTP client: {}", e)))?;

        info!("Ollama client initialized: {}", base_url);
        Ok(Self { base_url, client })
    }

    /// Base URL without trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL of an API path
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Generate embedding for text
    ///
    /// Fails when the reply has no `embedding` field; the error carries the raw body.
    pub async fn embed(&self, model: impl Into<String>, text: impl Into<String>) -> Result<Vec<f32>> {
        let url = self.endpoint(EMBEDDINGS_PATH);
        let request = EmbedRequest {
            model: model.into(),
            prompt: text.into(),
        };

        debug!(
            "Generating embedding - Model: {}, Text length: {}",
            request.model,
            request.prompt.len()
        );

        let (status, body) = self.post_json(&url, &request).await?;
        let embedding = parse_embed_body(status, &body)?;

        debug!("Received embedding - Dimension: {}", embedding.len());
        Ok(embedding)
    }

    /// Generate a single non-streamed answer
    pub async fn generate(&self, request: GenerateRequest) -> Result<String> {
        let url = self.endpoint(GENERATE_PATH);

        debug!(
            "Sending generate request to Ollama - Model: {}, Prompt length: {}",
            request.model,
            request.prompt.len()
        );

        let (status, body) = self.post_json(&url, &request).await?;
        let text = parse_generate_body(status, &body)?;

        debug!("Received response from Ollama - Length: {}", text.len());
        Ok(text)
    }

    async fn post_json<T: Serialize>(&self, url: &str, body: &T) -> Result<(StatusCode, String)> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| QaCacheError::network(format!("Failed to send request to {}: {}", url, e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| QaCacheError::network(format!("Failed to read response body: {}", e)))?;

        Ok((status, text))
    }
}

/// Extract the embedding vector from an `/api/embeddings` reply body
///
/// Status is only used for the error message; a non-2xx reply without
/// `embedding` fails the same way a malformed 200 does.
pub fn parse_embed_body(status: StatusCode, body: &str) -> Result<Vec<f32>> {
    let result: EmbedResponse = serde_json::from_str(body).map_err(|e| {
        QaCacheError::llm(format!(
            "Failed to parse embedding response ({}): {}: {}",
            status, e, body
        ))
    })?;

    match result.embedding {
        Some(embedding) if !embedding.is_empty() => Ok(embedding),
        Some(_) => Err(QaCacheError::llm(format!(
            "Empty embedding from Ollama ({}): {}",
            status, body
        ))),
        None => Err(QaCacheError::llm(format!(
            "Ollama embedding error response ({}): {}",
            status, body
        ))),
    }
}

/// Extract the generated text from an `/api/generate` reply body
///
/// A reply without `response` yields [`GENERATION_FALLBACK`]; the text is
/// otherwise returned untouched.
pub fn parse_generate_body(status: StatusCode, body: &str) -> Result<String> {
    let result: GenerateResponse = serde_json::from_str(body).map_err(|e| {
        QaCacheError::llm(format!(
            "Failed to parse generate response ({}): {}: {}",
            status, e, body
        ))
    })?;

    match result.response {
        Some(text) => {
            debug!("Generation finished - done: {}", result.done);
            Ok(text)
        }
        None => {
            tracing::warn!("Generate reply without response field ({}): {}", status, body);
            Ok(GENERATION_FALLBACK.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = OllamaClient::new("http://localhost:11434/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:11434");
    }

    #[test]
    fn test_endpoints() {
        let client = OllamaClient::new("http://localhost:11434/").unwrap();
        assert_eq!(client.endpoint(EMBEDDINGS_PATH), "http://localhost:11434/api/embeddings");
        assert_eq!(client.endpoint(GENERATE_PATH), "http://localhost:11434/api/generate");
    }

    #[test]
    fn test_parse_embed_body() {
        let embedding = parse_embed_body(StatusCode::OK, r#"{"embedding":[0.5,-1.0,2.25]}"#).unwrap();
        assert_eq!(embedding, vec![0.5, -1.0, 2.25]);
    }

    #[test]
    fn test_parse_embed_body_missing_field_fails_loudly() {
        let body = r#"{"error":"model \"nomic-embed-text\" not found, try pulling it first"}"#;
        let err = parse_embed_body(StatusCode::NOT_FOUND, body).unwrap_err();

        assert!(matches!(err, QaCacheError::Llm(_)));
        assert!(err.to_string().contains("not found, try pulling it first"));
        assert!(err.to_string().contains("404"));
    }

    #[test]
    fn test_parse_embed_body_rejects_empty_and_garbage() {
        assert!(parse_embed_body(StatusCode::OK, r#"{"embedding":[]}"#).is_err());
        assert!(parse_embed_body(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>").is_err());
    }

    #[test]
    fn test_parse_generate_body_verbatim() {
        let body = r#"{"model":"llama3.2:3b","response":"  서울입니다.\n","done":true}"#;
        assert_eq!(parse_generate_body(StatusCode::OK, body).unwrap(), "  서울입니다.\n");
    }

    #[test]
    fn test_parse_generate_body_missing_response() {
        let body = r#"{"error":"model requires more system memory"}"#;
        assert_eq!(
            parse_generate_body(StatusCode::INTERNAL_SERVER_ERROR, body).unwrap(),
            GENERATION_FALLBACK
        );
    }
}
