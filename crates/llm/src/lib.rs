//! QaCache LLM Integration
//!
//! Ollama embedding and generation client

mod client;
mod llm_trait;
mod prompts;
mod types;

pub use client::{parse_embed_body, parse_generate_body, OllamaClient, EMBEDDINGS_PATH, GENERATE_PATH};
pub use llm_trait::LlmClient;
pub use prompts::{answer_prompt, GENERATION_FALLBACK};
pub use types::{EmbedRequest, EmbedResponse, GenerateRequest, GenerateResponse};
