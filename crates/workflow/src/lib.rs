//! QaCache Workflow
//!
//! Embed, store, look up and fall back: the Q&A cache sequence over an
//! [`LlmClient`](qacache_llm::LlmClient) and a [`VectorStore`](qacache_vector::VectorStore)

mod dataset;
mod workflow;

pub use dataset::{load_pairs, resolve_pairs, sample_pairs, QaPair, DEFAULT_QUERY};
pub use workflow::{Answer, AnswerSource, QaWorkflow, RunReport, PROBE_TEXT};
