//! QaCache Vector Store
//!
//! RediSearch client for Q&A records. The `test-util` feature adds an
//! in-process FLAT index with the same contract for tests.

mod codec;
#[cfg(any(test, feature = "test-util"))]
mod memory_store;
mod redis_store;
#[cfg(any(test, feature = "test-util"))]
mod similarity;
mod store;
mod types;

pub use codec::{bytes_to_embedding, embedding_to_bytes};
#[cfg(any(test, feature = "test-util"))]
pub use memory_store::MemoryVectorStore;
pub use redis_store::{knn_query, parse_search_reply, score_field, RedisVectorStore};
#[cfg(any(test, feature = "test-util"))]
pub use similarity::{cosine_similarity, distance};
pub use store::VectorStore;
pub use types::{IndexSchema, QaRecord, SearchHit, TEXT_FIELD, VECTOR_FIELD};
