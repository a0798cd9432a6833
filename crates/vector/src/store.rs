use async_trait::async_trait;
use qacache_common::Result;

use crate::types::{IndexSchema, QaRecord, SearchHit};

/// Vector-capable key-value store
///
/// Mirrors the handful of RediSearch operations the workflow needs.
/// Implementations do not validate record dimensions against the index.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Drop an index, optionally deleting the documents it covers.
    /// Errors when the index does not exist.
    async fn drop_index(&self, name: &str, delete_documents: bool) -> Result<()>;

    /// Create an index; errors when one with the same name exists
    async fn create_index(&self, schema: &IndexSchema) -> Result<()>;

    /// Write a record under its key, replacing any previous one
    async fn upsert(&self, record: &QaRecord) -> Result<()>;

    /// `k` nearest records to `embedding`, closest first
    async fn knn_search(&self, index: &str, embedding: &[f32], k: usize) -> Result<Vec<SearchHit>>;

    /// Stored answer for a key, if the record exists
    async fn fetch_answer(&self, key: &str) -> Result<Option<String>>;
}
