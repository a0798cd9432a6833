use async_trait::async_trait;
use qacache_common::{QaCacheError, Result};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use tracing::debug;

use crate::codec::{bytes_to_embedding, embedding_to_bytes};
use crate::similarity::distance;
use crate::store::VectorStore;
use crate::types::{IndexSchema, QaRecord, SearchHit};

/// Hash as written by `HSET`: packed vector blob plus answer text
#[derive(Debug, Clone)]
struct StoredHash {
    blob: Vec<u8>,
    answer: String,
}

#[derive(Debug, Default)]
struct MemoryState {
    hashes: BTreeMap<String, StoredHash>,
    indexes: HashMap<String, IndexSchema>,
}

/// In-process store with RediSearch FLAT semantics
///
/// Every index covers every hash (no key prefix), and a hash whose blob
/// does not match the index dimension is left out of search results, as
/// RediSearch does.
#[derive(Debug, Default)]
pub struct MemoryVectorStore {
    state: RwLock<MemoryState>,
}

impl MemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored hashes
    pub async fn len(&self) -> usize {
        self.state.read().await.hashes.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Whether an index with this name exists
    pub async fn has_index(&self, name: &str) -> bool {
        self.state.read().await.indexes.contains_key(name)
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn drop_index(&self, name: &str, delete_documents: bool) -> Result<()> {
        let mut state = self.state.write().await;
        if state.indexes.remove(name).is_none() {
            return Err(QaCacheError::vector_store("Unknown Index name"));
        }
        if delete_documents {
            state.hashes.clear();
        }
        Ok(())
    }

    async fn create_index(&self, schema: &IndexSchema) -> Result<()> {
        let mut state = self.state.write().await;
        if state.indexes.contains_key(&schema.name) {
            return Err(QaCacheError::vector_store("Index already exists"));
        }
        state.indexes.insert(schema.name.clone(), schema.clone());
        Ok(())
    }

    async fn upsert(&self, record: &QaRecord) -> Result<()> {
        let mut state = self.state.write().await;
        state.hashes.insert(
            record.key.clone(),
            StoredHash {
                blob: embedding_to_bytes(&record.embedding),
                answer: record.answer.clone(),
            },
        );
        Ok(())
    }

    async fn knn_search(&self, index: &str, embedding: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        let state = self.state.read().await;
        let schema = state
            .indexes
            .get(index)
            .ok_or_else(|| QaCacheError::vector_store(format!("{}: no such index", index)))?;

        if embedding.len() != schema.dim {
            return Err(QaCacheError::vector_store(format!(
                "Error parsing vector similarity query: query vector blob size ({}) does not match index's expected size ({}).",
                embedding.len() * 4,
                schema.dim * 4
            )));
        }

        let mut scored = Vec::new();
        for (key, hash) in &state.hashes {
            let stored = bytes_to_embedding(&hash.blob)?;
            if stored.len() != schema.dim {
                debug!("{} not indexed: dimension {} != {}", key, stored.len(), schema.dim);
                continue;
            }
            scored.push((distance(schema.metric, embedding, &stored), key, hash));
        }

        scored.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(b.1)));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(score, key, hash)| SearchHit {
                key: key.clone(),
                answer: hash.answer.clone(),
                score: Some(score),
            })
            .collect())
    }

    async fn fetch_answer(&self, key: &str) -> Result<Option<String>> {
        let state = self.state.read().await;
        Ok(state.hashes.get(key).map(|hash| hash.answer.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qacache_common::DistanceMetric;

    fn record(key: &str, embedding: Vec<f32>, answer: &str) -> QaRecord {
        QaRecord {
            key: key.to_string(),
            embedding,
            answer: answer.to_string(),
        }
    }

    async fn store_with_index(dim: usize) -> MemoryVectorStore {
        let store = MemoryVectorStore::new();
        store
            .create_index(&IndexSchema::new("qa_index", dim, DistanceMetric::Cosine))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_drop_missing_index_errors() {
        let store = MemoryVectorStore::new();
        assert!(store.drop_index("qa_index", true).await.is_err());
    }

    #[tokio::test]
    async fn test_create_twice_errors() {
        let store = store_with_index(2).await;
        let again = store
            .create_index(&IndexSchema::new("qa_index", 2, DistanceMetric::Cosine))
            .await;
        assert!(again.is_err());
    }

    #[tokio::test]
    async fn test_empty_index_returns_no_hits() {
        let store = store_with_index(2).await;
        let hits = store.knn_search("qa_index", &[1.0, 0.0], 1).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_nearest_neighbour() {
        let store = store_with_index(2).await;
        store.upsert(&record("doc:0", vec![1.0, 0.0], "east")).await.unwrap();
        store.upsert(&record("doc:1", vec![0.0, 1.0], "north")).await.unwrap();

        let hits = store.knn_search("qa_index", &[0.1, 0.9], 1).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].key, "doc:1");
        assert_eq!(hits[0].answer, "north");

        let hits = store.knn_search("qa_index", &[0.1, 0.9], 5).await.unwrap();
        assert_eq!(hits.iter().map(|h| h.key.as_str()).collect::<Vec<_>>(), ["doc:1", "doc:0"]);
    }

    #[tokio::test]
    async fn test_upsert_last_write_wins() {
        let store = store_with_index(2).await;
        store.upsert(&record("doc:0", vec![1.0, 0.0], "old")).await.unwrap();
        store.upsert(&record("doc:0", vec![1.0, 0.0], "new")).await.unwrap();

        assert_eq!(store.len().await, 1);
        assert_eq!(store.fetch_answer("doc:0").await.unwrap().as_deref(), Some("new"));
        assert_eq!(store.fetch_answer("doc:1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_mismatched_dimension_not_indexed() {
        let store = store_with_index(2).await;
        store.upsert(&record("doc:0", vec![1.0, 0.0, 0.0], "wrong dim")).await.unwrap();

        assert_eq!(store.len().await, 1);
        assert!(store.knn_search("qa_index", &[1.0, 0.0], 1).await.unwrap().is_empty());
        assert!(store.knn_search("qa_index", &[1.0, 0.0, 0.0], 1).await.is_err());
    }

    #[tokio::test]
    async fn test_drop_with_documents_clears_hashes() {
        let store = store_with_index(2).await;
        store.upsert(&record("doc:0", vec![1.0, 0.0], "a")).await.unwrap();

        store.drop_index("qa_index", true).await.unwrap();
        assert!(store.is_empty().await);
        assert!(!store.has_index("qa_index").await);
    }
}
