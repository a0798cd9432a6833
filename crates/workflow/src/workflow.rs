use qacache_common::{AppConfig, Result};
use qacache_llm::{answer_prompt, GenerateRequest, LlmClient};
use qacache_vector::{IndexSchema, QaRecord, SearchHit, VectorStore};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::dataset::QaPair;

/// Text embedded once to learn the model's dimension
pub const PROBE_TEXT: &str = "차원 확인 테스트";

/// Where an answer came from
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnswerSource {
    /// Nearest stored record, accepted regardless of distance
    Cache { key: String, score: Option<f32> },
    /// Fallback generation
    Generated,
}

/// Final answer to a query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    pub text: String,
    pub source: AnswerSource,
}

impl Answer {
    pub fn is_cache_hit(&self) -> bool {
        matches!(self.source, AnswerSource::Cache { .. })
    }
}

/// Result of a full run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub dimension: usize,
    pub loaded: usize,
    pub query: String,
    pub answer: Answer,
}

/// Sequential Q&A cache workflow: probe, provision, load, look up, fall back
///
/// Every external call is awaited before the next one starts.
pub struct QaWorkflow {
    llm: Arc<dyn LlmClient>,
    store: Arc<dyn VectorStore>,
    config: AppConfig,
}

impl QaWorkflow {
    pub fn new(llm: Arc<dyn LlmClient>, store: Arc<dyn VectorStore>, config: AppConfig) -> Self {
        Self { llm, store, config }
    }

    /// Execute every step for `pairs`, then answer `query`
    pub async fn run(&self, pairs: &[QaPair], query: &str) -> Result<RunReport> {
        // Phase 1: dimension probe
        let dimension = self
            .probe_dimension()
            .instrument(info_span!("probe"))
            .await?;

        // Phase 2: fresh index
        self.provision_index(dimension)
            .instrument(info_span!("provision", index = %self.config.index_name))
            .await?;

        // Phase 3: bulk load
        let loaded = self
            .bulk_load(pairs)
            .instrument(info_span!("bulk_load", pairs = pairs.len()))
            .await?;

        // Phase 4: lookup with fallback
        let answer = self.answer(query).instrument(info_span!("answer")).await?;

        Ok(RunReport {
            dimension,
            loaded,
            query: query.to_string(),
            answer,
        })
    }

    /// Embed text with the configured embedding model
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.llm.embed(&self.config.embedding_model, text).await
    }

    /// Embedding dimension of the configured model
    pub async fn probe_dimension(&self) -> Result<usize> {
        let dimension = self.embed(PROBE_TEXT).await?.len();
        info!("Embedding dimension: {} (model={})", dimension, self.config.embedding_model);
        Ok(dimension)
    }

    /// Drop any previous index (ignoring failures) and create a fresh one
    pub async fn provision_index(&self, dimension: usize) -> Result<IndexSchema> {
        let schema = IndexSchema::from_config(&self.config, dimension);

        if let Err(e) = self.store.drop_index(&schema.name, true).await {
            debug!("Ignoring drop failure for index {}: {}", schema.name, e);
        }

        self.store.create_index(&schema).await?;
        info!("Index {} ready - dim={}, metric={}", schema.name, schema.dim, schema.metric);
        Ok(schema)
    }

    /// Embed each question and write `<prefix><i>` records in order
    ///
    /// Stops at the first failure; records already written stay in place.
    pub async fn bulk_load(&self, pairs: &[QaPair]) -> Result<usize> {
        info!("Loading {} Q&A pairs into {}", pairs.len(), self.config.index_name);

        for (i, pair) in pairs.iter().enumerate() {
            let embedding = self.embed(&pair.question).await?;
            let record = QaRecord {
                key: self.config.record_key(i),
                embedding,
                answer: pair.answer.clone(),
            };
            self.store.upsert(&record).await?;
            debug!("Stored {}/{}: {}", i + 1, pairs.len(), record.key);
        }

        info!("Bulk load completed - {} records", pairs.len());
        Ok(pairs.len())
    }

    /// Nearest stored record for `query`, if the index returns any
    pub async fn lookup(&self, query: &str) -> Result<Option<SearchHit>> {
        let embedding = self.embed(query).await?;
        let hit = self
            .store
            .knn_search(&self.config.index_name, &embedding, 1)
            .await?
            .into_iter()
            .next();

        match &hit {
            Some(hit) => info!("Cache hit: {} (distance={:?})", hit.key, hit.score),
            None => info!("Cache miss: index {} returned no results", self.config.index_name),
        }

        Ok(hit)
    }

    /// Ask the generation model, optionally with retrieved context
    pub async fn generate_fallback(&self, question: &str, context: &str) -> Result<String> {
        let request = GenerateRequest::new(&self.config.llm_model, answer_prompt(question, context));
        info!("Generating answer with {}", self.config.llm_model);
        self.llm.generate(request).await
    }

    /// Stored answer on a hit, generated answer on a miss
    pub async fn answer(&self, query: &str) -> Result<Answer> {
        if let Some(hit) = self.lookup(query).await? {
            return Ok(Answer {
                text: hit.answer,
                source: AnswerSource::Cache {
                    key: hit.key,
                    score: hit.score,
                },
            });
        }

        warn!("No cached answer for query, falling back to generation");
        let text = self.generate_fallback(query, "").await?;
        Ok(Answer {
            text,
            source: AnswerSource::Generated,
        })
    }
}
