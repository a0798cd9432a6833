use qacache_common::{AppConfig, DistanceMetric};
use serde::{Deserialize, Serialize};

/// Name of the vector field in every record
pub const VECTOR_FIELD: &str = "embedding";

/// Name of the answer text field in every record
pub const TEXT_FIELD: &str = "value";

/// Search index definition: one FLAT FLOAT32 vector field and one text field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSchema {
    /// Index name
    pub name: String,

    /// Vector dimension, fixed at creation
    pub dim: usize,

    /// Distance metric of the vector field
    pub metric: DistanceMetric,
}

impl IndexSchema {
    pub fn new(name: impl Into<String>, dim: usize, metric: DistanceMetric) -> Self {
        Self {
            name: name.into(),
            dim,
            metric,
        }
    }

    /// Schema for the configured index at `dim` dimensions
    pub fn from_config(config: &AppConfig, dim: usize) -> Self {
        Self::new(config.index_name.clone(), dim, config.distance_metric)
    }
}

/// One stored question/answer record
#[derive(Debug, Clone, PartialEq)]
pub struct QaRecord {
    /// Hash key, e.g. `doc:0`
    pub key: String,

    /// Question embedding
    pub embedding: Vec<f32>,

    /// Answer text
    pub answer: String,
}

/// Nearest-neighbour search hit
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    /// Hash key of the matched record
    pub key: String,

    /// Stored answer text
    pub answer: String,

    /// Store-reported vector distance (lower is closer for COSINE and L2)
    pub score: Option<f32>,
}
