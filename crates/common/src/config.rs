use crate::error::QaCacheError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Distance metric of the index vector field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistanceMetric {
    Cosine,
    L2,
    Ip,
}

impl DistanceMetric {
    /// RediSearch spelling of the metric
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cosine => "COSINE",
            Self::L2 => "L2",
            Self::Ip => "IP",
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistanceMetric {
    type Err = QaCacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "COSINE" => Ok(Self::Cosine),
            "L2" => Ok(Self::L2),
            "IP" => Ok(Self::Ip),
            other => Err(QaCacheError::config(format!(
                "Unknown distance metric '{}' (expected COSINE, L2 or IP)",
                other
            ))),
        }
    }
}

/// QaCache application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Redis connection URL
    pub redis_url: String,

    /// Ollama API base URL
    pub ollama_base_url: String,

    /// Embedding model name
    pub embedding_model: String,

    /// Answer generation model name
    pub llm_model: String,

    /// Search index name
    pub index_name: String,

    /// Hash key prefix for stored Q&A records
    pub key_prefix: String,

    /// Distance metric of the vector field
    pub distance_metric: DistanceMetric,

    /// Optional JSON dataset replacing the built-in sample pairs
    pub dataset_path: Option<PathBuf>,

    /// Log directory
    pub log_dir: PathBuf,

    /// Log level
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379".to_string(),
            ollama_base_url: "http://localhost:11434".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            llm_model: "llama3.2:3b".to_string(),
            index_name: "qa_index".to_string(),
            key_prefix: "doc:".to_string(),
            distance_metric: DistanceMetric::Cosine,
            dataset_path: None,
            log_dir: PathBuf::from("./log"),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and .env file
    pub fn from_env() -> Result<Self, QaCacheError> {
        // Load .env file (ignore if not exists)
        let _ = dotenv::dotenv();

        let defaults = Self::default();

        let distance_metric = match std::env::var("QA_DISTANCE_METRIC") {
            Ok(value) => value.parse()?,
            Err(_) => defaults.distance_metric,
        };

        let config = Self {
            redis_url: std::env::var("REDIS_URL").unwrap_or(defaults.redis_url),
            ollama_base_url: std::env::var("OLLAMA_BASE_URL")
                .unwrap_or(defaults.ollama_base_url),
            embedding_model: std::env::var("EMBEDDING_MODEL")
                .unwrap_or(defaults.embedding_model),
            llm_model: std::env::var("LLM_MODEL").unwrap_or(defaults.llm_model),
            index_name: std::env::var("QA_INDEX_NAME").unwrap_or(defaults.index_name),
            key_prefix: std::env::var("QA_KEY_PREFIX").unwrap_or(defaults.key_prefix),
            distance_metric,
            dataset_path: Self::get_env_path("QA_DATASET_PATH"),
            log_dir: Self::get_env_path("LOG_DIR").unwrap_or(defaults.log_dir),
            log_level: std::env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
        };

        config.validate()?;

        Ok(config)
    }

    /// Get PathBuf from environment variable
    fn get_env_path(key: &str) -> Option<PathBuf> {
        std::env::var(key).ok().map(PathBuf::from)
    }

    /// Hash key for the record at `index` in the loaded dataset
    pub fn record_key(&self, index: usize) -> String {
        format!("{}{}", self.key_prefix, index)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), QaCacheError> {
        if !self.ollama_base_url.starts_with("http://")
            && !self.ollama_base_url.starts_with("https://") {
            return Err(QaCacheError::config(
                "Ollama base URL must start with http:// or https://"
            ));
        }

        if !self.redis_url.starts_with("redis://")
            && !self.redis_url.starts_with("rediss://") {
            return Err(QaCacheError::config(
                "Redis URL must start with redis:// or rediss://"
            ));
        }

        if self.embedding_model.is_empty() || self.llm_model.is_empty() {
            return Err(QaCacheError::config("Model names cannot be empty"));
        }

        if self.index_name.is_empty() {
            return Err(QaCacheError::config("Index name cannot be empty"));
        }

        Ok(())
    }
}
