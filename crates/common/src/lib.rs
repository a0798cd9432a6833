pub mod config;
pub mod error;
pub mod logger;

// Re-export commonly used types
pub use config::{AppConfig, DistanceMetric};
pub use error::QaCacheError;
pub type Result<T> = std::result::Result<T, QaCacheError>;
