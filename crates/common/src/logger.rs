use crate::config::AppConfig;
use crate::error::QaCacheError;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// Log file name inside the configured log directory
pub const LOG_FILE_NAME: &str = "qacache.log";

/// Span lifecycle events written by both layers; the workflow phases are spans
pub const SPAN_EVENTS: FmtSpan = FmtSpan::CLOSE;

/// HTTP plumbing is chatty at debug level
const QUIET_DEPENDENCIES: &[&str] = &["hyper=warn", "reqwest=warn", "redis=info"];

/// Initialize logging to console and `<log_dir>/qacache.log`
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn setup_logging(config: &AppConfig) -> Result<PathBuf, QaCacheError> {
    let (log_file, log_file_path) = open_log_file(&config.log_dir)?;

    let console_layer = fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_span_events(SPAN_EVENTS)
        .with_filter(build_env_filter(&config.log_level));

    // No ANSI colour codes in the file
    let file_layer = fmt::layer()
        .with_writer(Mutex::new(log_file))
        .with_target(true)
        .with_line_number(true)
        .with_ansi(false)
        .with_span_events(SPAN_EVENTS)
        .with_filter(build_env_filter(&config.log_level));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| QaCacheError::config(format!("Failed to install log subscriber: {}", e)))?;

    tracing::info!(
        "Logging initialized: level={}, log_file={}",
        config.log_level,
        log_file_path.display()
    );

    Ok(log_file_path)
}

fn open_log_file(log_dir: &Path) -> Result<(File, PathBuf), QaCacheError> {
    std::fs::create_dir_all(log_dir).map_err(|e| {
        QaCacheError::config(format!(
            "Failed to create log directory {}: {}",
            log_dir.display(),
            e
        ))
    })?;

    let path = log_dir.join(LOG_FILE_NAME);
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| {
            QaCacheError::config(format!("Failed to open log file {}: {}", path.display(), e))
        })?;

    Ok((file, path))
}

/// Filter from `RUST_LOG`, else the configured level plus dependency overrides
fn build_env_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(log_level)))
}

fn default_directives(log_level: &str) -> String {
    let level = parse_log_level(log_level).to_string().to_lowercase();
    std::iter::once(level.as_str())
        .chain(QUIET_DEPENDENCIES.iter().copied())
        .collect::<Vec<_>>()
        .join(",")
}

/// Parse string to tracing Level
pub fn parse_log_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!("Invalid log level '{}', defaulting to INFO", level);
            Level::INFO
        }
    }
}
