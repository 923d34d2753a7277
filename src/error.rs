// src/error.rs
// Error taxonomy for the ingestion engine. Source and storage failures are
// recovered locally by the scheduler; configuration failures are returned to
// the caller.

use thiserror::Error;

/// Fetch/parse failure for a single source. Never fatal: the scheduler logs
/// it and treats the source as having produced zero mentions this tick.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("feed parse error: {0}")]
    Parse(String),
    #[error("fetch timed out after {0}s")]
    Timeout(u64),
}

/// Persistence read/write failure. Recovered at per-mention granularity;
/// a failed increment leaves the prior committed record intact.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("metadata serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("timestamp parse error: {0}")]
    Timestamp(String),
}

/// Malformed configuration or query arguments. Surfaced to the caller as a
/// rejected request, not swallowed.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("limit must be between 1 and {max}, got {got}")]
    InvalidLimit { got: usize, max: usize },
    #[error("window_hours must be between 1 and {max}, got {got}")]
    InvalidWindow { got: i64, max: i64 },
    #[error("reading config from {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("parsing config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid id-suffix pattern: {0}")]
    Pattern(#[from] regex::Error),
}
