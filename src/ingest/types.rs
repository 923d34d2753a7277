// src/ingest/types.rs
use chrono::{DateTime, Utc};

use crate::error::SourceError;

/// One raw item from a source, consumed once per tick. `source_id` is the
/// adapter-scoped unique identifier used for exact dedup.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct RawMention {
    pub source_id: String,
    pub raw_text: String,
    pub source_name: String, // e.g., "HackerNews", "BBC"
    pub observed_at: DateTime<Utc>,
}

/// Outcome of the admission gate for one mention. `ExactDuplicate` is an
/// expected, silent outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DedupDecision {
    Accepted(String),
    ExactDuplicate,
}

#[async_trait::async_trait]
pub trait TrendSource: Send + Sync {
    /// Fetch the current batch of mentions. Adapters own their network
    /// timeout so a single call cannot hang indefinitely.
    async fn fetch(&self) -> Result<Vec<RawMention>, SourceError>;
    fn name(&self) -> &str;
}
