// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod config;
pub mod dedup;
pub mod error;
pub mod ingest;
pub mod metrics;
pub mod normalize;
pub mod rank;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::api::create_router;
pub use crate::dedup::DedupGate;
pub use crate::error::{ConfigurationError, SourceError, StorageError};
pub use crate::ingest::{
    DedupDecision, PollerConfig, PollerHandle, RawMention, TrendPoller, TrendSource,
};
pub use crate::store::{TrendScoreRecord, TrendStore};
