// src/ingest/mod.rs
pub mod mock;
pub mod providers;
pub mod scheduler;
pub mod types;

pub use scheduler::{run_tick, PollerConfig, PollerHandle, TickStats, TrendPoller};
pub use types::{DedupDecision, RawMention, TrendSource};
