// src/ingest/mock.rs
// Deterministic stand-in source for local runs without network access.
// Replays a noisy pool of recurring mentions (exercising exact dedup) and
// periodically mints a brand-new one.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;

use crate::error::SourceError;
use crate::ingest::types::{RawMention, TrendSource};

const STATIC_POOL: &[(&str, &str)] = &[
    ("mock-1", "AI is taking over! | peaking"),
    ("mock-2", "Python 4.0 released? | emerging"),
    ("mock-3", "New framework drops | emerging"),
    ("mock-4", "Tabs vs Spaces debate heating up | declining"),
    ("mock-5", "Coffee prices skyrocket | peaking"),
    ("mock-6", "Rust is the future | emerging"),
    ("mock-7", "Vim vs Emacs eternal war | declining"),
];

pub struct MockTrendSource {
    fetches: AtomicU64,
}

impl MockTrendSource {
    pub fn new() -> Self {
        Self {
            fetches: AtomicU64::new(0),
        }
    }
}

impl Default for MockTrendSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TrendSource for MockTrendSource {
    async fn fetch(&self) -> Result<Vec<RawMention>, SourceError> {
        let n = self.fetches.fetch_add(1, Ordering::Relaxed);
        let now = Utc::now();

        // Two recurring mentions from the rotating pool per fetch.
        let mut out: Vec<RawMention> = (0..2)
            .map(|i| {
                let (id, text) = STATIC_POOL[((n as usize) + i) % STATIC_POOL.len()];
                RawMention {
                    source_id: id.to_string(),
                    raw_text: text.to_string(),
                    source_name: self.name().to_string(),
                    observed_at: now,
                }
            })
            .collect();

        // Every other fetch also mints a never-seen mention.
        if n % 2 == 0 {
            out.push(RawMention {
                source_id: format!("mock-fresh-{n}"),
                raw_text: format!("Viral Topic #{n} [f{n:04x}] | Mock"),
                source_name: self.name().to_string(),
                observed_at: now,
            });
        }

        Ok(out)
    }

    fn name(&self) -> &str {
        "Mock"
    }
}
