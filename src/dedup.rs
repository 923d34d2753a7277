// src/dedup.rs
// Two-layer admission gate: exact dedup by source-assigned ID, then the
// semantic key for everything that gets through.

use std::sync::Arc;

use crate::error::StorageError;
use crate::ingest::types::{DedupDecision, RawMention};
use crate::normalize::{normalize_with, parse_id_suffix, IdSuffixRules};
use crate::store::TrendStore;

#[derive(Clone)]
pub struct DedupGate {
    store: Arc<TrendStore>,
    rules: IdSuffixRules,
}

impl DedupGate {
    pub fn new(store: Arc<TrendStore>) -> Self {
        Self::with_rules(store, IdSuffixRules::default())
    }

    pub fn with_rules(store: Arc<TrendStore>, rules: IdSuffixRules) -> Self {
        Self { store, rules }
    }

    /// Decide whether a mention enters the scoring pipeline.
    ///
    /// An ID already in the seen set short-circuits to `ExactDuplicate` with
    /// no further work; otherwise the ID is recorded and the normalized
    /// semantic key is returned. The key comes from the display part of the
    /// raw string (embedded `[id] | source` tails never leak into it). The
    /// seen set is mutated on the accepted path only, atomically per ID, so
    /// repeated delivery of the same item across ticks cannot double-count.
    pub fn admit(&self, mention: &RawMention) -> Result<DedupDecision, StorageError> {
        if !self.store.mark_seen(&mention.source_id)? {
            return Ok(DedupDecision::ExactDuplicate);
        }
        let (display, _) = parse_id_suffix(&mention.raw_text);
        Ok(DedupDecision::Accepted(normalize_with(
            &display,
            &self.rules,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn mention(id: &str, text: &str) -> RawMention {
        RawMention {
            source_id: id.to_string(),
            raw_text: text.to_string(),
            source_name: "Test".to_string(),
            observed_at: Utc::now(),
        }
    }

    #[test]
    fn first_delivery_accepted_with_key() {
        let gate = DedupGate::new(Arc::new(TrendStore::open_in_memory().unwrap()));
        match gate.admit(&mention("id-1", "AI Bubble [BBC]")).unwrap() {
            DedupDecision::Accepted(key) => assert_eq!(key, "ai bubble"),
            other => panic!("expected Accepted, got {other:?}"),
        }
    }

    #[test]
    fn redelivery_is_exact_duplicate_regardless_of_text() {
        let gate = DedupGate::new(Arc::new(TrendStore::open_in_memory().unwrap()));
        gate.admit(&mention("id-1", "AI Bubble")).unwrap();
        let second = gate.admit(&mention("id-1", "completely different text")).unwrap();
        assert_eq!(second, DedupDecision::ExactDuplicate);
    }

    #[test]
    fn same_text_different_ids_both_accepted() {
        let gate = DedupGate::new(Arc::new(TrendStore::open_in_memory().unwrap()));
        let a = gate.admit(&mention("id-1", "ai bubble")).unwrap();
        let b = gate.admit(&mention("id-2", "AI Bubble [BBC]")).unwrap();
        assert_eq!(a, DedupDecision::Accepted("ai bubble".into()));
        assert_eq!(b, DedupDecision::Accepted("ai bubble".into()));
    }
}
