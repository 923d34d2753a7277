// tests/ingest_dedup.rs
//
// The two dedup layers end to end: exact-ID idempotence across repeated
// deliveries, and semantic aggregation of differently worded mentions.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rand::seq::SliceRandom;

use trendwatch::dedup::DedupGate;
use trendwatch::error::SourceError;
use trendwatch::ingest::{run_tick, RawMention, TrendSource};
use trendwatch::store::TrendStore;

struct ScriptedSource {
    name: &'static str,
    batches: Mutex<Vec<Vec<RawMention>>>,
}

impl ScriptedSource {
    fn new(name: &'static str, batches: Vec<Vec<RawMention>>) -> Self {
        Self {
            name,
            batches: Mutex::new(batches),
        }
    }
}

#[async_trait]
impl TrendSource for ScriptedSource {
    async fn fetch(&self) -> Result<Vec<RawMention>, SourceError> {
        let mut guard = self.batches.lock().unwrap();
        if guard.is_empty() {
            Ok(Vec::new())
        } else {
            Ok(guard.remove(0))
        }
    }
    fn name(&self) -> &str {
        self.name
    }
}

fn mention(id: &str, text: &str, source: &str) -> RawMention {
    RawMention {
        source_id: id.to_string(),
        raw_text: text.to_string(),
        source_name: source.to_string(),
        observed_at: Utc::now(),
    }
}

#[tokio::test]
async fn same_source_id_counts_once_across_many_ticks() {
    let store = Arc::new(TrendStore::open_in_memory().unwrap());
    let gate = DedupGate::new(store.clone());

    // The same article re-announced in every tick, in randomized positions
    // among other items.
    let mut rng = rand::rng();
    let batches: Vec<Vec<RawMention>> = (0..5)
        .map(|tick| {
            let mut batch = vec![
                mention("article-1", "AI Bubble [BBC]", "BBC"),
                mention(&format!("filler-{tick}"), &format!("Filler story {tick}"), "BBC"),
            ];
            batch.shuffle(&mut rng);
            batch
        })
        .collect();

    let sources: Vec<Box<dyn TrendSource>> =
        vec![Box::new(ScriptedSource::new("BBC", batches))];
    for _ in 0..5 {
        run_tick(&sources, &gate, &store, Duration::from_secs(5)).await;
    }

    assert_eq!(store.score_of("ai bubble").unwrap(), 1);
}

#[tokio::test]
async fn different_wordings_aggregate_to_one_trend() {
    let store = Arc::new(TrendStore::open_in_memory().unwrap());
    let gate = DedupGate::new(store.clone());

    let batches = vec![vec![
        mention("bbc-77", "AI Bubble [BBC]", "BBC"),
        mention("hn-41", "ai bubble", "HackerNews"),
    ]];
    let sources: Vec<Box<dyn TrendSource>> =
        vec![Box::new(ScriptedSource::new("mixed", batches))];
    let stats = run_tick(&sources, &gate, &store, Duration::from_secs(5)).await;

    assert_eq!(stats.new, 2);
    assert_eq!(store.score_of("ai bubble").unwrap(), 2);

    let top = store
        .top_trends(5, chrono::Duration::hours(48), Utc::now())
        .unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].display_titles, vec!["AI Bubble", "ai bubble"]);
    assert_eq!(top[0].sources, vec!["BBC", "HackerNews"]);
}

#[tokio::test]
async fn score_never_decreases_over_arbitrary_sequences() {
    let store = Arc::new(TrendStore::open_in_memory().unwrap());
    let gate = DedupGate::new(store.clone());

    let mut last = 0;
    for round in 0..20 {
        // A mix of fresh IDs and redeliveries of round 0's ID.
        let batch = vec![
            mention(&format!("id-{round}"), "Coffee Prices Skyrocket", "BBC"),
            mention("id-0", "Coffee prices skyrocket!", "BBC"),
        ];
        let sources: Vec<Box<dyn TrendSource>> =
            vec![Box::new(ScriptedSource::new("BBC", vec![batch]))];
        run_tick(&sources, &gate, &store, Duration::from_secs(5)).await;

        let score = store.score_of("coffee prices skyrocket").unwrap();
        assert!(score >= last, "score regressed: {last} -> {score}");
        last = score;
    }
    // One accepted mention per round; every "id-0" redelivery is dropped
    // (round 0 even carries it twice in the same batch).
    assert_eq!(last, 20);
}
