// tests/ingest_e2e.rs
//
// End to end through the spawned poller with the mock source: several ticks
// of noisy input leave a deduplicated, scored store behind.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use trendwatch::dedup::DedupGate;
use trendwatch::ingest::mock::MockTrendSource;
use trendwatch::ingest::{PollerConfig, TrendPoller, TrendSource};
use trendwatch::store::TrendStore;

#[tokio::test]
async fn mock_source_ticks_accumulate_deduplicated_scores() {
    let store = Arc::new(TrendStore::open_in_memory().unwrap());
    let gate = DedupGate::new(store.clone());
    let sources: Vec<Box<dyn TrendSource>> = vec![Box::new(MockTrendSource::new())];

    let cfg = PollerConfig {
        interval: Duration::from_millis(10),
        fetch_timeout: Duration::from_secs(5),
        ..PollerConfig::default()
    };
    let handle = TrendPoller::new(sources, gate, store.clone(), cfg).spawn();
    tokio::time::sleep(Duration::from_millis(200)).await;
    handle.shutdown().await;

    let seen = store.seen_count().unwrap();
    assert!(seen >= 4, "several distinct IDs seen, got {seen}");

    let top = store
        .top_trends(10, chrono::Duration::hours(48), Utc::now())
        .unwrap();
    assert!(!top.is_empty());

    // The pool item replayed every tick counted exactly once.
    assert_eq!(store.score_of("ai is taking over").unwrap(), 1);

    // Fresh "Viral Topic #N" mentions all share one semantic key, so its
    // score tracks the number of minted mentions, not one.
    assert!(store.score_of("viral topic").unwrap() >= 1);
}
