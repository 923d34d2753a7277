// tests/store_persistence.rs
//
// Committed increments and the seen-ID set must survive a process restart
// (modeled as reopening the same database file).

use chrono::{Duration, TimeZone, Utc};
use tempfile::tempdir;

use trendwatch::store::TrendStore;

#[test]
fn scores_and_metadata_survive_reopen() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("trends.db");
    let t0 = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();

    {
        let store = TrendStore::open(&db).unwrap();
        store
            .increment_score("ai bubble", "AI Bubble [BBC]", "BBC", t0)
            .unwrap();
        store
            .increment_score("ai bubble", "ai bubble", "HackerNews", t0 + Duration::hours(1))
            .unwrap();
    }

    let store = TrendStore::open(&db).unwrap();
    let top = store
        .top_trends(5, Duration::hours(48), t0 + Duration::hours(2))
        .unwrap();
    assert_eq!(top.len(), 1);
    let r = &top[0];
    assert_eq!(r.score, 2);
    assert_eq!(r.first_seen, t0);
    assert_eq!(r.last_updated, t0 + Duration::hours(1));
    assert_eq!(r.display_titles, vec!["AI Bubble [BBC]", "ai bubble"]);
    assert_eq!(r.sources, vec!["BBC", "HackerNews"]);
}

#[test]
fn seen_ids_survive_reopen() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("trends.db");

    {
        let store = TrendStore::open(&db).unwrap();
        assert!(store.mark_seen("article-1").unwrap());
    }

    let store = TrendStore::open(&db).unwrap();
    assert!(
        !store.mark_seen("article-1").unwrap(),
        "an ID seen before the restart is still a duplicate after it"
    );
    assert!(store.mark_seen("article-2").unwrap());
    assert_eq!(store.seen_count().unwrap(), 2);
}

#[test]
fn open_creates_missing_parent_directories() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("nested/deeper/trends.db");
    let store = TrendStore::open(&db).unwrap();
    assert!(store.mark_seen("x").unwrap());
    assert!(db.exists());
}

#[test]
fn reopen_does_not_reset_schema_or_data() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("trends.db");
    let t0 = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();

    {
        let store = TrendStore::open(&db).unwrap();
        for i in 0..10 {
            store
                .increment_score("rust", "Rust is the future", "HN", t0 + Duration::minutes(i))
                .unwrap();
        }
    }
    // Opening runs migrations again; they must be no-ops on current data.
    let store = TrendStore::open(&db).unwrap();
    assert_eq!(store.score_of("rust").unwrap(), 10);
}
