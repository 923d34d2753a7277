// src/store.rs
// The single persistence boundary: the exact-dedup seen-ID set and the
// trend score aggregates, both in one SQLite database. All mutation goes
// through these operations; callers never touch the tables directly.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

use crate::error::StorageError;

pub const SCHEMA_VERSION: i64 = 1;

const SCHEMA_V1: &str = "
CREATE TABLE IF NOT EXISTS seen_ids (
    source_id TEXT PRIMARY KEY
);
CREATE TABLE IF NOT EXISTS trend_scores (
    trend_key    TEXT PRIMARY KEY,
    score        INTEGER NOT NULL DEFAULT 1,
    first_seen   TEXT NOT NULL,
    last_updated TEXT NOT NULL,
    sources_json TEXT NOT NULL DEFAULT '[]',
    titles_json  TEXT NOT NULL DEFAULT '[]'
);
CREATE INDEX IF NOT EXISTS idx_trend_scores_last_updated
    ON trend_scores (last_updated);
";

/// Durable aggregate for one normalized trend key.
///
/// `score` counts accepted (non-exact-duplicate) mentions and never
/// decreases. `first_seen` is set once at creation; `last_updated` is
/// overwritten on every increment, so `first_seen <= last_updated` always.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendScoreRecord {
    pub key: String,
    pub score: i64,
    pub display_titles: Vec<String>,
    pub sources: Vec<String>,
    pub first_seen: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

pub struct TrendStore {
    conn: Mutex<Connection>,
}

impl TrendStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        if let Some(dir) = path.as_ref().parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)?;
            }
        }
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StorageError> {
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.migrate()?;
        Ok(store)
    }

    /// Step the schema forward via `PRAGMA user_version`, never dropping
    /// existing data.
    fn migrate(&self) -> Result<(), StorageError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let mut current: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
        if current < 1 {
            conn.execute_batch(SCHEMA_V1)?;
            conn.pragma_update(None, "user_version", 1)?;
            current = 1;
        }
        debug_assert_eq!(current, SCHEMA_VERSION);
        Ok(())
    }

    /// Record `source_id` as seen. Returns `true` when the ID was not seen
    /// before (the caller should process the mention) and `false` for an
    /// exact duplicate. One `INSERT OR IGNORE` under the connection lock, so
    /// two near-simultaneous deliveries of the same ID cannot both win.
    pub fn mark_seen(&self, source_id: &str) -> Result<bool, StorageError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO seen_ids (source_id) VALUES (?1)",
            params![source_id],
        )?;
        Ok(inserted == 1)
    }

    /// Size of the exact-dedup set. The set is append-only and grows without
    /// bound; logged at shutdown for visibility.
    pub fn seen_count(&self) -> Result<i64, StorageError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        Ok(conn.query_row("SELECT COUNT(*) FROM seen_ids", [], |row| row.get(0))?)
    }

    /// Apply one accepted mention to the aggregate for `key`.
    ///
    /// Creates the record with `score = 1` or increments the existing one,
    /// merging `display_title` and `source_name` into their sets (insertion
    /// order preserved, no duplicate growth). The whole update is one SQLite
    /// transaction: a fault rolls back and leaves the prior committed record
    /// intact. Returns the post-update record.
    pub fn increment_score(
        &self,
        key: &str,
        display_title: &str,
        source_name: &str,
        now: DateTime<Utc>,
    ) -> Result<TrendScoreRecord, StorageError> {
        let mut conn = self.conn.lock().expect("store mutex poisoned");
        let tx = conn.transaction()?;

        let existing = tx
            .query_row(
                "SELECT score, first_seen, sources_json, titles_json
                 FROM trend_scores WHERE trend_key = ?1",
                params![key],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        let record = match existing {
            Some((score, first_seen, sources_json, titles_json)) => {
                let mut sources: Vec<String> = serde_json::from_str(&sources_json)?;
                let mut titles: Vec<String> = serde_json::from_str(&titles_json)?;
                push_unique(&mut sources, source_name);
                push_unique(&mut titles, display_title);

                tx.execute(
                    "UPDATE trend_scores
                     SET score = ?2, last_updated = ?3, sources_json = ?4, titles_json = ?5
                     WHERE trend_key = ?1",
                    params![
                        key,
                        score + 1,
                        ts_to_sql(now),
                        serde_json::to_string(&sources)?,
                        serde_json::to_string(&titles)?,
                    ],
                )?;

                TrendScoreRecord {
                    key: key.to_string(),
                    score: score + 1,
                    display_titles: titles,
                    sources,
                    first_seen: ts_from_sql(&first_seen)?,
                    last_updated: now,
                }
            }
            None => {
                let sources = vec![source_name.to_string()];
                let titles = vec![display_title.to_string()];
                tx.execute(
                    "INSERT INTO trend_scores
                     (trend_key, score, first_seen, last_updated, sources_json, titles_json)
                     VALUES (?1, 1, ?2, ?2, ?3, ?4)",
                    params![
                        key,
                        ts_to_sql(now),
                        serde_json::to_string(&sources)?,
                        serde_json::to_string(&titles)?,
                    ],
                )?;
                TrendScoreRecord {
                    key: key.to_string(),
                    score: 1,
                    display_titles: titles,
                    sources,
                    first_seen: now,
                    last_updated: now,
                }
            }
        };

        tx.commit()?;
        Ok(record)
    }

    /// Time-windowed, score-sorted selection. Records whose `last_updated`
    /// falls outside the window are excluded entirely (hard recency gate, not
    /// a decay). Ties on score break by `last_updated` descending. Read-only,
    /// safe to call concurrently with ingestion.
    pub fn top_trends(
        &self,
        limit: usize,
        window: chrono::Duration,
        now: DateTime<Utc>,
    ) -> Result<Vec<TrendScoreRecord>, StorageError> {
        let cutoff = ts_to_sql(now - window);
        let conn = self.conn.lock().expect("store mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT trend_key, score, first_seen, last_updated, sources_json, titles_json
             FROM trend_scores
             WHERE last_updated >= ?1
             ORDER BY score DESC, last_updated DESC
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![cutoff, limit as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (key, score, first_seen, last_updated, sources_json, titles_json) = row?;
            out.push(TrendScoreRecord {
                key,
                score,
                display_titles: serde_json::from_str(&titles_json)?,
                sources: serde_json::from_str(&sources_json)?,
                first_seen: ts_from_sql(&first_seen)?,
                last_updated: ts_from_sql(&last_updated)?,
            });
        }
        Ok(out)
    }

    /// Current score for `key`, 0 when absent.
    pub fn score_of(&self, key: &str) -> Result<i64, StorageError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        Ok(conn
            .query_row(
                "SELECT score FROM trend_scores WHERE trend_key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?
            .unwrap_or(0))
    }
}

fn push_unique(set: &mut Vec<String>, value: &str) {
    if !value.is_empty() && !set.iter().any(|v| v == value) {
        set.push(value.to_string());
    }
}

// Fixed-width RFC 3339 with "Z" so stored timestamps compare correctly as
// text in SQL.
fn ts_to_sql(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn ts_from_sql(s: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::Timestamp(format!("{s:?}: {e}")))
}
