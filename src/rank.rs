// src/rank.rs
// Read-side selection over the score store: recency-gated, score-sorted
// top-N. Validation failures surface to the caller instead of being
// swallowed.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{ConfigurationError, StorageError};
use crate::store::{TrendScoreRecord, TrendStore};

pub const DEFAULT_LIMIT: usize = 5;
pub const DEFAULT_WINDOW_HOURS: i64 = 48;
pub const MAX_LIMIT: usize = 100;
pub const MAX_WINDOW_HOURS: i64 = 24 * 365;

#[derive(Debug, Error)]
pub enum RankError {
    #[error(transparent)]
    Config(#[from] ConfigurationError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RankQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default = "default_window_hours")]
    pub window_hours: i64,
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}
fn default_window_hours() -> i64 {
    DEFAULT_WINDOW_HOURS
}

impl Default for RankQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            window_hours: DEFAULT_WINDOW_HOURS,
        }
    }
}

impl RankQuery {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.limit == 0 || self.limit > MAX_LIMIT {
            return Err(ConfigurationError::InvalidLimit {
                got: self.limit,
                max: MAX_LIMIT,
            });
        }
        if self.window_hours <= 0 || self.window_hours > MAX_WINDOW_HOURS {
            return Err(ConfigurationError::InvalidWindow {
                got: self.window_hours,
                max: MAX_WINDOW_HOURS,
            });
        }
        Ok(())
    }
}

/// Externally consumable row of the ranking query.
#[derive(Debug, Clone, Serialize)]
pub struct TrendSummary {
    pub key: String,
    pub display_title: String,
    pub score: i64,
    pub sources: Vec<String>,
    pub last_updated: DateTime<Utc>,
}

impl From<TrendScoreRecord> for TrendSummary {
    fn from(r: TrendScoreRecord) -> Self {
        let display_title = r
            .display_titles
            .first()
            .cloned()
            .unwrap_or_else(|| r.key.clone());
        Self {
            key: r.key,
            display_title,
            score: r.score,
            sources: r.sources,
            last_updated: r.last_updated,
        }
    }
}

/// The ranking query surface: validates, selects within the window, maps to
/// summaries. No mutation; safe to call while a tick is in flight.
pub fn top_trends(
    store: &TrendStore,
    query: &RankQuery,
    now: DateTime<Utc>,
) -> Result<Vec<TrendSummary>, RankError> {
    query.validate()?;
    let window = Duration::hours(query.window_hours);
    let records = store.top_trends(query.limit, window, now)?;
    Ok(records.into_iter().map(TrendSummary::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_limit_is_rejected() {
        let q = RankQuery {
            limit: 0,
            window_hours: 48,
        };
        assert!(matches!(
            q.validate(),
            Err(ConfigurationError::InvalidLimit { .. })
        ));
    }

    #[test]
    fn non_positive_window_is_rejected() {
        let q = RankQuery {
            limit: 5,
            window_hours: 0,
        };
        assert!(matches!(
            q.validate(),
            Err(ConfigurationError::InvalidWindow { .. })
        ));
    }

    #[test]
    fn defaults_are_valid() {
        assert!(RankQuery::default().validate().is_ok());
    }

    #[test]
    fn summary_uses_first_title_seen() {
        let store = TrendStore::open_in_memory().unwrap();
        let now = Utc::now();
        store
            .increment_score("ai bubble", "AI Bubble [BBC]", "BBC", now)
            .unwrap();
        store
            .increment_score("ai bubble", "ai bubble", "HackerNews", now)
            .unwrap();

        let rows = top_trends(&store, &RankQuery::default(), now).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].display_title, "AI Bubble [BBC]");
        assert_eq!(rows[0].score, 2);
    }
}
