// src/ingest/scheduler.rs
// The polling loop: fetch each source with a timeout, route every mention
// through the admission gate and the score store, then wait out the interval
// unless a stop arrives first. No error path terminates the loop; only the
// stop signal does.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::dedup::DedupGate;
use crate::ingest::types::{DedupDecision, RawMention, TrendSource};
use crate::rank::{self, RankQuery};
use crate::store::TrendStore;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("poll_ticks_total", "Completed scheduler ticks.");
        describe_counter!("poll_fetched_total", "Mentions fetched across all sources.");
        describe_counter!("poll_new_total", "Mentions accepted and scored.");
        describe_counter!("poll_duplicates_total", "Mentions dropped as exact duplicates.");
        describe_counter!("poll_source_errors_total", "Source fetch errors or timeouts.");
        describe_counter!("poll_mention_errors_total", "Per-mention processing failures.");
        describe_gauge!("poll_last_tick_ts", "Unix ts of the last completed tick.");
    });
}

#[derive(Clone, Copy, Debug)]
pub struct PollerConfig {
    pub interval: Duration,
    pub fetch_timeout: Duration,
    /// How many trends the per-tick summary log includes.
    pub summary_limit: usize,
    pub window_hours: i64,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            fetch_timeout: Duration::from_secs(10),
            summary_limit: rank::DEFAULT_LIMIT,
            window_hours: rank::DEFAULT_WINDOW_HOURS,
        }
    }
}

/// Per-tick counters, logged at the end of every tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickStats {
    pub fetched: usize,
    pub new: usize,
    pub duplicates: usize,
    pub source_errors: usize,
    pub mention_errors: usize,
}

enum MentionOutcome {
    Scored { key: String, score: i64 },
    Duplicate,
    EmptyKey,
}

/// Run one full pass over all sources.
///
/// A fetch error or timeout is contained to its source; a processing error
/// is contained to its mention. Later sources and mentions always run.
pub async fn run_tick(
    sources: &[Box<dyn TrendSource>],
    gate: &DedupGate,
    store: &TrendStore,
    fetch_timeout: Duration,
) -> TickStats {
    let mut stats = TickStats::default();

    for source in sources {
        let batch = match tokio::time::timeout(fetch_timeout, source.fetch()).await {
            Ok(Ok(batch)) => batch,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, source = source.name(), "source fetch failed");
                counter!("poll_source_errors_total").increment(1);
                stats.source_errors += 1;
                continue;
            }
            Err(_) => {
                tracing::warn!(
                    source = source.name(),
                    timeout_secs = fetch_timeout.as_secs(),
                    "source fetch timed out"
                );
                counter!("poll_source_errors_total").increment(1);
                stats.source_errors += 1;
                continue;
            }
        };

        stats.fetched += batch.len();
        for mention in &batch {
            match process_mention(gate, store, mention) {
                Ok(MentionOutcome::Scored { key, score }) => {
                    stats.new += 1;
                    tracing::info!(key = %key, score, source = %mention.source_name, "trend scored");
                }
                Ok(MentionOutcome::Duplicate) => {
                    stats.duplicates += 1;
                    tracing::debug!(id = %mention.source_id, "duplicate mention ignored");
                }
                Ok(MentionOutcome::EmptyKey) => {
                    tracing::debug!(id = %mention.source_id, "mention normalized to empty key");
                }
                Err(e) => {
                    stats.mention_errors += 1;
                    tracing::warn!(error = %e, id = %mention.source_id, "mention processing failed");
                    counter!("poll_mention_errors_total").increment(1);
                }
            }
        }
    }

    counter!("poll_fetched_total").increment(stats.fetched as u64);
    counter!("poll_new_total").increment(stats.new as u64);
    counter!("poll_duplicates_total").increment(stats.duplicates as u64);
    stats
}

fn process_mention(
    gate: &DedupGate,
    store: &TrendStore,
    mention: &RawMention,
) -> Result<MentionOutcome, crate::error::StorageError> {
    let key = match gate.admit(mention)? {
        DedupDecision::ExactDuplicate => return Ok(MentionOutcome::Duplicate),
        DedupDecision::Accepted(key) if key.is_empty() => return Ok(MentionOutcome::EmptyKey),
        DedupDecision::Accepted(key) => key,
    };

    let (display, _) = crate::normalize::parse_id_suffix(&mention.raw_text);
    let title = if display.is_empty() {
        mention.raw_text.as_str()
    } else {
        display.as_str()
    };

    let record = store.increment_score(&key, title, &mention.source_name, Utc::now())?;
    Ok(MentionOutcome::Scored {
        key: record.key,
        score: record.score,
    })
}

pub struct TrendPoller {
    sources: Vec<Box<dyn TrendSource>>,
    gate: DedupGate,
    store: Arc<TrendStore>,
    cfg: PollerConfig,
}

/// Handle to a spawned poller. `stop()` wakes a waiting loop immediately;
/// `shutdown()` additionally joins the task, letting an in-flight tick
/// finish first.
pub struct PollerHandle {
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl PollerHandle {
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    pub async fn shutdown(self) {
        self.stop();
        let _ = self.handle.await;
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl TrendPoller {
    pub fn new(
        sources: Vec<Box<dyn TrendSource>>,
        gate: DedupGate,
        store: Arc<TrendStore>,
        cfg: PollerConfig,
    ) -> Self {
        Self {
            sources,
            gate,
            store,
            cfg,
        }
    }

    /// Start the loop on a background task and return its handle.
    pub fn spawn(self) -> PollerHandle {
        let (stop_tx, stop_rx) = watch::channel(false);
        let handle = tokio::spawn(self.run(stop_rx));
        PollerHandle { stop_tx, handle }
    }

    async fn run(self, mut stop_rx: watch::Receiver<bool>) {
        ensure_metrics_described();
        tracing::info!(
            interval_secs = self.cfg.interval.as_secs(),
            sources = self.sources.len(),
            "trend poller running"
        );

        let mut tick_no: u64 = 0;
        loop {
            // Stop requests land here between ticks, never mid-increment.
            if *stop_rx.borrow() {
                break;
            }
            tick_no += 1;
            tracing::debug!(target: "poller", tick = tick_no, "tick start");

            let stats = run_tick(
                &self.sources,
                &self.gate,
                self.store.as_ref(),
                self.cfg.fetch_timeout,
            )
            .await;

            counter!("poll_ticks_total").increment(1);
            gauge!("poll_last_tick_ts").set(Utc::now().timestamp().max(0) as f64);
            tracing::info!(
                target: "poller",
                tick = tick_no,
                fetched = stats.fetched,
                new = stats.new,
                duplicates = stats.duplicates,
                source_errors = stats.source_errors,
                mention_errors = stats.mention_errors,
                "tick complete"
            );

            self.log_top_trends(tick_no);

            // Interruptible wait: a pending stop wakes the loop immediately
            // instead of after the full interval.
            tokio::select! {
                _ = stop_rx.changed() => break,
                _ = tokio::time::sleep(self.cfg.interval) => {}
            }
        }

        tracing::info!("trend poller stopped");
    }

    fn log_top_trends(&self, tick_no: u64) {
        let query = RankQuery {
            limit: self.cfg.summary_limit,
            window_hours: self.cfg.window_hours,
        };
        match rank::top_trends(self.store.as_ref(), &query, Utc::now()) {
            Ok(rows) if rows.is_empty() => {}
            Ok(rows) => match serde_json::to_string(&rows) {
                Ok(json) => {
                    tracing::info!(target: "poller", tick = tick_no, top_trends = %json, "top trends snapshot")
                }
                Err(e) => tracing::warn!(error = %e, "serializing top trends snapshot"),
            },
            Err(e) => tracing::warn!(error = %e, "ranking snapshot failed"),
        }
    }
}
