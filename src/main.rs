//! Trendwatch — Binary Entrypoint
//! Boots the polling scheduler and the Axum read API, wiring shared state
//! and shutdown.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use trendwatch::api::{self, AppState};
use trendwatch::config::AppConfig;
use trendwatch::dedup::DedupGate;
use trendwatch::ingest::mock::MockTrendSource;
use trendwatch::ingest::providers::rss::RssSource;
use trendwatch::ingest::{TrendPoller, TrendSource};
use trendwatch::metrics::Metrics;
use trendwatch::store::TrendStore;

/// Structured JSON logs by default; set TRENDWATCH_LOG_PLAIN=1 for a compact
/// human-readable form during local development.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("trendwatch=info,poller=info,warn"));

    let plain = std::env::var("TRENDWATCH_LOG_PLAIN")
        .ok()
        .is_some_and(|v| v == "1");

    if plain {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    }
}

fn build_sources(cfg: &AppConfig) -> Vec<Box<dyn TrendSource>> {
    if cfg.sources.is_empty() {
        tracing::info!("no sources configured, falling back to the mock source");
        return vec![Box::new(MockTrendSource::new())];
    }
    cfg.sources
        .iter()
        .map(|s| Box::new(RssSource::from_url(&s.name, &s.url)) as Box<dyn TrendSource>)
        .collect()
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = AppConfig::load().context("loading configuration")?;
    let metrics = Metrics::init();

    let store = Arc::new(TrendStore::open(&cfg.db_path).context("opening trend store")?);
    let rules = cfg
        .id_suffix_rules()
        .context("compiling id-suffix pattern")?;
    let gate = DedupGate::with_rules(store.clone(), rules);

    let poller = TrendPoller::new(build_sources(&cfg), gate, store.clone(), cfg.poller_config());
    let handle = poller.spawn();

    let app = api::create_router(AppState::new(store.clone())).merge(metrics.router());
    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr)
        .await
        .with_context(|| format!("binding {}", cfg.bind_addr))?;
    tracing::info!(addr = %cfg.bind_addr, "http server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server")?;

    // Let an in-flight tick finish before exiting.
    handle.shutdown().await;
    match store.seen_count() {
        Ok(n) => tracing::info!(total_seen = n, "trend poller stopped cleanly"),
        Err(e) => tracing::warn!(error = %e, "reading seen count at shutdown"),
    }
    Ok(())
}
