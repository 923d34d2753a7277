// src/config.rs
// Configuration: TOML file (env-selectable path) with env-var overrides for
// the scalar knobs. Missing file means defaults; a malformed file is an
// error the caller sees.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigurationError;
use crate::ingest::PollerConfig;
use crate::normalize::IdSuffixRules;
use crate::rank;

pub const ENV_CONFIG_PATH: &str = "TRENDWATCH_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config/trendwatch.toml";

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SourceConfig {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub db_path: String,
    pub interval_secs: u64,
    pub fetch_timeout_secs: u64,
    pub window_hours: i64,
    pub summary_limit: usize,
    pub bind_addr: String,
    /// Override for the normalizer's trailing-ID grammar.
    pub id_suffix_pattern: Option<String>,
    pub sources: Vec<SourceConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: "data/trends.db".to_string(),
            interval_secs: 30,
            fetch_timeout_secs: 10,
            window_hours: rank::DEFAULT_WINDOW_HOURS,
            summary_limit: rank::DEFAULT_LIMIT,
            bind_addr: "127.0.0.1:8000".to_string(),
            id_suffix_pattern: None,
            sources: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Load using `$TRENDWATCH_CONFIG`, then `config/trendwatch.toml`, then
    /// built-in defaults. Env overrides apply last.
    pub fn load() -> Result<Self, ConfigurationError> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            Self::from_path(Path::new(&p))?
        } else {
            let default = Path::new(DEFAULT_CONFIG_PATH);
            if default.exists() {
                Self::from_path(default)?
            } else {
                Self::default()
            }
        };
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigurationError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigurationError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    fn apply_env_overrides(&mut self) {
        if let Some(v) = env_parse::<u64>("POLL_INTERVAL_SECS") {
            self.interval_secs = v;
        }
        if let Some(v) = env_parse::<u64>("FETCH_TIMEOUT_SECS") {
            self.fetch_timeout_secs = v;
        }
        if let Some(v) = env_parse::<i64>("TREND_WINDOW_HOURS") {
            self.window_hours = v;
        }
        if let Ok(v) = std::env::var("TRENDWATCH_DB_PATH") {
            if !v.is_empty() {
                self.db_path = v;
            }
        }
        if let Ok(v) = std::env::var("TRENDWATCH_BIND_ADDR") {
            if !v.is_empty() {
                self.bind_addr = v;
            }
        }
    }

    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig {
            interval: Duration::from_secs(self.interval_secs),
            fetch_timeout: Duration::from_secs(self.fetch_timeout_secs),
            summary_limit: self.summary_limit,
            window_hours: self.window_hours,
        }
    }

    pub fn id_suffix_rules(&self) -> Result<IdSuffixRules, ConfigurationError> {
        match &self.id_suffix_pattern {
            Some(pattern) => IdSuffixRules::from_pattern(pattern),
            None => Ok(IdSuffixRules::default()),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
