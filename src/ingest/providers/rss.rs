// src/ingest/providers/rss.rs
// RSS 2.0 source adapter. Each item becomes one RawMention whose source_id
// is the feed's guid, or a hash of the link when the feed has none.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quick_xml::de::from_str;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use time::{format_description::well_known::Rfc2822, OffsetDateTime, UtcOffset};

use crate::error::SourceError;
use crate::ingest::types::{RawMention, TrendSource};

pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}
#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}
#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    guid: Option<Guid>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
}
// <guid isPermaLink="false">...</guid> carries an attribute, so a plain
// String target won't do.
#[derive(Debug, Deserialize)]
struct Guid {
    #[serde(rename = "$text")]
    value: Option<String>,
}

fn parse_rfc2822(ts: &str) -> Option<DateTime<Utc>> {
    OffsetDateTime::parse(ts, &Rfc2822)
        .ok()
        .map(|dt| dt.to_offset(UtcOffset::UTC).unix_timestamp())
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
}

fn link_digest(link: &str) -> String {
    let digest = Sha256::digest(link.as_bytes());
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    hex[..16].to_string()
}

enum Mode {
    Fixture(String),
    Http { url: String, client: reqwest::Client },
}

pub struct RssSource {
    name: String,
    mode: Mode,
}

impl RssSource {
    pub fn from_url(name: impl Into<String>, url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self {
            name: name.into(),
            mode: Mode::Http {
                url: url.into(),
                client,
            },
        }
    }

    pub fn from_fixture_str(name: impl Into<String>, xml: &str) -> Self {
        Self {
            name: name.into(),
            mode: Mode::Fixture(xml.to_string()),
        }
    }

    fn parse_items(&self, body: &str) -> Result<Vec<RawMention>, SourceError> {
        let xml_clean = scrub_html_entities_for_xml(body);
        let rss: Rss =
            from_str(&xml_clean).map_err(|e| SourceError::Parse(format!("rss xml: {e}")))?;

        let now = Utc::now();
        let mut out = Vec::with_capacity(rss.channel.item.len());
        for it in rss.channel.item {
            let (title, link) = match (it.title, it.link) {
                (Some(t), Some(l)) if !t.trim().is_empty() => (t, l),
                _ => {
                    tracing::warn!(source = %self.name, "skipping malformed rss item");
                    continue;
                }
            };

            let source_id = it
                .guid
                .and_then(|g| g.value)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| link_digest(&link));

            let observed_at = it
                .pub_date
                .as_deref()
                .and_then(parse_rfc2822)
                .unwrap_or(now);

            out.push(RawMention {
                source_id,
                raw_text: title,
                source_name: self.name.clone(),
                observed_at,
            });
        }
        Ok(out)
    }
}

#[async_trait]
impl TrendSource for RssSource {
    async fn fetch(&self) -> Result<Vec<RawMention>, SourceError> {
        match &self.mode {
            Mode::Fixture(xml) => self.parse_items(xml),
            Mode::Http { url, client } => {
                let resp = client.get(url).send().await?.error_for_status()?;
                let body = resp.text().await?;
                self.parse_items(&body)
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}
