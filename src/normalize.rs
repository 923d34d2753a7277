// src/normalize.rs
// Text canonicalization for trend aggregation. Two raw mentions that
// normalize to the same key are the same logical trend.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ConfigurationError;

/// Default pattern for a trailing source-appended identifier segment,
/// e.g. `"Topic #12345"`. Kept configurable because unseen source formats
/// may over- or under-strip; see [`IdSuffixRules::from_pattern`].
pub const DEFAULT_ID_SUFFIX_PATTERN: &str = r"#\d+\s*$";

static RE_BRACKETS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[[^\]]*\]|\([^)]*\)").unwrap());
static RE_NON_ALNUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").unwrap());
static DEFAULT_RULES: Lazy<IdSuffixRules> = Lazy::new(IdSuffixRules::default);

/// Compiled grammar for the trailing-ID segment stripped during
/// normalization.
#[derive(Debug, Clone)]
pub struct IdSuffixRules {
    re: Regex,
}

impl IdSuffixRules {
    pub fn from_pattern(pattern: &str) -> Result<Self, ConfigurationError> {
        Ok(Self {
            re: Regex::new(pattern)?,
        })
    }

    fn strip<'a>(&self, s: &'a str) -> std::borrow::Cow<'a, str> {
        self.re.replace(s, "")
    }
}

impl Default for IdSuffixRules {
    fn default() -> Self {
        Self {
            re: Regex::new(DEFAULT_ID_SUFFIX_PATTERN).unwrap(),
        }
    }
}

/// Normalize raw mention text into a canonical trend key.
///
/// Pure and infallible: empty or whitespace-only input yields `""` rather
/// than an error. Policy: HTML entity decode, lowercase, strip `[...]` and
/// `(...)` annotations, strip a trailing recognized ID segment, collapse
/// runs of non-alphanumeric characters to a single space, trim.
pub fn normalize(raw: &str) -> String {
    normalize_with(raw, &DEFAULT_RULES)
}

/// Like [`normalize`] but with a caller-supplied ID-suffix grammar.
pub fn normalize_with(raw: &str, rules: &IdSuffixRules) -> String {
    let decoded = html_escape::decode_html_entities(raw);
    let lowered = decoded.to_lowercase();
    let no_brackets = RE_BRACKETS.replace_all(&lowered, " ");
    let no_id = rules.strip(no_brackets.trim_end());
    RE_NON_ALNUM
        .replace_all(&no_id, " ")
        .trim_matches(' ')
        .to_string()
}

/// Split an embedded identifier out of a raw mention string when the source
/// does not supply a separate ID field. Adapters emit strings shaped like
/// `"Title [abcdef12] | SourceName"`; the display part is everything before
/// the first `[` or `|`, trimmed.
pub fn parse_id_suffix(raw: &str) -> (String, Option<String>) {
    static RE_EMBEDDED_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\]\s]+)\]").unwrap());

    let display = raw
        .split(['[', '|'])
        .next()
        .unwrap_or_default()
        .trim()
        .to_string();
    let id = RE_EMBEDDED_ID
        .captures(raw)
        .map(|c| c[1].to_string());
    (display, id)
}
