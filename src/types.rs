//! Records consumed by the engine and the JSON envelopes they travel in.

use anyhow::{anyhow, ensure, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clustering::Cluster;
use crate::fingerprint::fingerprint;

pub const SCHEMA_VERSION: u32 = 1;

pub const DEFAULT_CONFIRM_WINDOW_MINUTES: i64 = 180;
pub const MIN_CONFIRM_WINDOW_MINUTES: i64 = 15;
pub const MAX_CONFIRM_WINDOW_MINUTES: i64 = 720;

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.82;
pub const MIN_SIMILARITY_THRESHOLD: f64 = 0.5;

/// Threshold the collector uses when deduping a freshly fetched batch.
pub const DEFAULT_DEDUPE_THRESHOLD: f64 = 0.9;

/// A validated news item.
///
/// `fingerprint` is derived from the title and content when the record is
/// built and is never read from input, so it always matches the text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "NewsItem")]
pub struct NewsRecord {
    pub schema_version: u32,
    pub id: String,
    pub source: String,
    pub url: String,
    pub title: String,
    pub summary: Option<String>,
    pub published_at: DateTime<Utc>,
    pub fetched_at: Option<DateTime<Utc>>,
    #[serde(rename = "content_text")]
    pub content: String,
    pub language: String,
    #[serde(rename = "hash")]
    pub fingerprint: String,
    pub score_hint: Option<f64>,
}

impl NewsRecord {
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        url: impl Into<String>,
        title: impl Into<String>,
        published_at: DateTime<Utc>,
    ) -> Self {
        let title = title.into();
        Self {
            schema_version: SCHEMA_VERSION,
            id: id.into(),
            source: source.into(),
            url: url.into(),
            fingerprint: fingerprint(&title, ""),
            title,
            summary: None,
            published_at,
            fetched_at: None,
            content: String::new(),
            language: "en".to_string(),
            score_hint: None,
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self.fingerprint = fingerprint(&self.title, &self.content);
        self
    }

    pub fn with_fetched_at(mut self, fetched_at: DateTime<Utc>) -> Self {
        self.fetched_at = Some(fetched_at);
        self
    }
}

/// Wire form of a news item as produced by the collector.
///
/// Any `hash` sent by the caller is ignored; the fingerprint is recomputed.
#[derive(Debug, Clone, Deserialize)]
pub struct NewsItem {
    pub id: String,
    pub source: String,
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub summary: Option<String>,
    pub published_at: DateTime<Utc>,
    #[serde(default)]
    pub fetched_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "content")]
    pub content_text: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub score_hint: Option<f64>,
}

fn default_language() -> String {
    "en".to_string()
}

impl TryFrom<NewsItem> for NewsRecord {
    type Error = anyhow::Error;

    fn try_from(item: NewsItem) -> Result<Self> {
        if item.title.trim().is_empty() {
            return Err(anyhow!("news item '{}' has an empty title", item.id));
        }
        let mut record = NewsRecord::new(
            item.id,
            item.source,
            item.url,
            item.title,
            item.published_at,
        )
        .with_content(item.content_text);
        record.summary = item.summary;
        record.fetched_at = item.fetched_at;
        record.language = item.language;
        record.score_hint = item.score_hint;
        Ok(record)
    }
}

/// `{"items": [...]}` envelope used for dedupe input and output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewsBatch {
    pub items: Vec<NewsRecord>,
}

/// Clustering request: a batch plus an optional confirm window and threshold.
///
/// Omitted parameters are filled in by [`AnalyzeRequest::resolve`], normally
/// from configuration, falling back to the built-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub items: Vec<NewsRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirm_window_minutes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_threshold: Option<f64>,
}

/// Clustering parameters after defaults have been applied and checked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterParams {
    pub confirm_window_minutes: i64,
    pub similarity_threshold: f64,
}

impl Default for ClusterParams {
    fn default() -> Self {
        Self {
            confirm_window_minutes: DEFAULT_CONFIRM_WINDOW_MINUTES,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

impl AnalyzeRequest {
    /// Fills omitted parameters from `defaults` and validates the result.
    pub fn resolve(&self, defaults: ClusterParams) -> Result<ClusterParams> {
        let params = ClusterParams {
            confirm_window_minutes: self
                .confirm_window_minutes
                .unwrap_or(defaults.confirm_window_minutes),
            similarity_threshold: self
                .similarity_threshold
                .unwrap_or(defaults.similarity_threshold),
        };
        params.validate()?;
        Ok(params)
    }
}

impl ClusterParams {
    pub fn validate(&self) -> Result<()> {
        validate_confirm_window(self.confirm_window_minutes)?;
        validate_similarity_threshold(self.similarity_threshold)
    }
}

pub fn validate_confirm_window(minutes: i64) -> Result<()> {
    ensure!(
        (MIN_CONFIRM_WINDOW_MINUTES..=MAX_CONFIRM_WINDOW_MINUTES).contains(&minutes),
        "confirm window must be between {} and {} minutes, got {}",
        MIN_CONFIRM_WINDOW_MINUTES,
        MAX_CONFIRM_WINDOW_MINUTES,
        minutes
    );
    Ok(())
}

pub fn validate_similarity_threshold(threshold: f64) -> Result<()> {
    ensure!(
        (MIN_SIMILARITY_THRESHOLD..=1.0).contains(&threshold),
        "similarity threshold must be between {} and 1.0, got {}",
        MIN_SIMILARITY_THRESHOLD,
        threshold
    );
    Ok(())
}

pub fn validate_dedupe_threshold(threshold: f64) -> Result<()> {
    ensure!(
        (0.0..=1.0).contains(&threshold),
        "dedupe threshold must be between 0.0 and 1.0, got {}",
        threshold
    );
    Ok(())
}

/// `{"clusters": [...]}` envelope returned by cluster and analyze.
#[derive(Debug, Serialize)]
pub struct AnalyzeResponse<'a> {
    pub clusters: Vec<Cluster<'a>>,
}
