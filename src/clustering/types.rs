use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::{NewsRecord, SCHEMA_VERSION};

/// A story cluster built from one batch.
///
/// Members borrow from the batch passed to the engine; they are kept in the
/// order they joined, which is chronological.
#[derive(Debug, Clone, Serialize)]
pub struct Cluster<'a> {
    pub schema_version: u32,
    pub cluster_id: String,
    pub canonical_title: String,
    pub summary: String,
    pub score: f64,
    pub source_count: usize,
    pub entities: Vec<String>,
    pub sentiment_hint: Option<String>,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub links: Vec<ClusterLink<'a>>,
    #[serde(skip)]
    pub members: Vec<&'a NewsRecord>,
    #[serde(skip)]
    pub intra_similarity: f64,
}

/// Per-member reference included in the serialized cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterLink<'a> {
    pub source: &'a str,
    pub url: &'a str,
    pub title: &'a str,
}

impl<'a> Cluster<'a> {
    /// Assembles a cluster from an accepted, non-empty member list.
    ///
    /// # Panics
    /// If `members` is empty. The assignment pass never produces an empty
    /// group.
    pub fn new(
        cluster_id: String,
        members: Vec<&'a NewsRecord>,
        intra_similarity: f64,
        entities: Vec<String>,
        score: f64,
    ) -> Self {
        let earliest = *members
            .first()
            .expect("a cluster always has at least one member");
        let first_seen = members
            .iter()
            .map(|m| m.published_at)
            .min()
            .unwrap_or(earliest.published_at);
        let last_seen = members
            .iter()
            .map(|m| m.published_at)
            .max()
            .unwrap_or(earliest.published_at);
        let summary = earliest
            .summary
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(earliest.title.as_str())
            .to_string();
        let links = members
            .iter()
            .map(|&m| ClusterLink {
                source: &m.source,
                url: &m.url,
                title: &m.title,
            })
            .collect();

        Self {
            schema_version: SCHEMA_VERSION,
            cluster_id,
            canonical_title: earliest.title.clone(),
            summary,
            score,
            source_count: distinct_sources(&members).len(),
            entities,
            sentiment_hint: None,
            first_seen,
            last_seen,
            links,
            members,
            intra_similarity,
        }
    }
}

/// Distinct source keys, in first-seen order.
pub fn distinct_sources<'a>(members: &[&'a NewsRecord]) -> Vec<&'a str> {
    let mut sources: Vec<&str> = Vec::new();
    for &member in members {
        if !sources.contains(&member.source.as_str()) {
            sources.push(&member.source);
        }
    }
    sources
}
