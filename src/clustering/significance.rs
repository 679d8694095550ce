use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::types::distinct_sources;
use crate::types::NewsRecord;

pub const DEFAULT_SOURCE_WEIGHT: f64 = 0.5;

const SIMILARITY_FACTOR: f64 = 0.6;
const SOURCE_FACTOR: f64 = 0.3;
const FRESHNESS_FACTOR: f64 = 0.1;

/// Reputation multipliers per source key.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceWeights {
    weights: HashMap<String, f64>,
    default_weight: f64,
}

impl Default for SourceWeights {
    fn default() -> Self {
        let weights = [
            ("coindesk", 1.0),
            ("theblock", 1.0),
            ("blockworks", 1.0),
            ("cryptopanic", 2.0),
            ("messari", 1.0),
        ]
        .into_iter()
        .map(|(source, weight)| (source.to_string(), weight))
        .collect();

        Self {
            weights,
            default_weight: DEFAULT_SOURCE_WEIGHT,
        }
    }
}

impl SourceWeights {
    /// A table with no entries; every source gets `default_weight`.
    pub fn empty(default_weight: f64) -> Self {
        Self {
            weights: HashMap::new(),
            default_weight,
        }
    }

    pub fn with_weight(mut self, source: impl Into<String>, weight: f64) -> Self {
        self.weights.insert(source.into(), weight);
        self
    }

    pub fn weight(&self, source: &str) -> f64 {
        self.weights
            .get(source)
            .copied()
            .unwrap_or(self.default_weight)
    }

    /// Sum over the distinct sources among `members`.
    pub fn total(&self, members: &[&NewsRecord]) -> f64 {
        distinct_sources(members)
            .into_iter()
            .map(|source| self.weight(source))
            .sum()
    }
}

/// Linear decay over 24 hours since the newest member was published.
///
/// The elapsed time is floored at one hour, so even a record published a
/// moment ago scores `1 - 1/24`. Empty input scores 0.
pub fn freshness(members: &[&NewsRecord], now: DateTime<Utc>) -> f64 {
    let Some(latest) = members.iter().map(|m| m.published_at).max() else {
        return 0.0;
    };
    let delta_hours = hours_between(now, latest).max(1.0);
    (1.0 - delta_hours / 24.0).max(0.0)
}

fn hours_between(now: DateTime<Utc>, then: DateTime<Utc>) -> f64 {
    let elapsed = now - then;
    match elapsed.num_microseconds() {
        Some(us) => us as f64 / 3_600_000_000.0,
        None => elapsed.num_seconds() as f64 / 3600.0,
    }
}

/// Ranking score for a cluster, rounded to 4 decimal places.
///
/// `0.6 * intra_similarity + 0.3 * source_weight + 0.1 * freshness`. The
/// source term is not capped, so well-covered stories can exceed 1.0.
pub fn score_cluster(
    members: &[&NewsRecord],
    intra_similarity: f64,
    weights: &SourceWeights,
    now: DateTime<Utc>,
) -> f64 {
    let raw = SIMILARITY_FACTOR * intra_similarity
        + SOURCE_FACTOR * weights.total(members)
        + FRESHNESS_FACTOR * freshness(members, now);
    round4(raw)
}

pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
