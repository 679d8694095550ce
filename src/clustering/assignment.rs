use tracing::debug;

use crate::normalize::normalize_title;
use crate::similarity::Similarity;
use crate::types::NewsRecord;
use crate::TARGET_CLUSTER;

struct OpenCluster<'a> {
    members: Vec<&'a NewsRecord>,
    // Normalized title of the most recently appended member.
    anchor_key: String,
}

/// Groups records into stories.
///
/// Records are visited in `published_at` order (stable, so equal timestamps
/// keep input order). Each record is compared against the open clusters in
/// creation order and joins the first one whose most recent member is within
/// `window_minutes` of it and whose title similarity reaches `threshold`.
/// Otherwise it opens a new cluster.
///
/// The window rolls with the latest member, so a chain of close records can
/// stretch one cluster well beyond `window_minutes` end to end.
pub fn assign_to_clusters<'a, I>(
    records: I,
    window_minutes: i64,
    threshold: f64,
    similarity: &dyn Similarity,
) -> Vec<Vec<&'a NewsRecord>>
where
    I: IntoIterator<Item = &'a NewsRecord>,
{
    let mut sorted: Vec<&NewsRecord> = records.into_iter().collect();
    sorted.sort_by_key(|record| record.published_at);

    let window_us = window_minutes.saturating_mul(60_000_000);
    let mut clusters: Vec<OpenCluster<'a>> = Vec::new();

    for record in sorted {
        assert!(
            !record.title.trim().is_empty(),
            "record '{}' reached clustering with an empty title",
            record.id
        );
        let key = normalize_title(&record.title);

        let matched = clusters.iter().position(|cluster| {
            let anchor = cluster.members[cluster.members.len() - 1];
            if !within_window(record, anchor, window_us) {
                return false;
            }
            let score = similarity.similarity(&cluster.anchor_key, &key);
            score >= threshold
        });

        match matched {
            Some(index) => {
                debug!(
                    target: TARGET_CLUSTER,
                    "Record {} joined cluster #{} ({} members)",
                    record.id,
                    index,
                    clusters[index].members.len() + 1
                );
                let cluster = &mut clusters[index];
                cluster.members.push(record);
                cluster.anchor_key = key;
            }
            None => {
                debug!(
                    target: TARGET_CLUSTER,
                    "Record {} opened cluster #{}", record.id, clusters.len()
                );
                clusters.push(OpenCluster {
                    members: vec![record],
                    anchor_key: key,
                });
            }
        }
    }

    clusters.into_iter().map(|cluster| cluster.members).collect()
}

fn within_window(record: &NewsRecord, anchor: &NewsRecord, window_us: i64) -> bool {
    match (record.published_at - anchor.published_at).num_microseconds() {
        Some(delta) => delta.saturating_abs() <= window_us,
        None => false,
    }
}

/// Highest similarity between the first member's title and any other
/// member's. A singleton scores 0.0.
pub fn intra_similarity(members: &[&NewsRecord], similarity: &dyn Similarity) -> f64 {
    let Some((first, rest)) = members.split_first() else {
        return 0.0;
    };
    let base = normalize_title(&first.title);
    rest.iter()
        .map(|member| similarity.similarity(&base, &normalize_title(&member.title)))
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::similarity::TokenSortRatio;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 28, 12, 0, 0).unwrap()
    }

    fn record(id: &str, title: &str, minutes: i64) -> NewsRecord {
        NewsRecord::new(
            id,
            "coindesk",
            format!("https://example.com/{}", id),
            title,
            t0() + Duration::minutes(minutes),
        )
    }

    fn ids(groups: &[Vec<&NewsRecord>]) -> Vec<Vec<String>> {
        groups
            .iter()
            .map(|g| g.iter().map(|r| r.id.clone()).collect())
            .collect()
    }

    #[test]
    fn test_empty_batch() {
        let records: Vec<NewsRecord> = Vec::new();
        let groups = assign_to_clusters(&records, 60, 0.8, &TokenSortRatio);
        assert!(groups.is_empty());
    }

    #[test]
    fn test_sorts_chronologically_with_stable_ties() {
        let records = vec![
            record("late", "Solana outage halts blocks", 30),
            record("tie-a", "Ripple wins XRP ruling", 0),
            record("tie-b", "Binance adds new listing", 0),
        ];
        let groups = assign_to_clusters(&records, 60, 0.9, &TokenSortRatio);
        assert_eq!(
            ids(&groups),
            vec![vec!["tie-a"], vec!["tie-b"], vec!["late"]]
        );
    }

    #[test]
    fn test_window_is_inclusive() {
        let records = vec![
            record("a", "Bitcoin ETF approved", 0),
            record("b", "bitcoin etf approved", 60),
            record("c", "Bitcoin ETF Approved", 121),
        ];
        let groups = assign_to_clusters(&records, 60, 0.9, &TokenSortRatio);
        assert_eq!(ids(&groups), vec![vec!["a", "b"], vec!["c"]]);
    }

    #[test]
    fn test_anchor_is_latest_member() {
        // b is close to a and c is close to b, but c is not close to a.
        let records = vec![
            record("a", "sec approves spot bitcoin etf", 0),
            record("b", "sec approves spot bitcoin etf filing", 5),
            record("c", "sec approves spot bitcoin etf filing today", 10),
        ];
        let metric = TokenSortRatio;
        assert!(
            metric.similarity(
                "sec approves spot bitcoin etf",
                "sec approves spot bitcoin etf filing today"
            ) < 0.85
        );
        let groups = assign_to_clusters(&records, 60, 0.85, &metric);
        assert_eq!(ids(&groups), vec![vec!["a", "b", "c"]]);
    }

    #[test]
    fn test_first_matching_cluster_wins() {
        // "gamma" is a perfect match for "beta" but also clears the threshold
        // against the older cluster opened by "alpha", which it must join.
        let records = vec![
            record("a", "alpha", 0),
            record("b", "beta", 1),
            record("c", "gamma", 2),
        ];
        let table = |x: &str, y: &str| {
            let mut pair = [x, y];
            pair.sort_unstable();
            match pair {
                _ if x == y => 1.0,
                ["alpha", "gamma"] => 0.7,
                ["beta", "gamma"] => 1.0,
                _ => 0.0,
            }
        };
        let groups = assign_to_clusters(&records, 60, 0.6, &table);
        assert_eq!(ids(&groups), vec![vec!["a", "c"], vec!["b"]]);

        let groups = assign_to_clusters(&records, 60, 0.8, &table);
        assert_eq!(ids(&groups), vec![vec!["a"], vec!["b", "c"]]);
    }

    #[test]
    fn test_stale_cluster_is_skipped_for_a_later_one() {
        // a's cluster is out of window by the time c arrives, b's is not.
        let records = vec![
            record("a", "Bitcoin ETF approved", 0),
            record("b", "bitcoin etf approved", 50),
            record("c", "Bitcoin ETF Approved", 70),
        ];
        let groups = assign_to_clusters(&records, 30, 0.9, &TokenSortRatio);
        assert_eq!(ids(&groups), vec![vec!["a"], vec!["b", "c"]]);
    }

    #[test]
    fn test_intra_similarity_uses_first_member_and_max() {
        let records = vec![
            record("a", "bitcoin etf approved by sec", 0),
            record("b", "sec approves bitcoin etf", 1),
            record("c", "Bitcoin ETF approved by SEC", 2),
        ];
        let members: Vec<&NewsRecord> = records.iter().collect();
        assert_eq!(intra_similarity(&members, &TokenSortRatio), 1.0);
        assert_eq!(intra_similarity(&members[..1], &TokenSortRatio), 0.0);
        assert_eq!(intra_similarity(&[], &TokenSortRatio), 0.0);
    }

    #[test]
    #[should_panic(expected = "empty title")]
    fn test_empty_title_fails_fast() {
        let records = vec![record("a", "  ", 0)];
        assign_to_clusters(&records, 60, 0.8, &TokenSortRatio);
    }
}
