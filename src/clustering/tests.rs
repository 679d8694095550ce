//! Batch-level clustering scenarios run through the engine.

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::clustering::Cluster;
use crate::engine::Engine;
use crate::similarity::{Similarity, TokenSortRatio};
use crate::types::NewsRecord;
use crate::util::{FixedClock, SequentialIds};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, 28, 12, 0, 0).unwrap()
}

fn engine_at(now: DateTime<Utc>) -> Engine {
    Engine::builder()
        .clock(FixedClock(now))
        .id_generator(SequentialIds::new("cluster"))
        .build()
}

fn record(id: &str, source: &str, title: &str, minutes: i64) -> NewsRecord {
    NewsRecord::new(
        id,
        source,
        format!("https://{}.example/{}", source, id),
        title,
        t0() + Duration::minutes(minutes),
    )
}

fn member_ids(members: &[&NewsRecord]) -> Vec<String> {
    members.iter().map(|m| m.id.clone()).collect()
}

fn shape(clusters: &[Cluster<'_>]) -> Vec<(String, Vec<String>, u64)> {
    clusters
        .iter()
        .map(|c| (c.cluster_id.clone(), member_ids(&c.members), c.score.to_bits()))
        .collect()
}

#[test]
fn test_empty_batch_yields_no_clusters() {
    let records: Vec<NewsRecord> = Vec::new();
    assert!(engine_at(t0()).cluster(&records, 180, 0.82).is_empty());
}

#[test]
fn test_single_record_is_a_singleton() {
    let records = vec![record("1", "coindesk", "Bitcoin ETF approved", 0).with_summary("")];
    let clusters = engine_at(t0()).cluster(&records, 180, 0.82);
    assert_eq!(clusters.len(), 1);
    let cluster = &clusters[0];
    assert_eq!(cluster.intra_similarity, 0.0);
    assert_eq!(cluster.summary, "Bitcoin ETF approved");
    assert_eq!(cluster.first_seen, cluster.last_seen);
    assert_eq!(cluster.source_count, 1);
    assert_eq!(cluster.cluster_id, "cluster-1");
}

#[test]
fn test_hack_headlines_from_two_feeds() {
    let records = vec![
        record("1", "coindesk", "Exchange X hacked for $10M", 0),
        record("2", "theblock", "Exchange X suffers $10M hack", 10),
    ];
    let engine = engine_at(t0() + Duration::minutes(10) + Duration::seconds(30));

    // The exact token-sort ratio of this pair is 42/54, just under 0.8.
    let pair = TokenSortRatio.similarity(
        "exchange x hacked for $10m",
        "exchange x suffers $10m hack",
    );
    assert!((pair - 42.0 / 54.0).abs() < 1e-12);
    assert_eq!(engine.cluster(&records, 15, 0.8).len(), 2);

    let clusters = engine.cluster(&records, 15, 0.75);
    assert_eq!(clusters.len(), 1);
    let cluster = &clusters[0];
    assert_eq!(member_ids(&cluster.members), vec!["1", "2"]);
    assert_eq!(cluster.source_count, 2);
    assert!(cluster.entities.contains(&"HACK".to_string()));
    assert_eq!(cluster.first_seen, t0());
    assert_eq!(cluster.last_seen, t0() + Duration::minutes(10));
    assert_eq!(cluster.canonical_title, "Exchange X hacked for $10M");
    // 0.6 * 42/54 + 0.3 * (1.0 + 1.0) + 0.1 * (1 - 1/24)
    assert_eq!(cluster.score, 1.1625);
}

#[test]
fn test_chained_window_extends_span() {
    let records = vec![
        record("a", "coindesk", "Bitcoin ETF approved by SEC", 0),
        record("b", "theblock", "bitcoin etf approved by sec", 20),
        record("c", "blockworks", "Bitcoin  ETF Approved By SEC", 40),
    ];
    let clusters = engine_at(t0()).cluster(&records, 30, 0.9);
    assert_eq!(clusters.len(), 1);
    let cluster = &clusters[0];
    assert_eq!(member_ids(&cluster.members), vec!["a", "b", "c"]);
    assert!(cluster.last_seen - cluster.first_seen > Duration::minutes(30));

    // Without the bridging record the ends are too far apart.
    let clusters = engine_at(t0()).cluster([&records[0], &records[2]], 30, 0.9);
    assert_eq!(clusters.len(), 2);
}

#[test]
fn test_clustering_is_deterministic() {
    let records = vec![
        record("1", "coindesk", "SEC approves spot Bitcoin ETF", 0),
        record("2", "theblock", "Spot Bitcoin ETF approved by SEC", 5),
        record("3", "decrypt", "Solana outage halts block production", 4),
        record("4", "messari", "Solana block production halted by outage", 6),
        record("5", "cryptopanic", "SEC approves spot Bitcoin ETFs", 9),
    ];
    let first = engine_at(t0()).cluster(&records, 60, 0.8);
    let second = engine_at(t0()).cluster(&records, 60, 0.8);

    assert_eq!(shape(&first), shape(&second));

    // Input order does not matter when timestamps are distinct.
    let a = engine_at(t0()).cluster(records.iter().rev(), 60, 0.8);
    let b = engine_at(t0()).cluster(&records, 60, 0.8);
    assert_eq!(shape(&a), shape(&b));
}

#[test]
fn test_members_follow_publication_order() {
    let records = vec![
        record("late", "theblock", "bitcoin etf approved", 30).with_summary("Later take"),
        record("early", "coindesk", "Bitcoin ETF approved", 0).with_summary("First report"),
    ];
    let clusters = engine_at(t0()).cluster(&records, 60, 0.9);
    assert_eq!(clusters.len(), 1);
    let cluster = &clusters[0];
    assert_eq!(member_ids(&cluster.members), vec!["early", "late"]);
    assert_eq!(cluster.canonical_title, "Bitcoin ETF approved");
    assert_eq!(cluster.summary, "First report");
    assert_eq!(cluster.links[0].source, "coindesk");
    assert_eq!(cluster.links[1].url, "https://theblock.example/late");
}

#[test]
fn test_source_diversity() {
    let same = vec![
        record("1", "coindesk", "Bitcoin ETF approved", 0),
        record("2", "coindesk", "bitcoin etf approved", 1),
    ];
    let mixed = vec![
        record("1", "coindesk", "Bitcoin ETF approved", 0),
        record("2", "cryptopanic", "bitcoin etf approved", 1),
    ];
    // Clock far enough ahead that freshness is 0.
    let engine = engine_at(t0() + Duration::days(2));

    let clusters = engine.cluster(&same, 60, 0.9);
    assert_eq!(clusters[0].source_count, 1);
    // 0.6 * 1.0 + 0.3 * 1.0
    assert_eq!(clusters[0].score, 0.9);

    let clusters = engine.cluster(&mixed, 60, 0.9);
    assert_eq!(clusters[0].source_count, 2);
    // 0.6 * 1.0 + 0.3 * (1.0 + 2.0)
    assert_eq!(clusters[0].score, 1.5);
}

#[test]
fn test_freshness_clamp_in_score() {
    let records = vec![NewsRecord::new(
        "1",
        "unknown",
        "https://unknown.example/1",
        "Funding rate flips negative",
        t0() - Duration::seconds(30),
    )];
    let clusters = engine_at(t0()).cluster(&records, 60, 0.9);
    // 0.3 * 0.5 + 0.1 * (1 - 1/24)
    assert_eq!(clusters[0].score, 0.2458);
    assert_eq!(clusters[0].entities, vec!["FUNDING RATE"]);
}

#[test]
fn test_entities_cover_all_member_titles() {
    let records = vec![
        record("1", "coindesk", "Bitcoin hits $50k", 0),
        record("2", "theblock", "BTC ETF approved by SEC", 1),
    ];
    let engine = Engine::builder()
        .similarity(|_: &str, _: &str| 1.0)
        .clock(FixedClock(t0()))
        .id_generator(SequentialIds::new("cluster"))
        .build();
    let clusters = engine.cluster(&records, 60, 0.9);
    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0].entities, vec!["BTC", "ETF", "SEC"]);
}

#[test]
fn test_scores_have_four_decimals() {
    let records = vec![
        record("1", "coindesk", "SEC approves spot Bitcoin ETF", 0),
        record("2", "theblock", "Spot Bitcoin ETF approved by SEC", 7),
        record("3", "decrypt", "Solana outage halts block production", 13),
        record("4", "unknown", "XRP listing goes live", 29),
    ];
    let clusters = engine_at(t0() + Duration::minutes(97)).cluster(&records, 60, 0.8);
    assert!(!clusters.is_empty());
    for cluster in clusters {
        let rounded = (cluster.score * 10_000.0).round() / 10_000.0;
        assert_eq!(cluster.score, rounded);
    }
}

#[test]
fn test_serialized_cluster_shape() {
    let records = vec![record("1", "coindesk", "Bitcoin ETF approved", 0)];
    let clusters = engine_at(t0()).cluster(&records, 60, 0.9);
    let json = serde_json::to_value(&clusters[0]).unwrap();
    assert_eq!(json["schema_version"], 1);
    assert_eq!(json["cluster_id"], "cluster-1");
    assert_eq!(json["first_seen"], "2025-09-28T12:00:00Z");
    assert!(json["sentiment_hint"].is_null());
    assert_eq!(json["links"][0]["url"], "https://coindesk.example/1");
    assert!(json.get("members").is_none());
    assert!(json.get("intra_similarity").is_none());
}
