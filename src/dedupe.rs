//! Near-duplicate suppression for a batch of records.

use std::fmt;

use tracing::debug;

use crate::normalize::{canonicalize_url, normalize_title};
use crate::similarity::Similarity;
use crate::types::NewsRecord;
use crate::TARGET_DEDUP;

/// Why a candidate was treated as a duplicate of an accepted record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DuplicateReason {
    Fingerprint,
    Url,
    Title(f64),
}

impl fmt::Display for DuplicateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DuplicateReason::Fingerprint => write!(f, "same fingerprint"),
            DuplicateReason::Url => write!(f, "same canonical url"),
            DuplicateReason::Title(score) => write!(f, "title similarity {:.3}", score),
        }
    }
}

/// Comparison keys computed once per accepted record.
struct Accepted<'a> {
    record: &'a NewsRecord,
    url: String,
    title: String,
}

impl<'a> Accepted<'a> {
    fn new(record: &'a NewsRecord) -> Self {
        Self {
            record,
            url: canonicalize_url(&record.url),
            title: normalize_title(&record.title),
        }
    }

    fn matches(
        &self,
        candidate: &Accepted<'_>,
        threshold: f64,
        similarity: &dyn Similarity,
    ) -> Option<DuplicateReason> {
        if self.record.fingerprint == candidate.record.fingerprint {
            return Some(DuplicateReason::Fingerprint);
        }
        if self.url == candidate.url {
            return Some(DuplicateReason::Url);
        }
        let score = similarity.similarity(&candidate.title, &self.title);
        (score >= threshold).then_some(DuplicateReason::Title(score))
    }
}

/// Drops records that duplicate an earlier record of the same batch.
///
/// Each candidate is compared, in order, with the records already kept and
/// is dropped at the first one sharing its fingerprint or canonical URL, or
/// whose normalized title similarity reaches `threshold`. The earliest copy
/// always survives and the output keeps input order, so running the filter
/// again on its own output changes nothing.
///
/// # Panics
/// If a record has an empty title. Blank titles are rejected at decode, so
/// one reaching this point is a caller bug.
pub fn dedupe<'a, I>(records: I, threshold: f64, similarity: &dyn Similarity) -> Vec<&'a NewsRecord>
where
    I: IntoIterator<Item = &'a NewsRecord>,
{
    let mut accepted: Vec<Accepted<'a>> = Vec::new();

    for record in records {
        assert!(
            !record.title.trim().is_empty(),
            "record '{}' reached dedupe with an empty title",
            record.id
        );
        let candidate = Accepted::new(record);
        let duplicate = accepted.iter().find_map(|existing| {
            existing
                .matches(&candidate, threshold, similarity)
                .map(|reason| (existing.record, reason))
        });

        match duplicate {
            Some((original, reason)) => {
                debug!(
                    target: TARGET_DEDUP,
                    "Dropping {} ({}): duplicate of {} ({})",
                    record.id,
                    record.source,
                    original.id,
                    reason
                );
            }
            None => accepted.push(candidate),
        }
    }

    accepted.into_iter().map(|entry| entry.record).collect()
}
