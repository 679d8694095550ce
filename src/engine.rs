//! The dedup + clustering engine.
//!
//! An [`Engine`] owns its configuration (similarity metric, source weights,
//! entity terms) and its sources of non-determinism (clock, id generator).
//! Every operation is a pure function of its arguments plus that fixed
//! configuration, so one engine can serve concurrent callers.

use tracing::info;

use crate::clustering::{
    assign_to_clusters, intra_similarity, score_cluster, Cluster, EntityTagger, SourceWeights,
};
use crate::dedupe::dedupe;
use crate::similarity::{Similarity, TokenSortRatio};
use crate::types::NewsRecord;
use crate::util::{Clock, IdGenerator, SystemClock, UuidIds};
use crate::{TARGET_CLUSTER, TARGET_DEDUP};

pub struct Engine {
    similarity: Box<dyn Similarity>,
    source_weights: SourceWeights,
    entity_tagger: EntityTagger,
    clock: Box<dyn Clock>,
    ids: Box<dyn IdGenerator>,
}

impl Default for Engine {
    fn default() -> Self {
        EngineBuilder::new().build()
    }
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    pub fn source_weights(&self) -> &SourceWeights {
        &self.source_weights
    }

    pub fn entity_tagger(&self) -> &EntityTagger {
        &self.entity_tagger
    }

    /// Similarity of two raw strings under this engine's metric.
    pub fn similarity(&self, a: &str, b: &str) -> f64 {
        self.similarity.similarity(a, b)
    }

    /// Drops near-duplicates, keeping the first copy of each story.
    pub fn dedupe<'a>(&self, records: &'a [NewsRecord], threshold: f64) -> Vec<&'a NewsRecord> {
        let kept = dedupe(records, threshold, self.similarity.as_ref());
        info!(
            target: TARGET_DEDUP,
            "Deduped {} records down to {} (threshold {})",
            records.len(),
            kept.len(),
            threshold
        );
        kept
    }

    /// Groups records into scored story clusters.
    pub fn cluster<'a, I>(&self, records: I, window_minutes: i64, threshold: f64) -> Vec<Cluster<'a>>
    where
        I: IntoIterator<Item = &'a NewsRecord>,
    {
        let now = self.clock.now();
        let groups = assign_to_clusters(records, window_minutes, threshold, self.similarity.as_ref());

        let clusters: Vec<Cluster<'a>> = groups
            .into_iter()
            .map(|members| {
                let intra = intra_similarity(&members, self.similarity.as_ref());
                let entities = self
                    .entity_tagger
                    .extract_from_titles(members.iter().map(|m| m.title.as_str()));
                let score = score_cluster(&members, intra, &self.source_weights, now);
                Cluster::new(self.ids.next_id(), members, intra, entities, score)
            })
            .collect();

        info!(
            target: TARGET_CLUSTER,
            "Built {} clusters (window {}m, threshold {})",
            clusters.len(),
            window_minutes,
            threshold
        );
        clusters
    }

    /// Dedupes the batch, then clusters what survives.
    pub fn analyze<'a>(
        &self,
        records: &'a [NewsRecord],
        dedupe_threshold: f64,
        window_minutes: i64,
        threshold: f64,
    ) -> Vec<Cluster<'a>> {
        let kept = self.dedupe(records, dedupe_threshold);
        self.cluster(kept, window_minutes, threshold)
    }
}

/// Builds an [`Engine`]; anything not set falls back to the defaults
/// (token-sort ratio, default source table and entity terms, system clock,
/// UUID ids).
pub struct EngineBuilder {
    similarity: Box<dyn Similarity>,
    source_weights: SourceWeights,
    entity_tagger: EntityTagger,
    clock: Box<dyn Clock>,
    ids: Box<dyn IdGenerator>,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            similarity: Box::new(TokenSortRatio),
            source_weights: SourceWeights::default(),
            entity_tagger: EntityTagger::default(),
            clock: Box::new(SystemClock),
            ids: Box::new(UuidIds),
        }
    }

    pub fn similarity(mut self, similarity: impl Similarity + 'static) -> Self {
        self.similarity = Box::new(similarity);
        self
    }

    pub fn boxed_similarity(mut self, similarity: Box<dyn Similarity>) -> Self {
        self.similarity = similarity;
        self
    }

    pub fn source_weights(mut self, source_weights: SourceWeights) -> Self {
        self.source_weights = source_weights;
        self
    }

    pub fn entity_tagger(mut self, entity_tagger: EntityTagger) -> Self {
        self.entity_tagger = entity_tagger;
        self
    }

    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    pub fn build(self) -> Engine {
        Engine {
            similarity: self.similarity,
            source_weights: self.source_weights,
            entity_tagger: self.entity_tagger,
            clock: self.clock,
            ids: self.ids,
        }
    }
}
