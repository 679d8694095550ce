//! Runtime settings read from `HERALD_*` environment variables.

use std::path::PathBuf;

use anyhow::{ensure, Context, Result};
use tracing::info;

use crate::clustering::SourceWeights;
use crate::engine::EngineBuilder;
use crate::environment::{get_env_var, parse_value, split_list};
use crate::similarity::SimilarityMethod;
use crate::types::{
    validate_confirm_window, ClusterParams, validate_dedupe_threshold, validate_similarity_threshold,
    DEFAULT_CONFIRM_WINDOW_MINUTES, DEFAULT_DEDUPE_THRESHOLD, DEFAULT_SIMILARITY_THRESHOLD,
};
use crate::TARGET_CONFIG;

pub const ENV_CONFIRM_WINDOW: &str = "HERALD_CONFIRM_WINDOW_MINUTES";
pub const ENV_SIMILARITY_THRESHOLD: &str = "HERALD_SIMILARITY_THRESHOLD";
pub const ENV_DEDUPE_THRESHOLD: &str = "HERALD_DEDUPE_THRESHOLD";
pub const ENV_SOURCE_WEIGHTS: &str = "HERALD_SOURCE_WEIGHTS";
pub const ENV_SIMILARITY: &str = "HERALD_SIMILARITY";
pub const ENV_LOG_DIR: &str = "HERALD_LOG_DIR";

const DEFAULT_LOG_DIR: &str = "logs";

#[derive(Debug, Clone)]
pub struct Settings {
    pub confirm_window_minutes: i64,
    pub similarity_threshold: f64,
    pub dedupe_threshold: f64,
    pub source_weights: SourceWeights,
    pub similarity: SimilarityMethod,
    pub log_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            confirm_window_minutes: DEFAULT_CONFIRM_WINDOW_MINUTES,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            dedupe_threshold: DEFAULT_DEDUPE_THRESHOLD,
            source_weights: SourceWeights::default(),
            similarity: SimilarityMethod::default(),
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(get_env_var)
    }

    /// Builds settings from `lookup`, which returns the value of a variable
    /// or `None` when it is unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();

        if let Some(raw) = lookup(ENV_CONFIRM_WINDOW) {
            let minutes = parse_value(ENV_CONFIRM_WINDOW, &raw)?;
            validate_confirm_window(minutes).context(ENV_CONFIRM_WINDOW)?;
            settings.confirm_window_minutes = minutes;
        }
        if let Some(raw) = lookup(ENV_SIMILARITY_THRESHOLD) {
            let threshold = parse_value(ENV_SIMILARITY_THRESHOLD, &raw)?;
            validate_similarity_threshold(threshold).context(ENV_SIMILARITY_THRESHOLD)?;
            settings.similarity_threshold = threshold;
        }
        if let Some(raw) = lookup(ENV_DEDUPE_THRESHOLD) {
            let threshold = parse_value(ENV_DEDUPE_THRESHOLD, &raw)?;
            validate_dedupe_threshold(threshold).context(ENV_DEDUPE_THRESHOLD)?;
            settings.dedupe_threshold = threshold;
        }
        if let Some(raw) = lookup(ENV_SOURCE_WEIGHTS) {
            settings.source_weights = parse_source_weights(&raw, settings.source_weights)?;
        }
        if let Some(raw) = lookup(ENV_SIMILARITY) {
            settings.similarity = parse_value(ENV_SIMILARITY, &raw)?;
        }
        if let Some(raw) = lookup(ENV_LOG_DIR) {
            settings.log_dir = PathBuf::from(raw);
        }

        Ok(settings)
    }

    /// Confirm window and threshold used when a request omits them.
    pub fn cluster_params(&self) -> ClusterParams {
        ClusterParams {
            confirm_window_minutes: self.confirm_window_minutes,
            similarity_threshold: self.similarity_threshold,
        }
    }

    /// An engine builder carrying the configured metric and source weights.
    pub fn engine_builder(&self) -> EngineBuilder {
        EngineBuilder::new()
            .boxed_similarity(self.similarity.build())
            .source_weights(self.source_weights.clone())
    }

    pub fn log(&self) {
        info!(
            target: TARGET_CONFIG,
            "Settings: window {}m, similarity {} >= {}, dedupe >= {}, log dir {}",
            self.confirm_window_minutes,
            self.similarity,
            self.similarity_threshold,
            self.dedupe_threshold,
            self.log_dir.display()
        );
    }
}

/// Parses `name=weight;name=weight` on top of `base`.
fn parse_source_weights(raw: &str, base: SourceWeights) -> Result<SourceWeights> {
    split_list(raw, ';')
        .into_iter()
        .try_fold(base, |weights, entry| -> Result<SourceWeights> {
            let (source, weight) = entry
                .split_once('=')
                .with_context(|| format!("{}: expected name=weight, got '{}'", ENV_SOURCE_WEIGHTS, entry))?;
            let source = source.trim();
            ensure!(!source.is_empty(), "{}: empty source name in '{}'", ENV_SOURCE_WEIGHTS, entry);
            let weight: f64 = parse_value(ENV_SOURCE_WEIGHTS, weight)?;
            ensure!(
                weight.is_finite() && weight >= 0.0,
                "{}: weight for '{}' must be a non-negative number, got {}",
                ENV_SOURCE_WEIGHTS,
                source,
                weight
            );
            Ok(weights.with_weight(source, weight))
        })
}
