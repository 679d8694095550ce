// Module declarations
pub mod assignment;
pub mod entities;
pub mod significance;
#[cfg(test)]
mod tests;
pub mod types;

pub use types::*;

pub use assignment::{assign_to_clusters, intra_similarity};
pub use entities::{EntityTagger, DEFAULT_ENTITY_TERMS};
pub use significance::{freshness, round4, score_cluster, SourceWeights, DEFAULT_SOURCE_WEIGHT};
