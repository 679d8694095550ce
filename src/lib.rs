pub mod clustering;
pub mod config;
pub mod dedupe;
pub mod engine;
pub mod environment;
pub mod fingerprint;
pub mod logging;
pub mod normalize;
pub mod similarity;
pub mod types;
pub mod util;

pub use clustering::{Cluster, ClusterLink, EntityTagger, SourceWeights};
pub use engine::{Engine, EngineBuilder};
pub use similarity::{Similarity, SimilarityMethod, TokenSortLevenshtein, TokenSortRatio};
pub use types::{AnalyzeRequest, AnalyzeResponse, ClusterParams, NewsBatch, NewsItem, NewsRecord};

pub const TARGET_DEDUP: &str = "dedup";
pub const TARGET_CLUSTER: &str = "cluster";
pub const TARGET_CONFIG: &str = "config";
