//! Lexical title similarity.
//!
//! Both built-in metrics sort whitespace tokens before comparing, so titles
//! that differ only in word order score 1.0.

use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use strsim::normalized_levenshtein;

/// Similarity between two comparison keys, in `[0, 1]`.
///
/// Implementations must be commutative and reflexive (`similarity(a, a) ==
/// 1.0`). The engine only ever passes already-normalized titles.
pub trait Similarity: Send + Sync {
    fn similarity(&self, a: &str, b: &str) -> f64;
}

impl<F> Similarity for F
where
    F: Fn(&str, &str) -> f64 + Send + Sync,
{
    fn similarity(&self, a: &str, b: &str) -> f64 {
        self(a, b)
    }
}

/// Token-sort ratio: tokens sorted and re-joined, then compared with the
/// normalized Indel ratio `2 * LCS / (len_a + len_b)` over characters.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenSortRatio;

impl Similarity for TokenSortRatio {
    fn similarity(&self, a: &str, b: &str) -> f64 {
        indel_ratio(&sort_tokens(a), &sort_tokens(b))
    }
}

/// Token-sort variant scored with normalized Levenshtein distance. Stricter
/// than [`TokenSortRatio`] on substitutions.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenSortLevenshtein;

impl Similarity for TokenSortLevenshtein {
    fn similarity(&self, a: &str, b: &str) -> f64 {
        normalized_levenshtein(&sort_tokens(a), &sort_tokens(b))
    }
}

/// Selects one of the built-in metrics from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SimilarityMethod {
    #[default]
    TokenSort,
    TokenSortLevenshtein,
}

impl SimilarityMethod {
    pub fn build(self) -> Box<dyn Similarity> {
        match self {
            SimilarityMethod::TokenSort => Box::new(TokenSortRatio),
            SimilarityMethod::TokenSortLevenshtein => Box::new(TokenSortLevenshtein),
        }
    }
}

impl fmt::Display for SimilarityMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimilarityMethod::TokenSort => write!(f, "token-sort"),
            SimilarityMethod::TokenSortLevenshtein => write!(f, "token-sort-levenshtein"),
        }
    }
}

impl FromStr for SimilarityMethod {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "token-sort" | "token_sort" => Ok(SimilarityMethod::TokenSort),
            "token-sort-levenshtein" | "token_sort_levenshtein" => {
                Ok(SimilarityMethod::TokenSortLevenshtein)
            }
            other => Err(anyhow!("unknown similarity method '{}'", other)),
        }
    }
}

fn sort_tokens(value: &str) -> String {
    let mut tokens: Vec<&str> = value.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

fn indel_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * lcs_length(&a, &b) as f64 / total as f64
}

/// LCS length with a two-row table.
fn lcs_length(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];

    for ca in a {
        for (j, cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                curr[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}
