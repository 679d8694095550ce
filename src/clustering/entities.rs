use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

/// Terms tagged by default: tickers, regulatory terms and market events.
pub const DEFAULT_ENTITY_TERMS: &[&str] = &[
    "BTC",
    "ETH",
    "SOL",
    "XRP",
    "SEC",
    "ETF",
    "hack",
    "funding rate",
    "listing",
];

static DEFAULT_TAGGER: Lazy<EntityTagger> = Lazy::new(|| {
    EntityTagger::from_terms(DEFAULT_ENTITY_TERMS)
        .expect("default entity terms compile to valid patterns")
});

#[derive(Debug, Clone)]
struct EntityPattern {
    tag: String,
    regex: Regex,
}

/// Fixed lexical tagger over cluster titles.
///
/// Each term becomes a case-insensitive whole-word pattern; a hit adds the
/// term upper-cased to the result.
#[derive(Debug, Clone)]
pub struct EntityTagger {
    patterns: Vec<EntityPattern>,
}

impl Default for EntityTagger {
    fn default() -> Self {
        DEFAULT_TAGGER.clone()
    }
}

impl EntityTagger {
    pub fn from_terms<S: AsRef<str>>(terms: &[S]) -> Result<Self, regex::Error> {
        let patterns = terms
            .iter()
            .map(|term| {
                let term = term.as_ref().trim();
                Ok(EntityPattern {
                    tag: term.to_uppercase(),
                    regex: Regex::new(&format!(r"(?i)\b{}\b", regex::escape(term)))?,
                })
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self { patterns })
    }

    /// Sorted, deduplicated tags found in `text`.
    pub fn extract(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        self.patterns
            .iter()
            .filter(|pattern| pattern.regex.is_match(&lowered))
            .map(|pattern| pattern.tag.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Tags for a group of titles, matched against their space-joined text.
    pub fn extract_from_titles<'t, I>(&self, titles: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'t str>,
    {
        let combined = titles.into_iter().collect::<Vec<_>>().join(" ");
        self.extract(&combined)
    }
}
