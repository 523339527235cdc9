//! Signal extraction from free-text shopping queries.
//!
//! A query like "cozy winter hoodie under $50" becomes a [`SignalSet`]:
//! a budget ceiling, zero or more category intents, keyword tokens and
//! vibe terms. Extraction is total; a missing signal is an empty value.

mod extractor;
mod vocabulary;

pub use extractor::SignalExtractor;
pub use vocabulary::{CategoryRule, SignalVocabulary, CATEGORY_RULES, DEFAULT_STOP_WORDS, DEFAULT_VIBE_TERMS};

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Catalog category a query can express intent for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "electronics")]
    Electronics,
    #[serde(rename = "jewelery")]
    Jewelery,
    #[serde(rename = "men's clothing")]
    MensClothing,
    #[serde(rename = "women's clothing")]
    WomensClothing,
}

impl Category {
    /// Identifier used by the catalog's `category` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Electronics => "electronics",
            Category::Jewelery => "jewelery",
            Category::MensClothing => "men's clothing",
            Category::WomensClothing => "women's clothing",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured intent extracted from one query. Immutable once built.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SignalSet {
    /// Absent means the query is unconstrained by price.
    pub budget_ceiling: Option<Decimal>,
    /// Empty means "don't filter by category".
    pub categories: BTreeSet<Category>,
    pub keywords: Vec<String>,
    /// Vocabulary order, not input order.
    pub vibes: Vec<String>,
}

impl SignalSet {
    /// True when keyword or vibe signals are present, which switches the
    /// ranker to strict retention and enables the relaxed fallback pass.
    pub fn has_text_signals(&self) -> bool {
        !self.keywords.is_empty() || !self.vibes.is_empty()
    }

    /// Keywords followed by vibes, without repeats, for storage-side matching.
    pub fn match_terms(&self) -> Vec<String> {
        let mut terms: Vec<String> = Vec::with_capacity(self.keywords.len() + self.vibes.len());
        for term in self.keywords.iter().chain(self.vibes.iter()) {
            if !terms.contains(term) {
                terms.push(term.clone());
            }
        }
        terms
    }
}
