use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::product::{ProductCandidate, ProductId};
use crate::domain::purchase::{PurchaseHistory, UserId};
use crate::signals::{Category, SignalSet};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LoaderError {
    #[error("candidate storage unavailable: {0}")]
    Unavailable(String),
    #[error("candidate record could not be decoded: {0}")]
    Decode(String),
}

/// Storage-side filter for one candidate fetch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CandidateQuery {
    /// Empty means any category.
    pub categories: BTreeSet<Category>,
    pub budget_ceiling: Option<Decimal>,
    /// When non-empty, a candidate must contain at least one term in its
    /// title or description.
    pub terms: Vec<String>,
    pub limit: usize,
}

impl CandidateQuery {
    /// Category, budget and match terms all applied.
    pub fn strict(signals: &SignalSet, limit: usize) -> Self {
        Self {
            categories: signals.categories.clone(),
            budget_ceiling: signals.budget_ceiling,
            terms: signals.match_terms(),
            limit,
        }
    }

    /// Match terms dropped; category and budget kept.
    pub fn relaxed(signals: &SignalSet, limit: usize) -> Self {
        Self { terms: Vec::new(), ..Self::strict(signals, limit) }
    }

    pub fn unconstrained(limit: usize) -> Self {
        Self { limit, ..Self::default() }
    }

    pub fn category_names(&self) -> Vec<&'static str> {
        self.categories.iter().map(Category::as_str).collect()
    }

    /// Reference semantics every loader implementation must agree with.
    pub fn matches(&self, product: &ProductCandidate) -> bool {
        if !self.categories.is_empty()
            && !self.categories.iter().any(|category| category.as_str() == product.category)
        {
            return false;
        }

        if let Some(ceiling) = self.budget_ceiling {
            if product.price > ceiling {
                return false;
            }
        }

        if self.terms.is_empty() {
            return true;
        }

        let title = product.title.to_lowercase();
        let description = product.description.as_deref().unwrap_or_default().to_lowercase();
        self.terms
            .iter()
            .any(|term| title.contains(term.as_str()) || description.contains(term.as_str()))
    }
}

/// Data source for the ranking core. Implementations return catalog order
/// and never rank; all relevance filtering is repeated in-core.
#[async_trait]
pub trait CandidateLoader: Send + Sync {
    /// Up to `query.limit` candidates in catalog order.
    async fn load_candidates(
        &self,
        query: &CandidateQuery,
    ) -> Result<Vec<ProductCandidate>, LoaderError>;

    /// The user's own purchases plus every user's purchases.
    async fn load_purchase_history(&self, user: &UserId) -> Result<PurchaseHistory, LoaderError>;

    /// Unit sales per product across all order lines.
    async fn load_popularity(&self) -> Result<HashMap<ProductId, u64>, LoaderError>;

    /// Catalog records for specific products, in catalog order.
    async fn load_products(
        &self,
        ids: &BTreeSet<ProductId>,
    ) -> Result<Vec<ProductCandidate>, LoaderError>;
}
