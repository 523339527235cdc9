//! Types produced by the ranking engine

use serde::Serialize;

use crate::domain::product::ProductCandidate;
use crate::signals::SignalSet;

/// A candidate paired with its relevance score for one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCandidate {
    #[serde(flatten)]
    pub product: ProductCandidate,
    /// Internal ordering key; not part of the external payload.
    #[serde(skip_serializing)]
    pub relevance_score: f64,
    /// Hybrid breakdown, present on the recommendation path only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<ComponentScores>,
}

impl ScoredCandidate {
    pub fn new(product: ProductCandidate, relevance_score: f64) -> Self {
        Self { product, relevance_score, components: None }
    }

    pub fn with_components(mut self, components: ComponentScores) -> Self {
        self.components = Some(components);
        self
    }
}

/// Raw hybrid scoring terms before weighting
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Default)]
pub struct ComponentScores {
    /// Summed co-purchase overlap from similar buyers
    pub collaborative: f64,
    /// Category and tag affinity with the user's purchases
    pub content: f64,
    /// Global unit sales
    pub popularity: f64,
}

/// Which pass produced a shortlist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingPass {
    /// Loader filters by category, budget and match terms
    Strict,
    /// Match terms dropped at the loader, category and budget kept
    Relaxed,
    /// Collaborative + content + popularity blend
    Hybrid,
    /// No purchase history; unit sales only
    ColdStart,
}

/// Ranked output of one request.
///
/// An empty `items` with `had_results == false` is the "no match" outcome,
/// not an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedShortlist {
    pub items: Vec<ScoredCandidate>,
    pub had_results: bool,
    pub pass: RankingPass,
    #[serde(skip_serializing_if = "is_unconstrained")]
    pub signals: SignalSet,
}

impl RankedShortlist {
    pub fn new(items: Vec<ScoredCandidate>, pass: RankingPass, signals: SignalSet) -> Self {
        Self { had_results: !items.is_empty(), items, pass, signals }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn products(&self) -> impl Iterator<Item = &ProductCandidate> + '_ {
        self.items.iter().map(|item| &item.product)
    }
}

fn is_unconstrained(signals: &SignalSet) -> bool {
    *signals == SignalSet::default()
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::{ComponentScores, RankedShortlist, RankingPass, ScoredCandidate};
    use crate::domain::product::ProductCandidate;
    use crate::signals::SignalSet;

    #[test]
    fn scored_candidate_serializes_as_a_flat_product_without_score() {
        let item = ScoredCandidate::new(
            ProductCandidate::new(4, "Slim Fit Jacket", "men's clothing", Decimal::new(5599, 2)),
            11.0,
        );

        let value = serde_json::to_value(&item).expect("serialize");

        assert_eq!(value["id"], 4);
        assert_eq!(value["title"], "Slim Fit Jacket");
        assert!(value.get("relevance_score").is_none());
        assert!(value.get("components").is_none());
    }

    #[test]
    fn hybrid_items_carry_their_components() {
        let item = ScoredCandidate::new(
            ProductCandidate::new(6, "Solid Silver Ring", "jewelery", Decimal::new(1299, 2)),
            1.5,
        )
        .with_components(ComponentScores { collaborative: 2.0, content: 1.0, popularity: 2.0 });

        let value = serde_json::to_value(&item).expect("serialize");

        assert_eq!(value["components"], json!({"collaborative": 2.0, "content": 1.0, "popularity": 2.0}));
    }

    #[test]
    fn empty_shortlist_reports_no_results_and_hides_default_signals() {
        let shortlist = RankedShortlist::new(Vec::new(), RankingPass::ColdStart, SignalSet::default());

        let value = serde_json::to_value(&shortlist).expect("serialize");

        assert!(!shortlist.had_results);
        assert_eq!(value["pass"], "cold_start");
        assert_eq!(value["had_results"], false);
        assert!(value.get("signals").is_none());
    }
}
