use super::types::ScoredCandidate;

/// How the selector treats zero and negative scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retention {
    /// Drop every candidate scoring `<= 0`.
    Strict,
    /// Keep every candidate regardless of score.
    KeepAll,
}

/// Stable descending sort by score, optional relevance floor, then truncation.
/// Equal scores keep the loader's order.
pub fn select(
    mut scored: Vec<ScoredCandidate>,
    retention: Retention,
    limit: usize,
) -> Vec<ScoredCandidate> {
    scored.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));

    if retention == Retention::Strict {
        scored.retain(|candidate| candidate.relevance_score > 0.0);
    }

    scored.truncate(limit);
    scored
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{select, Retention};
    use crate::domain::product::{ProductCandidate, ProductId};
    use crate::ranking::ScoredCandidate;

    fn scored(id: i64, score: f64) -> ScoredCandidate {
        ScoredCandidate::new(
            ProductCandidate::new(id, format!("item {id}"), "electronics", Decimal::ONE),
            score,
        )
    }

    fn ids(items: &[ScoredCandidate]) -> Vec<ProductId> {
        items.iter().map(|item| item.product.id).collect()
    }

    #[test]
    fn ties_keep_input_order() {
        let ranked = select(
            vec![scored(1, 3.0), scored(2, 5.0), scored(3, 3.0), scored(4, 5.0)],
            Retention::KeepAll,
            10,
        );

        assert_eq!(ids(&ranked), vec![ProductId(2), ProductId(4), ProductId(1), ProductId(3)]);
    }

    #[test]
    fn strict_retention_drops_non_positive_scores() {
        let ranked = select(
            vec![scored(1, 0.0), scored(2, 2.0), scored(3, -1.0)],
            Retention::Strict,
            10,
        );

        assert_eq!(ids(&ranked), vec![ProductId(2)]);
    }

    #[test]
    fn keep_all_retains_zero_scores() {
        let ranked = select(vec![scored(1, 0.0), scored(2, 0.0)], Retention::KeepAll, 10);

        assert_eq!(ids(&ranked), vec![ProductId(1), ProductId(2)]);
    }

    #[test]
    fn floor_applies_before_truncation() {
        let ranked = select(
            vec![scored(1, 0.0), scored(2, 0.0), scored(3, 1.0), scored(4, 2.0)],
            Retention::Strict,
            3,
        );

        assert_eq!(ids(&ranked), vec![ProductId(4), ProductId(3)]);
    }

    #[test]
    fn output_is_truncated_to_limit() {
        let candidates = (1..=12).map(|id| scored(id, id as f64)).collect();

        let ranked = select(candidates, Retention::KeepAll, 10);

        assert_eq!(ranked.len(), 10);
        assert_eq!(ranked[0].product.id, ProductId(12));
    }
}
