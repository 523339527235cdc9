//! Ranking engine: search with strict-then-relaxed fallback, and hybrid
//! recommendations with a cold-start branch.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use super::context::UserSignalContext;
use super::loader::{CandidateLoader, CandidateQuery};
use super::scoring::{RankingConfig, RankingLimits, RelevanceScorer};
use super::selector::{select, Retention};
use super::types::*;
use super::RankingResult;
use crate::domain::product::{ProductCandidate, ProductId};
use crate::domain::purchase::UserId;
use crate::errors::DomainError;
use crate::signals::{SignalExtractor, SignalSet};

/// Shared, read-only ranking core. Cheap to clone; safe to call from
/// concurrent requests since every call builds its own state.
#[derive(Clone)]
pub struct RankingEngine {
    loader: Arc<dyn CandidateLoader>,
    extractor: Arc<SignalExtractor>,
    scorer: RelevanceScorer,
    limits: RankingLimits,
}

impl std::fmt::Debug for RankingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RankingEngine")
            .field("extractor", &self.extractor)
            .field("scorer", &self.scorer)
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

impl RankingEngine {
    /// Create an engine with default weights, limits and vocabulary
    pub fn new(loader: Arc<dyn CandidateLoader>) -> Self {
        Self::with_config(loader, RankingConfig::default(), SignalExtractor::default())
    }

    pub fn with_config(
        loader: Arc<dyn CandidateLoader>,
        config: RankingConfig,
        extractor: SignalExtractor,
    ) -> Self {
        Self {
            loader,
            extractor: Arc::new(extractor),
            scorer: RelevanceScorer::with_weights(config.weights),
            limits: config.limits,
        }
    }

    pub fn extractor(&self) -> &SignalExtractor {
        &self.extractor
    }

    /// Rank catalog items for a free-text query.
    pub async fn search(&self, query: &str) -> RankingResult<RankedShortlist> {
        let query = query.trim();
        if query.is_empty() {
            return Err(DomainError::EmptyQuery.into());
        }

        self.rank_signals(self.extractor.extract(query)).await
    }

    /// Strict pass first; when keyword or vibe signals left it empty, a
    /// relaxed pass that keeps category and budget but accepts near misses.
    pub async fn rank_signals(&self, signals: SignalSet) -> RankingResult<RankedShortlist> {
        let limit = self.limits.candidate_limit;
        let strict_candidates =
            self.loader.load_candidates(&CandidateQuery::strict(&signals, limit)).await?;

        let retention =
            if signals.has_text_signals() { Retention::Strict } else { Retention::KeepAll };
        let strict = self.score_text(strict_candidates, &signals, retention);

        if !strict.is_empty() || !signals.has_text_signals() {
            return Ok(RankedShortlist::new(strict, RankingPass::Strict, signals));
        }

        let relaxed_candidates =
            self.loader.load_candidates(&CandidateQuery::relaxed(&signals, limit)).await?;
        let relaxed = self.score_text(relaxed_candidates, &signals, Retention::KeepAll);

        Ok(RankedShortlist::new(relaxed, RankingPass::Relaxed, signals))
    }

    /// Personalized recommendations for a user.
    pub async fn recommend(&self, user: &UserId) -> RankingResult<RankedShortlist> {
        if user.0.trim().is_empty() {
            return Err(DomainError::MissingUserId.into());
        }

        let history = self.loader.load_purchase_history(user).await?;
        let popularity = self.loader.load_popularity().await?;

        if history.is_cold_start() {
            return self.cold_start(&popularity).await;
        }

        let pool = self
            .loader
            .load_candidates(&CandidateQuery::unconstrained(self.limits.recommendation_pool_limit))
            .await?;
        let purchased = self.loader.load_products(&history.own).await?;
        let context = UserSignalContext::build(&history, &purchased, popularity);

        let scored = pool
            .into_iter()
            .filter(|product| !context.has_purchased(&product.id))
            .map(|product| {
                let components = self.scorer.hybrid_components(&product, &context);
                let total = self.scorer.calculate_total_score(&components);
                ScoredCandidate::new(product, total).with_components(components)
            })
            .collect();
        let items = select(scored, Retention::KeepAll, self.limits.result_limit);

        Ok(RankedShortlist::new(items, RankingPass::Hybrid, SignalSet::default()))
    }

    /// Best sellers across the whole catalog, padded with unsold items in
    /// catalog order when fewer than the limit have any sales.
    async fn cold_start(
        &self,
        popularity: &HashMap<ProductId, u64>,
    ) -> RankingResult<RankedShortlist> {
        let limit = self.limits.cold_start_limit;

        let mut best_sellers: Vec<(ProductId, u64)> = popularity
            .iter()
            .filter(|(_, units)| **units > 0)
            .map(|(id, units)| (*id, *units))
            .collect();
        best_sellers.sort_by(|left, right| right.1.cmp(&left.1).then(left.0.cmp(&right.0)));
        best_sellers.truncate(limit);
        let top_ids: BTreeSet<ProductId> = best_sellers.iter().map(|(id, _)| *id).collect();

        let mut products = if top_ids.is_empty() {
            Vec::new()
        } else {
            self.loader.load_products(&top_ids).await?
        };
        if products.len() < limit {
            let padding = self
                .loader
                .load_candidates(&CandidateQuery::unconstrained(limit + top_ids.len()))
                .await?;
            products.extend(padding.into_iter().filter(|product| !top_ids.contains(&product.id)));
        }

        let scored = products
            .into_iter()
            .map(|product| {
                let units = popularity.get(&product.id).copied().unwrap_or(0) as f64;
                ScoredCandidate::new(product, units).with_components(ComponentScores {
                    popularity: units,
                    ..ComponentScores::default()
                })
            })
            .collect();
        let items = select(scored, Retention::KeepAll, limit);

        Ok(RankedShortlist::new(items, RankingPass::ColdStart, SignalSet::default()))
    }

    fn score_text(
        &self,
        candidates: Vec<ProductCandidate>,
        signals: &SignalSet,
        retention: Retention,
    ) -> Vec<ScoredCandidate> {
        let scored = candidates
            .into_iter()
            .map(|product| {
                let score = self.scorer.score(&product, signals, None);
                ScoredCandidate::new(product, score)
            })
            .collect();
        select(scored, retention, self.limits.result_limit)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet, HashMap};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use rust_decimal::Decimal;

    use super::RankingEngine;
    use crate::domain::product::{ProductCandidate, ProductId};
    use crate::domain::purchase::{PurchaseHistory, UserId};
    use crate::errors::{DomainError, RankingError};
    use crate::ranking::{
        CandidateLoader, CandidateQuery, LoaderError, RankingConfig, RankingLimits, RankingPass,
    };
    use crate::signals::SignalExtractor;

    #[derive(Default)]
    struct StubLoader {
        catalog: Vec<ProductCandidate>,
        orders: Vec<(&'static str, i64, u64)>,
        queries: Mutex<Vec<CandidateQuery>>,
        fail: bool,
    }

    impl StubLoader {
        fn recorded(&self) -> Vec<CandidateQuery> {
            self.queries.lock().expect("query log lock").clone()
        }

        fn check(&self) -> Result<(), LoaderError> {
            if self.fail {
                Err(LoaderError::Unavailable("connection refused".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl CandidateLoader for StubLoader {
        async fn load_candidates(
            &self,
            query: &CandidateQuery,
        ) -> Result<Vec<ProductCandidate>, LoaderError> {
            self.check()?;
            self.queries.lock().expect("query log lock").push(query.clone());
            Ok(self
                .catalog
                .iter()
                .filter(|product| query.matches(product))
                .take(query.limit)
                .cloned()
                .collect())
        }

        async fn load_purchase_history(
            &self,
            user: &UserId,
        ) -> Result<PurchaseHistory, LoaderError> {
            self.check()?;
            let mut all: BTreeMap<UserId, BTreeSet<ProductId>> = BTreeMap::new();
            for (buyer, product_id, _) in &self.orders {
                all.entry(UserId::new(*buyer)).or_default().insert(ProductId(*product_id));
            }
            let own = all.get(user).cloned().unwrap_or_default();
            Ok(PurchaseHistory { user: user.clone(), own, all })
        }

        async fn load_popularity(&self) -> Result<HashMap<ProductId, u64>, LoaderError> {
            self.check()?;
            let mut popularity = HashMap::new();
            for (_, product_id, quantity) in &self.orders {
                *popularity.entry(ProductId(*product_id)).or_insert(0) += quantity;
            }
            Ok(popularity)
        }

        async fn load_products(
            &self,
            ids: &BTreeSet<ProductId>,
        ) -> Result<Vec<ProductCandidate>, LoaderError> {
            self.check()?;
            Ok(self.catalog.iter().filter(|product| ids.contains(&product.id)).cloned().collect())
        }
    }

    fn product(id: i64, title: &str, category: &str, price: i64) -> ProductCandidate {
        ProductCandidate::new(id, title, category, Decimal::new(price, 0))
    }

    fn catalog() -> Vec<ProductCandidate> {
        vec![
            product(1, "Fleece Hoodie", "men's clothing", 45).with_tags("winter,casual"),
            product(2, "Denim Jacket", "men's clothing", 80).with_tags("casual,denim"),
            product(3, "Slim Fit Shirt", "men's clothing", 25)
                .with_description("Office ready cotton shirt"),
            product(4, "Gold Ring", "jewelery", 150).with_tags("gold,gift"),
            product(5, "Silver Necklace", "jewelery", 60).with_tags("silver,gift"),
            product(6, "Wireless Headphones", "electronics", 99).with_tags("audio"),
            product(7, "Gaming Laptop", "electronics", 1200).with_tags("tech"),
            product(8, "Summer Dress", "women's clothing", 35).with_tags("summer"),
        ]
    }

    fn engine(loader: Arc<StubLoader>) -> RankingEngine {
        RankingEngine::new(loader)
    }

    fn ids(shortlist: &crate::ranking::RankedShortlist) -> Vec<i64> {
        shortlist.items.iter().map(|item| item.product.id.0).collect()
    }

    #[tokio::test]
    async fn search_ranks_matching_candidates_and_drops_misses() {
        let loader = Arc::new(StubLoader { catalog: catalog(), ..StubLoader::default() });

        let shortlist = engine(loader.clone()).search("a good shirt for the office").await.unwrap();

        assert_eq!(shortlist.pass, RankingPass::Strict);
        assert!(shortlist.had_results);
        assert_eq!(ids(&shortlist), vec![3]);
        assert_eq!(loader.recorded().len(), 1);
    }

    #[tokio::test]
    async fn search_without_text_signals_keeps_every_loaded_candidate() {
        let loader = Arc::new(StubLoader { catalog: catalog(), ..StubLoader::default() });

        // a budget with no keyword or vibe
        let shortlist = engine(loader).search("$40").await.unwrap();

        assert_eq!(shortlist.pass, RankingPass::Strict);
        assert_eq!(ids(&shortlist), vec![3, 8]);
        assert!(shortlist.items.iter().all(|item| item.relevance_score == 0.0));
    }

    #[tokio::test]
    async fn strict_miss_falls_back_to_relaxed_pool() {
        let loader = Arc::new(StubLoader { catalog: catalog(), ..StubLoader::default() });

        let shortlist = engine(loader.clone()).search("velvet jewelry").await.unwrap();

        assert_eq!(shortlist.pass, RankingPass::Relaxed);
        assert!(shortlist.had_results);
        // category stays jewelery on the relaxed pass; zero scores are kept
        assert_eq!(ids(&shortlist), vec![4, 5]);

        let queries = loader.recorded();
        assert_eq!(queries.len(), 2);
        assert_eq!(queries[0].terms, vec!["velvet".to_string(), "jewelry".to_string()]);
        assert!(queries[1].terms.is_empty());
        assert_eq!(queries[1].categories, queries[0].categories);
    }

    #[tokio::test]
    async fn relaxed_pass_keeps_budget_ceiling() {
        let loader = Arc::new(StubLoader { catalog: catalog(), ..StubLoader::default() });

        let shortlist = engine(loader).search("velvet jewelry under 100").await.unwrap();

        assert_eq!(shortlist.pass, RankingPass::Relaxed);
        assert_eq!(ids(&shortlist), vec![5]);
    }

    #[tokio::test]
    async fn exhausted_fallback_is_a_no_match_outcome() {
        let loader = Arc::new(StubLoader { catalog: catalog(), ..StubLoader::default() });

        let shortlist = engine(loader).search("velvet jewelry under 10").await.unwrap();

        assert_eq!(shortlist.pass, RankingPass::Relaxed);
        assert!(!shortlist.had_results);
        assert!(shortlist.is_empty());
    }

    #[tokio::test]
    async fn empty_query_is_rejected_before_loading() {
        let loader = Arc::new(StubLoader { catalog: catalog(), ..StubLoader::default() });

        let result = engine(loader.clone()).search("   ").await;

        assert_eq!(result, Err(RankingError::Domain(DomainError::EmptyQuery)));
        assert!(loader.recorded().is_empty());
    }

    #[tokio::test]
    async fn loader_failure_propagates_unchanged() {
        let loader = Arc::new(StubLoader { fail: true, ..StubLoader::default() });

        let search = engine(loader.clone()).search("hoodie").await;
        let recommend = engine(loader).recommend(&UserId::new("u1")).await;

        let expected = RankingError::Loader(LoaderError::Unavailable("connection refused".into()));
        assert_eq!(search, Err(expected.clone()));
        assert_eq!(recommend, Err(expected));
    }

    #[tokio::test]
    async fn cold_start_ranks_by_unit_sales_only() {
        let loader = Arc::new(StubLoader {
            catalog: catalog(),
            orders: vec![("u2", 6, 3), ("u2", 2, 1), ("u3", 6, 1), ("u3", 4, 5), ("u4", 2, 1)],
            ..StubLoader::default()
        });

        let shortlist = engine(loader).recommend(&UserId::new("newcomer")).await.unwrap();

        assert_eq!(shortlist.pass, RankingPass::ColdStart);
        // 4:5, 6:4, 2:2, then unsold items in catalog order
        assert_eq!(ids(&shortlist), vec![4, 6, 2, 1, 3, 5, 7, 8]);
    }

    #[tokio::test]
    async fn cold_start_is_truncated_to_its_own_limit() {
        let mut large = catalog();
        large.extend((9..=20).map(|id| product(id, "Extra", "electronics", 10)));
        let loader = Arc::new(StubLoader { catalog: large, ..StubLoader::default() });

        let shortlist = engine(loader).recommend(&UserId::new("newcomer")).await.unwrap();

        assert_eq!(shortlist.len(), 8);
    }

    #[tokio::test]
    async fn cold_start_finds_best_sellers_beyond_the_recommendation_pool() {
        let mut large: Vec<ProductCandidate> =
            (1..=250).map(|id| product(id, "Filler", "electronics", 10)).collect();
        large.push(product(300, "Best Seller", "electronics", 10));
        let loader = Arc::new(StubLoader {
            catalog: large,
            orders: vec![("u1", 300, 50), ("u2", 3, 1)],
            ..StubLoader::default()
        });

        let shortlist = engine(loader).recommend(&UserId::new("newcomer")).await.unwrap();

        assert_eq!(ids(&shortlist), vec![300, 3, 1, 2, 4, 5, 6, 7]);
    }

    #[tokio::test]
    async fn hybrid_blends_co_purchase_content_and_popularity() {
        let loader = Arc::new(StubLoader {
            catalog: catalog(),
            orders: vec![
                ("alice", 1, 1),
                ("bob", 1, 1),
                ("bob", 6, 1),
                ("carol", 7, 4),
                ("dave", 1, 1),
                ("dave", 6, 1),
            ],
            ..StubLoader::default()
        });

        let shortlist = engine(loader).recommend(&UserId::new("alice")).await.unwrap();

        assert_eq!(shortlist.pass, RankingPass::Hybrid);
        assert!(!ids(&shortlist).contains(&1), "purchased products are excluded");
        // 6: collab 2*0.5 + pop 2*0.2 = 1.4; 2: content (category 2 + tag 1)*0.3 = 0.9;
        // 7: pop 4*0.2 = 0.8; 3: category 2*0.3 = 0.6
        assert_eq!(&ids(&shortlist)[..4], &[6, 2, 7, 3]);

        let top = &shortlist.items[0];
        let components = top.components.expect("hybrid components");
        assert_eq!(components.collaborative, 2.0);
        assert_eq!(components.popularity, 2.0);
        assert!((top.relevance_score - 1.4).abs() < 1e-9);
    }

    #[tokio::test]
    async fn missing_user_id_is_rejected() {
        let loader = Arc::new(StubLoader::default());

        let result = engine(loader).recommend(&UserId::new(" ")).await;

        assert_eq!(result, Err(RankingError::Domain(DomainError::MissingUserId)));
    }

    #[tokio::test]
    async fn limits_come_from_configuration() {
        let loader = Arc::new(StubLoader { catalog: catalog(), ..StubLoader::default() });
        let config = RankingConfig {
            limits: RankingLimits { result_limit: 1, ..RankingLimits::default() },
            ..RankingConfig::default()
        };
        let engine = RankingEngine::with_config(loader, config, SignalExtractor::default());

        let shortlist = engine.search("casual clothing for men").await.unwrap();

        assert_eq!(shortlist.len(), 1);
    }
}
