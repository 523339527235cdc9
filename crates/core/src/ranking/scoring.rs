//! Scoring for search relevance and hybrid recommendations

use super::context::UserSignalContext;
use super::types::ComponentScores;
use crate::domain::product::ProductCandidate;
use crate::signals::SignalSet;

/// Weights for every scoring signal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    /// Per keyword found in the title (default: 5)
    pub keyword_title: f64,
    /// Per keyword found in the description, on top of the title bonus (default: 3)
    pub keyword_description: f64,
    /// Per vibe term found in the title (default: 3)
    pub vibe_title: f64,
    /// Per vibe term found in the description (default: 2)
    pub vibe_description: f64,
    /// Candidate category already bought by the user (default: 2)
    pub category_affinity: f64,
    /// Per tag shared with the user's purchases (default: 1)
    pub tag_affinity: f64,
    /// Blend weight for co-purchase affinity (default: 0.5)
    pub collaborative: f64,
    /// Blend weight for content affinity (default: 0.3)
    pub content: f64,
    /// Blend weight for unit sales (default: 0.2)
    pub popularity: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        super::DEFAULT_WEIGHTS
    }
}

impl ScoringWeights {
    pub fn all(&self) -> [(&'static str, f64); 9] {
        [
            ("keyword_title", self.keyword_title),
            ("keyword_description", self.keyword_description),
            ("vibe_title", self.vibe_title),
            ("vibe_description", self.vibe_description),
            ("category_affinity", self.category_affinity),
            ("tag_affinity", self.tag_affinity),
            ("collaborative", self.collaborative),
            ("content", self.content),
            ("popularity", self.popularity),
        ]
    }
}

/// Bounds on loader fetches and ranked output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankingLimits {
    /// Candidates requested from the loader per search pass
    pub candidate_limit: usize,
    /// Ranked search and hybrid recommendation results
    pub result_limit: usize,
    /// Popularity-only results for users without history
    pub cold_start_limit: usize,
    /// Catalog items considered for recommendations
    pub recommendation_pool_limit: usize,
}

impl Default for RankingLimits {
    fn default() -> Self {
        super::DEFAULT_LIMITS
    }
}

/// Immutable weights and limits injected into the scorer and engine.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RankingConfig {
    pub weights: ScoringWeights,
    pub limits: RankingLimits,
}

/// Deterministic scorer. Holds no state beyond its weights.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelevanceScorer {
    weights: ScoringWeights,
}

impl RelevanceScorer {
    /// Create a scorer with default weights
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom weights
    pub fn with_weights(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Score one candidate: hybrid blend when a user context is given,
    /// keyword and vibe relevance otherwise.
    pub fn score(
        &self,
        candidate: &ProductCandidate,
        signals: &SignalSet,
        user_context: Option<&UserSignalContext>,
    ) -> f64 {
        match user_context {
            Some(context) => self.calculate_total_score(&self.hybrid_components(candidate, context)),
            None => self.text_relevance(candidate, signals),
        }
    }

    /// Keyword and vibe matches against title and description, case-insensitive.
    pub fn text_relevance(&self, candidate: &ProductCandidate, signals: &SignalSet) -> f64 {
        let title = candidate.title.to_lowercase();
        let description = candidate.description.as_deref().unwrap_or_default().to_lowercase();

        let mut score = 0.0;

        for keyword in &signals.keywords {
            if title.contains(keyword.as_str()) {
                score += self.weights.keyword_title;
            }
            if description.contains(keyword.as_str()) {
                score += self.weights.keyword_description;
            }
        }

        for vibe in &signals.vibes {
            if title.contains(vibe.as_str()) {
                score += self.weights.vibe_title;
            }
            if description.contains(vibe.as_str()) {
                score += self.weights.vibe_description;
            }
        }

        score
    }

    /// Raw collaborative, content and popularity terms for one candidate.
    pub fn hybrid_components(
        &self,
        candidate: &ProductCandidate,
        context: &UserSignalContext,
    ) -> ComponentScores {
        let collaborative = context.co_purchase_affinity(&candidate.id) as f64;

        let mut content = 0.0;
        if context.has_category(&candidate.category) {
            content += self.weights.category_affinity;
        }
        content += context.shared_tag_count(&candidate.tags) as f64 * self.weights.tag_affinity;

        let popularity = context.units_sold(&candidate.id) as f64;

        ComponentScores { collaborative, content, popularity }
    }

    /// Blend components in fixed order: collaborative, content, popularity.
    pub fn calculate_total_score(&self, components: &ComponentScores) -> f64 {
        components.collaborative * self.weights.collaborative
            + components.content * self.weights.content
            + components.popularity * self.weights.popularity
    }
}
