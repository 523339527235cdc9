//! Hybrid product ranking.
//!
//! One scoring core serves two call sites: the search/chat path scores
//! candidates against keyword and vibe signals, the recommendation path
//! blends co-purchase affinity, content affinity and popularity. Both then
//! go through the same selector: stable descending sort, relevance floor,
//! truncation.

mod context;
mod engine;
mod loader;
mod scoring;
mod selector;
mod types;

pub use context::UserSignalContext;
pub use engine::RankingEngine;
pub use loader::{CandidateLoader, CandidateQuery, LoaderError};
pub use scoring::{RankingConfig, RankingLimits, RelevanceScorer, ScoringWeights};
pub use selector::{select, Retention};
pub use types::*;

use crate::errors::RankingError;

/// Result type for ranking operations
pub type RankingResult<T> = Result<T, RankingError>;

/// Default scoring weights
pub const DEFAULT_WEIGHTS: ScoringWeights = ScoringWeights {
    keyword_title: 5.0,
    keyword_description: 3.0,
    vibe_title: 3.0,
    vibe_description: 2.0,
    category_affinity: 2.0,
    tag_affinity: 1.0,
    collaborative: 0.5,
    content: 0.3,
    popularity: 0.2,
};

/// Default candidate and result bounds
pub const DEFAULT_LIMITS: RankingLimits = RankingLimits {
    candidate_limit: 30,
    result_limit: 10,
    cold_start_limit: 8,
    recommendation_pool_limit: 200,
};
