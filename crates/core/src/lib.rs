pub mod config;
pub mod domain;
pub mod errors;
pub mod ranking;
pub mod signals;

pub use domain::product::{ProductCandidate, ProductId, ProductRating};
pub use domain::purchase::{PurchaseHistory, UserId};
pub use errors::{ApplicationError, DomainError, InterfaceError, RankingError};
pub use ranking::{
    CandidateLoader, CandidateQuery, ComponentScores, LoaderError, RankedShortlist, RankingConfig,
    RankingEngine, RankingPass, RelevanceScorer, ScoredCandidate,
};
pub use signals::{Category, SignalExtractor, SignalSet, SignalVocabulary};
