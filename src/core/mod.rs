// Core algorithm exports
pub mod catalog;
pub mod predicate;
pub mod probability;
pub mod recommender;
pub mod score_rank;
pub mod subjects;

pub use catalog::Catalog;
pub use predicate::{Predicate, PredicateBuilder, SqlValue, Statement};
pub use probability::{classify, classify_or_fallback, Classification};
pub use recommender::{RecommendLimits, Recommender, ScoreWindow};
pub use score_rank::{ScoreRankEntry, ScoreRankIndex, ScoreRankTable};
pub use subjects::{Subject, SubjectFilter};
