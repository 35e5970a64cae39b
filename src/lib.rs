//! Gaokao Recommend - admission recommendation service
//!
//! Classifies universities and major groups into rush / stable / safe tiers
//! for a candidate's score or rank, using historical admission lines and
//! per-province score distributions.

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{Catalog, PredicateBuilder, RecommendLimits, Recommender, ScoreRankIndex, SubjectFilter};
pub use error::RecommendError;
pub use models::{MajorGroup, MajorGroupRequest, Strategy, UniversityPage, UniversityPriorityRequest};
