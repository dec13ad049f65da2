//! Feature selection utilities.
//!
//! Ranks features by the importance scores of a fitted ensemble and keeps
//! the top K as the inference contract.
pub mod importance_ranking;

pub use importance_ranking::{rank_features, RankedFeature, SelectKBest, TOP_K};
