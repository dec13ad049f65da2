//! Importance-based feature ranking.
//!
//! The ranking is a stable descending sort: features with equal scores keep
//! the relative order they had in the input column list. Re-running training
//! on identical data therefore produces an identical manifest.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::error::RankingError;
use crate::models::forest::RandomForestRegressor;

/// Number of features kept in the manifest.
pub const TOP_K: usize = 10;

/// A feature identifier with the score it was ranked by.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedFeature {
    pub identifier: String,
    pub score: f64,
}

/// Rank all features from most to least important.
///
/// `identifiers` and `scores` are parallel; identifiers must be unique and
/// scores finite and non-negative.
pub fn rank_features(
    identifiers: &[String],
    scores: &[f64],
) -> Result<Vec<RankedFeature>, RankingError> {
    if identifiers.len() != scores.len() {
        return Err(RankingError::LengthMismatch {
            identifiers: identifiers.len(),
            scores: scores.len(),
        });
    }

    let mut seen = HashSet::with_capacity(identifiers.len());
    for (id, &score) in identifiers.iter().zip(scores) {
        if !seen.insert(id.as_str()) {
            return Err(RankingError::DuplicateIdentifier(id.clone()));
        }
        if !score.is_finite() || score < 0.0 {
            return Err(RankingError::InvalidScore {
                identifier: id.clone(),
                score,
            });
        }
    }

    let mut ranked: Vec<RankedFeature> = identifiers
        .iter()
        .zip(scores)
        .map(|(id, &score)| RankedFeature {
            identifier: id.clone(),
            score,
        })
        .collect();

    // `sort_by` is stable: ties keep input order.
    ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    Ok(ranked)
}

/// Keeps the `k` highest-ranked features.
pub struct SelectKBest {
    /// The number of top features to select.
    k: usize,
}

impl SelectKBest {
    pub fn new(k: usize) -> Self {
        SelectKBest { k }
    }

    /// Rank and truncate. Fewer than `k` features selects all of them.
    pub fn fit(
        &self,
        identifiers: &[String],
        scores: &[f64],
    ) -> Result<Vec<RankedFeature>, RankingError> {
        let mut ranked = rank_features(identifiers, scores)?;
        ranked.truncate(self.k);
        Ok(ranked)
    }

    /// Rank the columns a fitted forest was trained on.
    pub fn fit_forest(
        &self,
        forest: &RandomForestRegressor,
        feature_names: &[String],
    ) -> Result<Vec<RankedFeature>, RankingError> {
        self.fit(feature_names, forest.feature_importances())
    }

    /// Identifiers only, in ranked order.
    pub fn select(
        &self,
        identifiers: &[String],
        scores: &[f64],
    ) -> Result<Vec<String>, RankingError> {
        Ok(self
            .fit(identifiers, scores)?
            .into_iter()
            .map(|f| f.identifier)
            .collect())
    }
}

impl Default for SelectKBest {
    fn default() -> Self {
        SelectKBest::new(TOP_K)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn ties_keep_input_order() {
        let selected = SelectKBest::new(2)
            .select(&ids(&["A", "B", "C"]), &[0.1, 0.9, 0.9])
            .unwrap();
        assert_eq!(selected, ids(&["B", "C"]));
    }

    #[test]
    fn distinct_scores_sort_descending() {
        let ranked = rank_features(&ids(&["a", "b", "c", "d"]), &[0.2, 0.05, 0.5, 0.25]).unwrap();
        let order: Vec<&str> = ranked.iter().map(|f| f.identifier.as_str()).collect();
        assert_eq!(order, vec!["c", "d", "a", "b"]);
    }

    #[test]
    fn fewer_than_k_selects_everything() {
        let selected = SelectKBest::default()
            .select(&ids(&["x", "y"]), &[0.3, 0.7])
            .unwrap();
        assert_eq!(selected, ids(&["y", "x"]));
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(
            rank_features(&ids(&["a", "b"]), &[0.1]),
            Err(RankingError::LengthMismatch {
                identifiers: 2,
                scores: 1
            })
        );
        assert_eq!(
            rank_features(&ids(&["a", "a"]), &[0.1, 0.2]),
            Err(RankingError::DuplicateIdentifier("a".to_string()))
        );
        assert!(matches!(
            rank_features(&ids(&["a"]), &[f64::NAN]),
            Err(RankingError::InvalidScore { .. })
        ));
        assert!(matches!(
            rank_features(&ids(&["a"]), &[-0.5]),
            Err(RankingError::InvalidScore { .. })
        ));
    }

    #[test]
    fn empty_input_is_empty_ranking() {
        assert!(SelectKBest::default().select(&[], &[]).unwrap().is_empty());
    }
}
