//! Random forest regressor with impurity-based feature importances.
//!
//! Trees are CART regressors grown on bootstrap samples, split on the
//! threshold that minimizes the summed squared error of both children.
//! Every accepted split credits its feature with the squared-error
//! reduction it achieved; per-tree totals are normalized, averaged over the
//! forest, and normalized again so importances sum to one.
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::ForestParams;
use crate::error::ModelError;
use crate::math::Array2;
use crate::models::regressor_trait::Regressor;

#[derive(Clone, Debug, Serialize, Deserialize)]
enum Node {
    Leaf {
        value: f32,
    },
    Split {
        feature: usize,
        threshold: f32,
        left: usize,
        right: usize,
    },
}

/// A single fitted regression tree. Node 0 is the root.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

impl RegressionTree {
    pub fn predict_row(&self, row: &[f32]) -> f32 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

struct BestSplit {
    feature: usize,
    threshold: f32,
    child_sse: f64,
}

struct TreeBuilder<'a> {
    x: &'a Array2<f32>,
    y: &'a [f32],
    params: &'a ForestParams,
    rng: StdRng,
    nodes: Vec<Node>,
    importances: Vec<f64>,
}

impl<'a> TreeBuilder<'a> {
    fn new(x: &'a Array2<f32>, y: &'a [f32], params: &'a ForestParams, seed: u64) -> Self {
        TreeBuilder {
            x,
            y,
            params,
            rng: StdRng::seed_from_u64(seed),
            nodes: Vec::new(),
            importances: vec![0.0; x.ncols()],
        }
    }

    fn build(&mut self, indices: &mut [usize], depth: usize) -> usize {
        let n = indices.len() as f64;
        let (sum, sum_sq) = indices.iter().fold((0.0f64, 0.0f64), |(s, sq), &i| {
            let v = self.y[i] as f64;
            (s + v, sq + v * v)
        });
        let sse = (sum_sq - sum * sum / n).max(0.0);

        let id = self.nodes.len();
        self.nodes.push(Node::Leaf {
            value: (sum / n) as f32,
        });

        let depth_exhausted = self.params.max_depth.map_or(false, |d| depth >= d);
        if depth_exhausted
            || indices.len() < self.params.min_samples_split.max(2)
            || sse <= 1e-12 * sum_sq.max(1.0)
        {
            return id;
        }

        let Some(best) = self.best_split(indices) else {
            return id;
        };
        self.importances[best.feature] += (sse - best.child_sse).max(0.0);

        let mut mid = 0;
        for k in 0..indices.len() {
            if self.x[(indices[k], best.feature)] <= best.threshold {
                indices.swap(mid, k);
                mid += 1;
            }
        }

        let (left_idx, right_idx) = indices.split_at_mut(mid);
        let left = self.build(left_idx, depth + 1);
        let right = self.build(right_idx, depth + 1);
        self.nodes[id] = Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
        };
        id
    }

    fn candidate_features(&mut self) -> Vec<usize> {
        let n_features = self.x.ncols();
        match self.params.max_features {
            Some(m) if m > 0 && m < n_features => {
                rand::seq::index::sample(&mut self.rng, n_features, m).into_vec()
            }
            _ => (0..n_features).collect(),
        }
    }

    fn best_split(&mut self, indices: &[usize]) -> Option<BestSplit> {
        let min_leaf = self.params.min_samples_leaf.max(1);
        let n = indices.len();
        let mut best: Option<BestSplit> = None;
        let mut pairs: Vec<(f32, f64)> = Vec::with_capacity(n);

        for feature in self.candidate_features() {
            pairs.clear();
            pairs.extend(
                indices
                    .iter()
                    .map(|&i| (self.x[(i, feature)], self.y[i] as f64)),
            );
            pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
            if pairs[0].0 == pairs[n - 1].0 {
                continue;
            }

            let total: f64 = pairs.iter().map(|p| p.1).sum();
            let total_sq: f64 = pairs.iter().map(|p| p.1 * p.1).sum();
            let mut left_sum = 0.0;
            let mut left_sq = 0.0;

            for i in 0..n - 1 {
                let v = pairs[i].1;
                left_sum += v;
                left_sq += v * v;
                if pairs[i].0 == pairs[i + 1].0 {
                    continue;
                }
                let n_left = i + 1;
                let n_right = n - n_left;
                if n_left < min_leaf || n_right < min_leaf {
                    continue;
                }
                let right_sum = total - left_sum;
                let right_sq = total_sq - left_sq;
                let child_sse = (left_sq - left_sum * left_sum / n_left as f64).max(0.0)
                    + (right_sq - right_sum * right_sum / n_right as f64).max(0.0);

                if best.as_ref().map_or(true, |b| child_sse < b.child_sse) {
                    let lo = pairs[i].0;
                    let hi = pairs[i + 1].0;
                    let mut threshold = lo + (hi - lo) / 2.0;
                    if threshold >= hi {
                        threshold = lo;
                    }
                    best = Some(BestSplit {
                        feature,
                        threshold,
                        child_sse,
                    });
                }
            }
        }

        best
    }
}

/// Bagged ensemble of regression trees.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RandomForestRegressor {
    params: ForestParams,
    n_features: usize,
    trees: Vec<RegressionTree>,
    importances: Vec<f64>,
}

impl RandomForestRegressor {
    pub fn new(params: ForestParams) -> Self {
        RandomForestRegressor {
            params,
            n_features: 0,
            trees: Vec::new(),
            importances: Vec::new(),
        }
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Impurity-based importances, one per training column, summing to one
    /// (all zeros when no tree managed a split). Empty before `fit`.
    pub fn feature_importances(&self) -> &[f64] {
        &self.importances
    }
}

fn normalize(values: &mut [f64]) {
    let total: f64 = values.iter().sum();
    if total > 0.0 {
        values.iter_mut().for_each(|v| *v /= total);
    }
}

impl Regressor for RandomForestRegressor {
    fn fit(&mut self, x: &Array2<f32>, y: &[f32]) -> Result<(), ModelError> {
        let (n_samples, n_features) = x.shape();
        if n_samples == 0 || n_features == 0 {
            return Err(ModelError::EmptyTrainingSet);
        }
        if y.len() != n_samples {
            return Err(ModelError::FeatureCountMismatch {
                expected: n_samples,
                got: y.len(),
            });
        }

        let params = &self.params;
        let fitted: Vec<(RegressionTree, Vec<f64>)> = (0..params.n_estimators.max(1))
            .into_par_iter()
            .map(|t| {
                let seed = params.random_state.wrapping_add(t as u64);
                let mut builder = TreeBuilder::new(x, y, params, seed);
                let mut indices: Vec<usize> = if params.bootstrap {
                    (0..n_samples)
                        .map(|_| builder.rng.gen_range(0..n_samples))
                        .collect()
                } else {
                    (0..n_samples).collect()
                };
                builder.build(&mut indices, 0);
                let mut importances = builder.importances;
                normalize(&mut importances);
                (
                    RegressionTree {
                        nodes: builder.nodes,
                    },
                    importances,
                )
            })
            .collect();

        let mut importances = vec![0.0f64; n_features];
        let mut contributing = 0usize;
        for (tree, tree_imp) in &fitted {
            if tree.node_count() > 1 {
                contributing += 1;
                for (acc, v) in importances.iter_mut().zip(tree_imp) {
                    *acc += v;
                }
            }
        }
        if contributing > 0 {
            importances
                .iter_mut()
                .for_each(|v| *v /= contributing as f64);
            normalize(&mut importances);
        }

        log::debug!(
            "Fitted {} trees on {} samples x {} features",
            fitted.len(),
            n_samples,
            n_features
        );

        self.n_features = n_features;
        self.trees = fitted.into_iter().map(|(tree, _)| tree).collect();
        self.importances = importances;
        Ok(())
    }

    fn predict(&self, x: &Array2<f32>) -> Result<Vec<f32>, ModelError> {
        if self.trees.is_empty() {
            return Err(ModelError::NotFitted);
        }
        if x.ncols() != self.n_features {
            return Err(ModelError::FeatureCountMismatch {
                expected: self.n_features,
                got: x.ncols(),
            });
        }
        let n_trees = self.trees.len() as f64;
        Ok(x
            .rows()
            .map(|row| {
                let total: f64 = self
                    .trees
                    .iter()
                    .map(|t| t.predict_row(row) as f64)
                    .sum();
                (total / n_trees) as f32
            })
            .collect())
    }

    fn name(&self) -> &str {
        "RandomForestRegressor"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// y depends only on column 1; columns 0 and 2 are noise / constant.
    fn synthetic() -> (Array2<f32>, Vec<f32>) {
        let mut data = Vec::new();
        let mut y = Vec::new();
        for i in 0..60 {
            let signal = i as f32;
            let noise = ((i * 7919) % 13) as f32;
            data.extend_from_slice(&[noise, signal, 5.0]);
            y.push(3.0 * signal + 10.0);
        }
        (Array2::from_shape_vec((60, 3), data).unwrap(), y)
    }

    #[test]
    fn importances_favor_informative_column() {
        let (x, y) = synthetic();
        let mut forest = RandomForestRegressor::new(ForestParams {
            n_estimators: 20,
            ..ForestParams::default()
        });
        forest.fit(&x, &y).unwrap();

        let imp = forest.feature_importances();
        assert_eq!(imp.len(), 3);
        assert!((imp.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(imp[1] > imp[0]);
        assert_eq!(imp[2], 0.0);
    }

    #[test]
    fn fit_is_deterministic_for_a_seed() {
        let (x, y) = synthetic();
        let params = ForestParams {
            n_estimators: 8,
            max_features: Some(2),
            ..ForestParams::default()
        };
        let mut a = RandomForestRegressor::new(params.clone());
        let mut b = RandomForestRegressor::new(params);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a.feature_importances(), b.feature_importances());
        assert_eq!(a.predict(&x).unwrap(), b.predict(&x).unwrap());
    }

    #[test]
    fn predictions_track_the_target() {
        let (x, y) = synthetic();
        let mut forest = RandomForestRegressor::new(ForestParams {
            n_estimators: 30,
            ..ForestParams::default()
        });
        forest.fit(&x, &y).unwrap();
        let preds = forest.predict(&x).unwrap();
        let mae: f32 = preds.iter().zip(&y).map(|(p, t)| (p - t).abs()).sum::<f32>() / y.len() as f32;
        assert!(mae < 15.0, "mae too large: {}", mae);
    }

    #[test]
    fn predict_checks_width_and_fit_state() {
        let forest = RandomForestRegressor::new(ForestParams::default());
        let x = Array2::from_shape_vec((1, 2), vec![0.0, 0.0]).unwrap();
        assert_eq!(forest.predict(&x), Err(ModelError::NotFitted));

        let (train, y) = synthetic();
        let mut forest = RandomForestRegressor::new(ForestParams {
            n_estimators: 2,
            ..ForestParams::default()
        });
        forest.fit(&train, &y).unwrap();
        assert_eq!(
            forest.predict(&x),
            Err(ModelError::FeatureCountMismatch { expected: 3, got: 2 })
        );
    }
}
