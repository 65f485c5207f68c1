//! Random forest regressor.
//!
//! Bagged regression trees grown on squared-error reduction. Everything is
//! single-threaded and driven by seeded ChaCha8 generators, so a given
//! [`ModelConfig`] and training set always produce the same forest.

use super::error::TraderError;
use super::model::ModelConfig;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// One regression tree, nodes stored in an arena with the root at index 0.
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionTree {
    nodes: Vec<Node>,
    importances: Vec<f64>,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

struct TreeBuilder<'a> {
    x: &'a [Vec<f64>],
    y: &'a [f64],
    config: &'a ModelConfig,
    n_features: usize,
    rng: ChaCha8Rng,
    nodes: Vec<Node>,
    importances: Vec<f64>,
}

impl<'a> TreeBuilder<'a> {
    fn build(&mut self, indices: &mut [usize], depth: usize) -> usize {
        let n = indices.len();
        let (sum, sum_sq) = indices.iter().fold((0.0, 0.0), |(s, sq), &i| {
            (s + self.y[i], sq + self.y[i] * self.y[i])
        });
        let mean = sum / n as f64;
        let sse = (sum_sq - sum * mean).max(0.0);

        let depth_reached = self.config.max_depth.is_some_and(|d| depth >= d);
        if depth_reached
            || n < self.config.min_samples_split
            || n < 2 * self.config.min_samples_leaf
            || sse <= 1e-12
        {
            return self.push(Node::Leaf { value: mean });
        }

        let Some(best) = self.best_split(indices, sum) else {
            return self.push(Node::Leaf { value: mean });
        };

        self.importances[best.feature] += best.gain;

        let mut cut = 0;
        for k in 0..n {
            if self.x[indices[k]][best.feature] <= best.threshold {
                indices.swap(cut, k);
                cut += 1;
            }
        }

        let id = self.push(Node::Leaf { value: mean });
        let (left_idx, right_idx) = indices.split_at_mut(cut);
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

    fn push(&mut self, node: Node) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn candidate_features(&mut self) -> Vec<usize> {
        let mut features: Vec<usize> = (0..self.n_features).collect();
        let k = self
            .config
            .max_features
            .unwrap_or(self.n_features)
            .clamp(1, self.n_features);
        if k < self.n_features {
            features.shuffle(&mut self.rng);
            features.truncate(k);
        }
        features
    }

    /// Best split by squared-error reduction, thresholds at midpoints between
    /// consecutive distinct values.
    fn best_split(&mut self, indices: &[usize], total: f64) -> Option<SplitCandidate> {
        let n = indices.len();
        let min_leaf = self.config.min_samples_leaf.max(1);
        let parent_score = total * total / n as f64;
        let mut best: Option<SplitCandidate> = None;
        let mut order = indices.to_vec();

        for feature in self.candidate_features() {
            order.sort_by(|&a, &b| self.x[a][feature].total_cmp(&self.x[b][feature]));

            let mut left_sum = 0.0;
            for pos in 0..n - 1 {
                left_sum += self.y[order[pos]];
                let here = self.x[order[pos]][feature];
                let next = self.x[order[pos + 1]][feature];
                if here == next {
                    continue;
                }
                let n_left = pos + 1;
                let n_right = n - n_left;
                if n_left < min_leaf || n_right < min_leaf {
                    continue;
                }

                let right_sum = total - left_sum;
                let score =
                    left_sum * left_sum / n_left as f64 + right_sum * right_sum / n_right as f64;
                let gain = score - parent_score;
                if gain > 1e-12 && best.as_ref().is_none_or(|b| gain > b.gain) {
                    let mut threshold = (here + next) / 2.0;
                    // Adjacent floats can round the midpoint up to `next`.
                    if threshold >= next {
                        threshold = here;
                    }
                    best = Some(SplitCandidate {
                        feature,
                        threshold,
                        gain,
                    });
                }
            }
        }

        best
    }
}

impl RegressionTree {
    fn fit(
        x: &[Vec<f64>],
        y: &[f64],
        indices: &mut [usize],
        config: &ModelConfig,
        rng: ChaCha8Rng,
    ) -> Self {
        let n_features = x[0].len();
        let mut builder = TreeBuilder {
            x,
            y,
            config,
            n_features,
            rng,
            nodes: Vec::new(),
            importances: vec![0.0; n_features],
        };
        builder.build(indices, 0);

        let total: f64 = builder.importances.iter().sum();
        if total > 0.0 {
            for imp in &mut builder.importances {
                *imp /= total;
            }
        }

        Self {
            nodes: builder.nodes,
            importances: builder.importances,
        }
    }

    pub fn predict_one(&self, row: &[f64]) -> f64 {
        let mut id = 0;
        loop {
            match &self.nodes[id] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    id = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], id: usize) -> usize {
            match &nodes[id] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        walk(&self.nodes, 0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RandomForestRegressor {
    config: ModelConfig,
    trees: Vec<RegressionTree>,
    n_features: usize,
}

impl RandomForestRegressor {
    /// An untrained forest.
    pub fn new(config: ModelConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            n_features: 0,
        }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }

    /// Train on `x` (rows are samples) against `y`.
    pub fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<(), TraderError> {
        validate_training_input(x, y)?;
        if self.config.n_estimators == 0 {
            return Err(TraderError::fit("n_estimators must be positive"));
        }

        let n = x.len();
        let mut trees = Vec::with_capacity(self.config.n_estimators);
        for t in 0..self.config.n_estimators {
            let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed.wrapping_add(t as u64));
            let mut indices: Vec<usize> = if self.config.bootstrap {
                (0..n).map(|_| rng.gen_range(0..n)).collect()
            } else {
                (0..n).collect()
            };
            trees.push(RegressionTree::fit(x, y, &mut indices, &self.config, rng));
        }

        self.n_features = x[0].len();
        self.trees = trees;
        Ok(())
    }

    pub fn predict_one(&self, row: &[f64]) -> Result<f64, TraderError> {
        if !self.is_fitted() {
            return Err(TraderError::fit("model has not been fitted"));
        }
        if row.len() != self.n_features {
            return Err(TraderError::fit(format!(
                "expected {} features, got {}",
                self.n_features,
                row.len()
            )));
        }
        let sum: f64 = self.trees.iter().map(|t| t.predict_one(row)).sum();
        Ok(sum / self.trees.len() as f64)
    }

    pub fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>, TraderError> {
        x.iter().map(|row| self.predict_one(row)).collect()
    }

    /// Mean normalized impurity decrease per feature.
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut out = vec![0.0; self.n_features];
        if self.trees.is_empty() {
            return out;
        }
        for tree in &self.trees {
            for (acc, imp) in out.iter_mut().zip(&tree.importances) {
                *acc += imp;
            }
        }
        let n = self.trees.len() as f64;
        out.iter_mut().for_each(|v| *v /= n);
        out
    }
}

fn validate_training_input(x: &[Vec<f64>], y: &[f64]) -> Result<(), TraderError> {
    if x.is_empty() {
        return Err(TraderError::fit("training set is empty"));
    }
    if x.len() != y.len() {
        return Err(TraderError::fit(format!(
            "found {} samples but {} targets",
            x.len(),
            y.len()
        )));
    }
    let width = x[0].len();
    if width == 0 {
        return Err(TraderError::fit("training set has no features"));
    }
    for (i, row) in x.iter().enumerate() {
        if row.len() != width {
            return Err(TraderError::fit(format!(
                "row {i} has {} features, expected {width}",
                row.len()
            )));
        }
        if row.iter().any(|v| !v.is_finite()) {
            return Err(TraderError::fit(format!("row {i} contains a non-finite value")));
        }
    }
    if let Some(i) = y.iter().position(|v| !v.is_finite()) {
        return Err(TraderError::fit(format!("target {i} is not finite")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn step_data() -> (Vec<Vec<f64>>, Vec<f64>) {
        let x: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64, (i % 3) as f64]).collect();
        let y: Vec<f64> = (0..20).map(|i| if i < 10 { 1.0 } else { 5.0 }).collect();
        (x, y)
    }

    fn single_tree() -> ModelConfig {
        ModelConfig {
            n_estimators: 1,
            bootstrap: false,
            ..ModelConfig::default()
        }
    }

    #[test]
    fn single_tree_learns_a_step() {
        let (x, y) = step_data();
        let mut model = RandomForestRegressor::new(single_tree());
        model.fit(&x, &y).unwrap();

        assert_relative_eq!(model.predict_one(&[3.0, 0.0]).unwrap(), 1.0);
        assert_relative_eq!(model.predict_one(&[15.0, 0.0]).unwrap(), 5.0);
        assert_eq!(model.trees()[0].n_leaves(), 2);
        assert_eq!(model.trees()[0].depth(), 1);
    }

    #[test]
    fn split_lands_between_distinct_values() {
        let (x, y) = step_data();
        let mut model = RandomForestRegressor::new(single_tree());
        model.fit(&x, &y).unwrap();

        // Threshold is 9.5, so 9.4 goes left and 9.6 goes right.
        assert_relative_eq!(model.predict_one(&[9.4, 0.0]).unwrap(), 1.0);
        assert_relative_eq!(model.predict_one(&[9.6, 0.0]).unwrap(), 5.0);
    }

    #[test]
    fn importances_favor_informative_feature() {
        let (x, y) = step_data();
        let mut model = RandomForestRegressor::new(ModelConfig {
            n_estimators: 10,
            ..ModelConfig::default()
        });
        model.fit(&x, &y).unwrap();

        let imp = model.feature_importances();
        assert_eq!(imp.len(), 2);
        assert!(imp[0] > imp[1]);
        assert_relative_eq!(imp.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn constant_target_gives_single_leaf() {
        let x: Vec<Vec<f64>> = (0..5).map(|i| vec![i as f64]).collect();
        let y = vec![3.0; 5];
        let mut model = RandomForestRegressor::new(single_tree());
        model.fit(&x, &y).unwrap();

        assert_eq!(model.trees()[0].n_leaves(), 1);
        assert_relative_eq!(model.predict_one(&[100.0]).unwrap(), 3.0);
    }

    #[test]
    fn max_depth_limits_growth() {
        let x: Vec<Vec<f64>> = (0..32).map(|i| vec![i as f64]).collect();
        let y: Vec<f64> = (0..32).map(|i| (i * i) as f64).collect();
        let mut model = RandomForestRegressor::new(ModelConfig {
            max_depth: Some(2),
            ..single_tree()
        });
        model.fit(&x, &y).unwrap();
        assert!(model.trees()[0].depth() <= 2);
        assert!(model.trees()[0].n_leaves() <= 4);
    }

    #[test]
    fn min_samples_leaf_is_respected() {
        let x: Vec<Vec<f64>> = (0..6).map(|i| vec![i as f64]).collect();
        let y = vec![0.0, 0.0, 0.0, 0.0, 0.0, 10.0];
        let mut model = RandomForestRegressor::new(ModelConfig {
            min_samples_leaf: 3,
            ..single_tree()
        });
        model.fit(&x, &y).unwrap();

        // The outlier cannot be isolated in a leaf of its own.
        assert!(model.predict_one(&[5.0]).unwrap() < 10.0);
    }

    #[test]
    fn same_seed_same_predictions() {
        let x: Vec<Vec<f64>> = (0..40)
            .map(|i| vec![i as f64, ((i * 7) % 11) as f64, ((i * 3) % 5) as f64])
            .collect();
        let y: Vec<f64> = x.iter().map(|r| r[0] * 0.5 + r[1] - r[2]).collect();

        let mut a = RandomForestRegressor::new(ModelConfig::default());
        let mut b = RandomForestRegressor::new(ModelConfig::default());
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a.predict(&x).unwrap(), b.predict(&x).unwrap());
    }

    #[test]
    fn fit_rejects_empty_input() {
        let mut model = RandomForestRegressor::new(ModelConfig::default());
        let err = model.fit(&[], &[]).unwrap_err();
        assert!(matches!(err, TraderError::Fit { .. }));
    }

    #[test]
    fn fit_rejects_shape_mismatch() {
        let mut model = RandomForestRegressor::new(ModelConfig::default());
        assert!(model.fit(&[vec![1.0], vec![2.0]], &[1.0]).is_err());
        assert!(model.fit(&[vec![1.0], vec![2.0, 3.0]], &[1.0, 2.0]).is_err());
    }

    #[test]
    fn fit_rejects_non_finite_values() {
        let mut model = RandomForestRegressor::new(ModelConfig::default());
        assert!(model.fit(&[vec![f64::NAN]], &[1.0]).is_err());
        assert!(model.fit(&[vec![1.0]], &[f64::INFINITY]).is_err());
    }

    #[test]
    fn predict_before_fit_fails() {
        let model = RandomForestRegressor::new(ModelConfig::default());
        assert!(!model.is_fitted());
        assert!(model.predict_one(&[1.0]).is_err());
    }

    #[test]
    fn predict_checks_width() {
        let (x, y) = step_data();
        let mut model = RandomForestRegressor::new(single_tree());
        model.fit(&x, &y).unwrap();
        assert!(model.predict_one(&[1.0]).is_err());
    }

    #[test]
    fn zero_estimators_is_a_fit_error() {
        let (x, y) = step_data();
        let mut model = RandomForestRegressor::new(ModelConfig {
            n_estimators: 0,
            ..ModelConfig::default()
        });
        assert!(matches!(model.fit(&x, &y), Err(TraderError::Fit { .. })));
    }
}
