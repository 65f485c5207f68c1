//! Model factory and its hyperparameters.

use super::forest::RandomForestRegressor;

/// Random forest hyperparameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    /// Number of trees in the forest
    pub n_estimators: usize,
    /// Base seed; tree `i` uses `seed + i`
    pub seed: u64,
    /// Maximum tree depth (None grows until leaves are pure)
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features sampled per split (None considers all)
    pub max_features: Option<usize>,
    /// Train each tree on a bootstrap sample
    pub bootstrap: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            seed: 42,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            bootstrap: true,
        }
    }
}

impl ModelConfig {
    /// Settings used for the next-day-close equity model.
    pub fn equity() -> Self {
        Self {
            n_estimators: 200,
            ..Self::default()
        }
    }
}

/// A fresh, untrained regressor.
pub fn build_model(config: &ModelConfig) -> RandomForestRegressor {
    RandomForestRegressor::new(config.clone())
}
