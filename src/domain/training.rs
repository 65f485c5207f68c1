//! Split, fit and score a regressor.

use super::error::TraderError;
use super::forest::RandomForestRegressor;
use super::metrics::rmse;
use super::model::{ModelConfig, build_model};
use super::split::{SplitPolicy, split_indices, take};

/// 80/20 shuffled split with a fixed seed, for cross-sectional data.
pub const SHUFFLED_80_20: SplitPolicy = SplitPolicy::Shuffled {
    test_ratio: 0.2,
    seed: 42,
};

/// 80/20 positional split, for time series.
pub const CHRONOLOGICAL_80_20: SplitPolicy = SplitPolicy::Chronological { test_ratio: 0.2 };

#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub model: RandomForestRegressor,
    pub rmse: f64,
    pub n_train: usize,
    pub n_test: usize,
}

/// Fit the configured model on the training partition of `(x, y)` and
/// report RMSE on the held-out partition.
pub fn train_and_evaluate(
    x: &[Vec<f64>],
    y: &[f64],
    policy: &SplitPolicy,
    config: &ModelConfig,
) -> Result<TrainingOutcome, TraderError> {
    if x.len() != y.len() {
        return Err(TraderError::fit(format!(
            "found {} samples but {} targets",
            x.len(),
            y.len()
        )));
    }

    let split = split_indices(x.len(), policy)?;
    let x_train = take(x, &split.train);
    let y_train = take(y, &split.train);
    let x_test = take(x, &split.test);
    let y_test = take(y, &split.test);

    let mut model = build_model(config);
    model.fit(&x_train, &y_train)?;
    let predictions = model.predict(&x_test)?;
    let rmse = rmse(&predictions, &y_test)?;

    Ok(TrainingOutcome {
        model,
        rmse,
        n_train: split.train.len(),
        n_test: split.test.len(),
    })
}
