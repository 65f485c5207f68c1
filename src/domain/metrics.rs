//! Regression error metrics.

use super::error::TraderError;

fn check_lengths(predictions: &[f64], actual: &[f64]) -> Result<(), TraderError> {
    if predictions.len() != actual.len() {
        return Err(TraderError::fit(format!(
            "found {} predictions for {} targets",
            predictions.len(),
            actual.len()
        )));
    }
    if actual.is_empty() {
        return Err(TraderError::fit("cannot score an empty held-out set"));
    }
    Ok(())
}

/// mean((prediction - actual)^2)
pub fn mean_squared_error(predictions: &[f64], actual: &[f64]) -> Result<f64, TraderError> {
    check_lengths(predictions, actual)?;
    let sum: f64 = predictions
        .iter()
        .zip(actual)
        .map(|(p, a)| (p - a).powi(2))
        .sum();
    Ok(sum / actual.len() as f64)
}

/// sqrt(mean((prediction - actual)^2))
pub fn rmse(predictions: &[f64], actual: &[f64]) -> Result<f64, TraderError> {
    mean_squared_error(predictions, actual).map(f64::sqrt)
}
