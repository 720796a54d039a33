//! Accuracy metrics for holdout evaluation.

use serde::Serialize;

/// Error summary of predictions against held-out actuals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccuracyMetrics {
    /// Number of compared points.
    pub n: usize,
    /// Mean Absolute Error
    pub mae: f64,
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Symmetric Mean Absolute Percentage Error
    pub smape: f64,
    /// Coefficient of determination; 1.0 when the actuals are constant.
    pub r_squared: f64,
}

/// Compare `predicted` against `actual`.
///
/// Returns `None` when either side is empty or the lengths differ.
pub fn calculate_metrics(actual: &[f64], predicted: &[f64]) -> Option<AccuracyMetrics> {
    if actual.is_empty() || actual.len() != predicted.len() {
        return None;
    }

    let n = actual.len() as f64;
    let errors: Vec<f64> = actual.iter().zip(predicted).map(|(a, p)| a - p).collect();

    let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;
    let sse = errors.iter().map(|e| e * e).sum::<f64>();
    let mse = sse / n;

    let smape = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| {
            let denom = a.abs() + p.abs();
            if denom == 0.0 {
                0.0
            } else {
                2.0 * (a - p).abs() / denom
            }
        })
        .sum::<f64>()
        * 100.0
        / n;

    let mean = actual.iter().sum::<f64>() / n;
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();
    let r_squared = if ss_tot == 0.0 { 1.0 } else { 1.0 - sse / ss_tot };

    Some(AccuracyMetrics {
        n: actual.len(),
        mae,
        mse,
        rmse: mse.sqrt(),
        smape,
        r_squared,
    })
}
