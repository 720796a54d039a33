//! Forecast output for a single future year.

use serde::{Deserialize, Serialize};

/// One year of the hybrid forecast, kept together with its two components.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// Forecast year, strictly after the last observed year.
    pub year: i32,
    /// Point forecast of the trend model.
    pub baseline_trend: f64,
    /// Residual predicted by the corrector.
    pub residual_correction: f64,
    /// `baseline_trend + residual_correction`.
    pub predicted_sales: f64,
}

impl ForecastPoint {
    pub fn new(year: i32, baseline_trend: f64, residual_correction: f64) -> Self {
        Self {
            year,
            baseline_trend,
            residual_correction,
            predicted_sales: baseline_trend + residual_correction,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.baseline_trend.is_finite()
            && self.residual_correction.is_finite()
            && self.predicted_sales.is_finite()
    }
}
