//! Seams between the hybrid forecaster and its two component models.

use crate::core::YearlySeries;
use crate::error::Result;
use crate::features::LagFeatureRow;
use crate::utils::{calculate_metrics, AccuracyMetrics};

/// Baseline model capturing the level and trend of the yearly series.
pub trait TrendForecaster {
    /// Estimate parameters from the observed series.
    fn fit(&mut self, series: &YearlySeries) -> Result<()>;

    /// In-sample values on the original scale, one per observed year.
    fn fitted_values(&self) -> Option<&[f64]>;

    /// Point forecasts for the next `steps` years. Pure in the fitted parameters.
    fn forecast(&self, steps: usize) -> Result<Vec<f64>>;

    /// Get the model name.
    fn name(&self) -> &str;

    /// Check if the model has been fitted.
    fn is_fitted(&self) -> bool {
        self.fitted_values().is_some()
    }
}

/// Regressor mapping lag features to the trend model's residual.
pub trait ResidualRegressor {
    /// Train on labeled rows, in the order given.
    fn fit(&mut self, rows: &[LagFeatureRow]) -> Result<()>;

    /// One residual estimate per row.
    fn predict(&self, rows: &[LagFeatureRow]) -> Result<Vec<f64>>;

    /// Check if the model has been fitted.
    fn is_fitted(&self) -> bool;

    /// Get the model name.
    fn name(&self) -> &str;

    /// Accuracy on a time-ordered holdout.
    ///
    /// The last `ceil(fraction * n)` rows are held out, a fresh copy of this
    /// (unfitted) model is trained on the rest and scored on them. `self` is
    /// left untouched. Returns `None` when either side of the split would be
    /// empty.
    fn holdout_diagnostics(
        &self,
        rows: &[LagFeatureRow],
        fraction: f64,
    ) -> Result<Option<AccuracyMetrics>>
    where
        Self: Clone + Sized,
    {
        let n_test = (fraction * rows.len() as f64).ceil() as usize;
        if n_test == 0 || n_test >= rows.len() {
            return Ok(None);
        }

        let (train, test) = rows.split_at(rows.len() - n_test);
        let mut probe = self.clone();
        probe.fit(train)?;
        let predicted = probe.predict(test)?;
        let actual: Vec<f64> = test.iter().filter_map(|r| r.label).collect();

        Ok(calculate_metrics(&actual, &predicted))
    }
}
