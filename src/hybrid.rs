//! Hybrid forecast: trend model baseline plus predicted residual.
//!
//! [`HybridForecaster::fit`] is the one-time initialization step. It fits the
//! trend model, attaches residuals to the series, and trains the corrector on
//! lag features. The returned value is never mutated again; forecasts only
//! read it.

use tracing::{debug, info, warn};

use crate::core::{ForecastPoint, YearlySeries};
use crate::error::{ModelFitError, PredictError, Result};
use crate::features::{future_rows, training_rows};
use crate::models::{GradientBoostedRegressor, ResidualRegressor, TrendForecaster, ARIMA};
use crate::utils::AccuracyMetrics;

/// Pointwise `trend[i] + correction[i]` over the overlapping prefix.
///
/// When the inputs differ in length the result has the shorter length;
/// trailing values of the longer input are ignored.
pub fn combine(trend: &[f64], correction: &[f64]) -> Vec<f64> {
    if trend.len() != correction.len() {
        debug!(
            trend = trend.len(),
            correction = correction.len(),
            "truncating hybrid forecast to the shorter input"
        );
    }
    trend
        .iter()
        .zip(correction)
        .map(|(t, c)| t + c)
        .collect()
}

/// Fitted trend model and residual corrector over one yearly series.
#[derive(Debug, Clone)]
pub struct HybridForecaster<T = ARIMA, R = GradientBoostedRegressor> {
    series: YearlySeries,
    trend: T,
    corrector: R,
    diagnostics: Option<AccuracyMetrics>,
}

impl<T, R> HybridForecaster<T, R>
where
    T: TrendForecaster,
    R: ResidualRegressor + Clone,
{
    /// Fit both models on `series`.
    ///
    /// With `holdout_fraction > 0` a time-ordered holdout score of the
    /// corrector is computed first and logged; the corrector itself is always
    /// trained on every row.
    pub fn fit(
        series: YearlySeries,
        mut trend: T,
        mut corrector: R,
        holdout_fraction: f64,
    ) -> Result<Self> {
        trend.fit(&series)?;
        let fitted = trend.fitted_values().ok_or_else(|| {
            ModelFitError::NonConvergence(format!("{} produced no fitted values", trend.name()))
        })?;
        let series = series.with_fitted_values(fitted)?;

        let rows = training_rows(&series)?;

        let diagnostics = if holdout_fraction > 0.0 {
            match corrector.holdout_diagnostics(&rows, holdout_fraction) {
                Ok(metrics) => metrics,
                Err(e) => {
                    warn!(error = %e, "holdout diagnostics failed");
                    None
                }
            }
        } else {
            None
        };
        if let Some(m) = &diagnostics {
            info!(
                holdout = m.n,
                mae = m.mae,
                rmse = m.rmse,
                "residual corrector holdout accuracy"
            );
        }

        corrector.fit(&rows)?;

        info!(
            years = series.len(),
            first_year = series.first_year(),
            last_year = series.last_year(),
            trend = trend.name(),
            corrector = corrector.name(),
            training_rows = rows.len(),
            "hybrid forecaster ready"
        );

        Ok(Self {
            series,
            trend,
            corrector,
            diagnostics,
        })
    }
}

impl<T, R> HybridForecaster<T, R>
where
    T: TrendForecaster,
    R: ResidualRegressor,
{
    /// Forecast the `horizon` years following the last observed year.
    ///
    /// Future lag rows are chained from the observed tail and the trend
    /// forecast; see [`future_rows`]. Fails rather than returning a
    /// non-finite value.
    pub fn forecast(&self, horizon: usize) -> Result<Vec<ForecastPoint>> {
        let first_year = self.series.last_year() + 1;
        let trend = self.trend.forecast(horizon)?;
        let rows = future_rows(&self.series.tail(2), &trend, first_year);
        let corrections = self.corrector.predict(&rows)?;
        let predicted = combine(&trend, &corrections);

        predicted
            .iter()
            .enumerate()
            .map(|(i, &value)| -> Result<ForecastPoint> {
                let year = first_year + i as i32;
                if !value.is_finite() {
                    return Err(PredictError::NonFiniteForecast { year }.into());
                }
                Ok(ForecastPoint::new(year, trend[i], corrections[i]))
            })
            .collect()
    }

    /// Observed series with fitted values and residuals attached.
    pub fn series(&self) -> &YearlySeries {
        &self.series
    }

    pub fn trend(&self) -> &T {
        &self.trend
    }

    pub fn corrector(&self) -> &R {
        &self.corrector
    }

    /// Holdout accuracy of the corrector, if it was computed.
    pub fn diagnostics(&self) -> Option<&AccuracyMetrics> {
        self.diagnostics.as_ref()
    }
}
