//! Read-only forecast boundary.
//!
//! [`ForecastService`] holds one fitted [`HybridForecaster`] behind an `Arc`
//! and turns it into plain serializable records. Every failure is reported as
//! an [`ErrorBody`]; nothing at this boundary panics.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::aggregate::aggregate_yearly;
use crate::config::ForecastConfig;
use crate::core::TransactionRecord;
use crate::error::{ForecastError, Result};
use crate::hybrid::HybridForecaster;
use crate::models::{GradientBoostedRegressor, ResidualRegressor, TrendForecaster, ARIMA};

/// One observed year as served to clients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub year: i32,
    pub total_amt: f64,
}

/// One forecast year as served to clients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub year: i32,
    pub predicted_sales: f64,
}

/// Error payload: `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }

    /// Status a transport layer should attach; all failures are internal.
    pub fn status_code(&self) -> u16 {
        500
    }
}

impl From<ForecastError> for ErrorBody {
    fn from(err: ForecastError) -> Self {
        Self::new(err.to_string())
    }
}

/// Shared, immutable access to a fitted hybrid model.
#[derive(Debug)]
pub struct ForecastService<T = ARIMA, R = GradientBoostedRegressor> {
    forecaster: Arc<HybridForecaster<T, R>>,
    horizon: usize,
}

impl<T, R> Clone for ForecastService<T, R> {
    fn clone(&self) -> Self {
        Self {
            forecaster: Arc::clone(&self.forecaster),
            horizon: self.horizon,
        }
    }
}

impl ForecastService {
    /// Aggregate `records`, fit the default models and return a ready service.
    ///
    /// Any error means the service must not start.
    pub fn bootstrap(records: &[TransactionRecord], config: &ForecastConfig) -> Result<Self> {
        config.validate()?;

        let series = aggregate_yearly(records, config.cutoff_year)?;
        let forecaster = HybridForecaster::fit(
            series,
            ARIMA::from_spec(config.order.into()),
            GradientBoostedRegressor::new(config.corrector.clone()),
            config.holdout_fraction,
        )?;

        Ok(Self::from_forecaster(forecaster, config.horizon))
    }
}

impl<T, R> ForecastService<T, R>
where
    T: TrendForecaster,
    R: ResidualRegressor,
{
    /// Wrap an already fitted forecaster.
    pub fn from_forecaster(forecaster: HybridForecaster<T, R>, horizon: usize) -> Self {
        Self {
            forecaster: Arc::new(forecaster),
            horizon,
        }
    }

    pub fn forecaster(&self) -> &HybridForecaster<T, R> {
        &self.forecaster
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// Observed yearly totals in ascending year order.
    pub fn get_historical_series(&self) -> Vec<SalesRecord> {
        self.forecaster
            .series()
            .observations()
            .iter()
            .map(|obs| SalesRecord {
                year: obs.year,
                total_amt: obs.total_sales,
            })
            .collect()
    }

    /// Hybrid forecast for the `horizon_years` following the last observed year.
    pub fn get_forecast(
        &self,
        horizon_years: usize,
    ) -> std::result::Result<Vec<PredictionRecord>, ErrorBody> {
        match self.forecaster.forecast(horizon_years) {
            Ok(points) => Ok(points
                .iter()
                .map(|p| PredictionRecord {
                    year: p.year,
                    predicted_sales: p.predicted_sales,
                })
                .collect()),
            Err(e) => {
                error!(error = %e, kind = e.kind(), horizon = horizon_years, "forecast failed");
                Err(e.into())
            }
        }
    }

    /// [`get_forecast`](Self::get_forecast) over the configured horizon.
    pub fn default_forecast(&self) -> std::result::Result<Vec<PredictionRecord>, ErrorBody> {
        self.get_forecast(self.horizon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OrderConfig;
    use crate::core::YearlySeries;

    fn records(totals: &[(i32, f64)]) -> Vec<TransactionRecord> {
        totals
            .iter()
            .flat_map(|&(year, total)| {
                // Two transactions per year on a day-first date.
                vec![
                    TransactionRecord::new(format!("15-03-{year}"), total * 0.25),
                    TransactionRecord::new(format!("02/11/{year}"), format!("{}", total * 0.75).as_str()),
                ]
            })
            .collect()
    }

    fn history() -> Vec<(i32, f64)> {
        (2013..2025)
            .map(|y| {
                let t = (y - 2013) as f64;
                (y, 5000.0 + 300.0 * t + 120.0 * (t * 0.9).sin())
            })
            .collect()
    }

    fn config() -> ForecastConfig {
        ForecastConfig {
            cutoff_year: 2013,
            ..Default::default()
        }
    }

    #[test]
    fn bootstrap_serves_history_and_forecast() {
        let service = ForecastService::bootstrap(&records(&history()), &config()).unwrap();

        let historical = service.get_historical_series();
        assert_eq!(historical.len(), 12);
        assert_eq!(historical[0].year, 2013);
        assert!((historical[0].total_amt - 5000.0).abs() < 1e-6);

        let forecast = service.default_forecast().unwrap();
        assert_eq!(forecast.len(), 4);
        assert_eq!(
            forecast.iter().map(|p| p.year).collect::<Vec<_>>(),
            vec![2025, 2026, 2027, 2028]
        );
        assert!(forecast.iter().all(|p| p.predicted_sales.is_finite()));
    }

    #[test]
    fn cloned_services_share_the_model() {
        let service = ForecastService::bootstrap(&records(&history()), &config()).unwrap();
        let other = service.clone();
        assert!(std::ptr::eq(service.forecaster(), other.forecaster()));
        assert_eq!(service.get_forecast(2), other.get_forecast(2));
    }

    #[test]
    fn bootstrap_rejects_empty_input() {
        let err = ForecastService::bootstrap(&[], &config()).unwrap_err();
        assert_eq!(err.kind(), "DataError");
    }

    #[test]
    fn bootstrap_rejects_too_short_history() {
        let short = [(2021, 100.0), (2022, 110.0), (2023, 105.0), (2024, 130.0)];
        let err = ForecastService::bootstrap(&records(&short), &ForecastConfig::default())
            .unwrap_err();
        assert_eq!(err.kind(), "ModelFitError");
    }

    #[test]
    fn bootstrap_rejects_invalid_config() {
        let config = ForecastConfig {
            horizon: 0,
            ..config()
        };
        assert!(ForecastService::bootstrap(&records(&history()), &config).is_err());
    }

    #[test]
    fn smaller_order_fits_short_history() {
        let short = [(2021, 100.0), (2022, 110.0), (2023, 105.0), (2024, 130.0)];
        let config = ForecastConfig {
            order: OrderConfig { p: 1, d: 1, q: 1 },
            ..ForecastConfig::default()
        };
        let service = ForecastService::bootstrap(&records(&short), &config).unwrap();
        assert_eq!(service.default_forecast().unwrap().len(), 4);
    }

    #[test]
    fn forecast_errors_become_error_bodies() {
        #[derive(Debug)]
        struct Broken;
        impl TrendForecaster for Broken {
            fn fit(&mut self, _: &YearlySeries) -> Result<()> {
                Ok(())
            }
            fn fitted_values(&self) -> Option<&[f64]> {
                Some(&[100.0, 110.0, 105.0, 130.0][..])
            }
            fn forecast(&self, _: usize) -> Result<Vec<f64>> {
                Err(crate::error::PredictError::NotFitted.into())
            }
            fn name(&self) -> &str {
                "Broken"
            }
        }

        let series = YearlySeries::from_totals(2021, &[100.0, 110.0, 105.0, 130.0]).unwrap();
        let forecaster =
            HybridForecaster::fit(series, Broken, GradientBoostedRegressor::default(), 0.0)
                .unwrap();
        let service = ForecastService::from_forecaster(forecaster, 4);

        let body = service.default_forecast().unwrap_err();
        assert_eq!(body.status_code(), 500);
        assert_eq!(body.error, "predict error: model must be fitted before prediction");
    }

    #[test]
    fn wire_shapes() {
        let sales = serde_json::to_value(SalesRecord {
            year: 2024,
            total_amt: 130.5,
        })
        .unwrap();
        assert_eq!(sales, serde_json::json!({ "year": 2024, "total_amt": 130.5 }));

        let prediction = serde_json::to_value(PredictionRecord {
            year: 2025,
            predicted_sales: 142.0,
        })
        .unwrap();
        assert_eq!(
            prediction,
            serde_json::json!({ "year": 2025, "predicted_sales": 142.0 })
        );

        let body = serde_json::to_value(ErrorBody::new("boom")).unwrap();
        assert_eq!(body, serde_json::json!({ "error": "boom" }));
    }
}
