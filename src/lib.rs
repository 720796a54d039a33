//! # retail-forecast
//!
//! Yearly retail sales forecasting with a hybrid model.
//!
//! Transactions are aggregated into a contiguous yearly series, an ARIMA
//! model captures the trend, and a gradient-boosted tree ensemble predicts
//! the trend's residual from two-year lag features. The final forecast is the
//! trend forecast plus the predicted residual.

// Allow some clippy warnings for cleaner code in specific cases
#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::too_many_arguments)]

pub mod aggregate;
pub mod config;
pub mod core;
pub mod error;
pub mod features;
pub mod hybrid;
pub mod models;
pub mod service;
pub mod utils;

pub use error::{ForecastError, Result};

pub mod prelude {
    pub use crate::aggregate::{aggregate_yearly, aggregate_yearly_with_summary};
    pub use crate::config::ForecastConfig;
    pub use crate::core::{ForecastPoint, TransactionRecord, YearlySeries};
    pub use crate::error::{ForecastError, Result};
    pub use crate::hybrid::{combine, HybridForecaster};
    pub use crate::models::{
        GradientBoostedRegressor, ResidualRegressor, TrendForecaster, ARIMA,
    };
    pub use crate::service::{ErrorBody, ForecastService, PredictionRecord, SalesRecord};
    pub use crate::utils::{calculate_metrics, AccuracyMetrics};
}
