//! Component models of the hybrid forecaster.

mod traits;

pub mod arima;
pub mod boosting;

pub use arima::{ARIMASpec, ARIMA};
pub use boosting::{GradientBoostedRegressor, Objective};
pub use traits::{ResidualRegressor, TrendForecaster};
