//! ARIMA (Autoregressive Integrated Moving Average) trend model.

mod diff;
mod model;

pub use diff::{difference, integrate};
pub use model::{ARIMASpec, ARIMA};
