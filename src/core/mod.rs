//! Core data structures: transactions in, yearly series, forecast points out.

mod forecast;
mod transaction;
mod yearly_series;

pub use forecast::ForecastPoint;
pub use transaction::{RawAmount, TransactionRecord, AMOUNT_COLUMN, DATE_COLUMN};
pub use yearly_series::{YearlyObservation, YearlySeries};
