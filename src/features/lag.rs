//! Two-year lag features for the residual corrector.
//!
//! Training rows pair each year's residual with the two previous observed
//! totals. Future rows are chained: the first forecast year looks back at
//! the last two observed totals, later years look back at the trend model's
//! own baseline forecasts. Corrected (hybrid) values are never fed back in,
//! so the corrector's inputs do not depend on its own outputs.

use serde::{Deserialize, Serialize};

use crate::core::YearlySeries;
use crate::error::Result;

/// Model input for one year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LagFeatureRow {
    pub year: i32,
    /// Value one year back.
    pub lag1: f64,
    /// Value two years back.
    pub lag2: f64,
    /// Trend residual for the year; present on training rows only.
    pub label: Option<f64>,
}

impl LagFeatureRow {
    pub fn new(year: i32, lag1: f64, lag2: f64) -> Self {
        Self {
            year,
            lag1,
            lag2,
            label: None,
        }
    }

    pub fn labeled(year: i32, lag1: f64, lag2: f64, label: f64) -> Self {
        Self {
            year,
            lag1,
            lag2,
            label: Some(label),
        }
    }

    /// Feature vector in model column order.
    pub fn features(&self) -> [f64; 2] {
        [self.lag1, self.lag2]
    }
}

/// Labeled rows for every year with two predecessors: `N - 2` rows for `N` years.
///
/// Fails with `DataError::MissingResiduals` unless the trend fit has been
/// attached to `series`.
pub fn training_rows(series: &YearlySeries) -> Result<Vec<LagFeatureRow>> {
    let residuals = series.residuals()?;
    let obs = series.observations();

    Ok((2..obs.len())
        .map(|i| {
            LagFeatureRow::labeled(
                obs[i].year,
                obs[i - 1].total_sales,
                obs[i - 2].total_sales,
                residuals[i],
            )
        })
        .collect())
}

/// Unlabeled rows for the years covered by `trend_forecast`.
///
/// Row `i` (year `first_year + i`) takes
///
/// | row     | `lag1`             | `lag2`             |
/// |---------|--------------------|--------------------|
/// | `0`     | last observed      | second-to-last observed |
/// | `1`     | `trend_forecast[0]`| last observed      |
/// | `i >= 2`| `trend_forecast[i-1]` | `trend_forecast[i-2]` |
///
/// Only the last two values of `history_tail` are used. A row whose lag
/// would come from a missing history value is dropped, so the result can be
/// shorter than `trend_forecast`.
pub fn future_rows(
    history_tail: &[f64],
    trend_forecast: &[f64],
    first_year: i32,
) -> Vec<LagFeatureRow> {
    let last = history_tail.last().copied();
    let second_last = history_tail
        .len()
        .checked_sub(2)
        .map(|i| history_tail[i]);

    (0..trend_forecast.len())
        .filter_map(|i| {
            let (lag1, lag2) = match i {
                0 => (last, second_last),
                1 => (Some(trend_forecast[0]), last),
                _ => (Some(trend_forecast[i - 1]), Some(trend_forecast[i - 2])),
            };
            Some(LagFeatureRow::new(first_year + i as i32, lag1?, lag2?))
        })
        .collect()
}
