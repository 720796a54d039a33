//! Yearly sales series: the unit every model in the crate operates on.

use serde::{Deserialize, Serialize};

use crate::error::{DataError, ForecastError, Result};

/// Total sales for one calendar year, plus the trend model's view of it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearlyObservation {
    pub year: i32,
    pub total_sales: f64,
    /// In-sample trend value, set once the trend model has been fitted.
    pub fitted_value: Option<f64>,
    /// `total_sales - fitted_value`, set together with `fitted_value`.
    pub residual: Option<f64>,
}

impl YearlyObservation {
    pub fn new(year: i32, total_sales: f64) -> Self {
        Self {
            year,
            total_sales,
            fitted_value: None,
            residual: None,
        }
    }
}

/// An ascending run of contiguous years.
///
/// Construction validates ordering and totals; fitted values are attached
/// through [`YearlySeries::with_fitted_values`], which consumes the series so
/// a fitted series can never be re-fitted in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlySeries {
    observations: Vec<YearlyObservation>,
}

impl YearlySeries {
    /// Build a series from `(year, total_sales)` pairs.
    ///
    /// Fails if the input is empty, if years are not strictly increasing by
    /// one, or if a total is negative or not finite.
    pub fn new(points: impl IntoIterator<Item = (i32, f64)>) -> Result<Self> {
        let observations: Vec<YearlyObservation> = points
            .into_iter()
            .map(|(year, total)| YearlyObservation::new(year, total))
            .collect();

        if observations.is_empty() {
            return Err(DataError::EmptySeries.into());
        }

        for obs in &observations {
            if !obs.total_sales.is_finite() || obs.total_sales < 0.0 {
                return Err(DataError::InvalidTotal {
                    year: obs.year,
                    value: obs.total_sales,
                }
                .into());
            }
        }

        for pair in observations.windows(2) {
            if pair[1].year != pair[0].year + 1 {
                return Err(DataError::NonContiguousYears {
                    previous: pair[0].year,
                    next: pair[1].year,
                }
                .into());
            }
        }

        Ok(Self { observations })
    }

    /// Build a series of consecutive years starting at `first_year`.
    pub fn from_totals(first_year: i32, totals: &[f64]) -> Result<Self> {
        Self::new(
            totals
                .iter()
                .enumerate()
                .map(|(i, &total)| (first_year + i as i32, total)),
        )
    }

    /// Attach the trend model's in-sample values and derive residuals.
    pub fn with_fitted_values(mut self, fitted: &[f64]) -> Result<Self> {
        if fitted.len() != self.observations.len() {
            return Err(DataError::DimensionMismatch {
                expected: self.observations.len(),
                got: fitted.len(),
            }
            .into());
        }

        for (obs, &value) in self.observations.iter_mut().zip(fitted) {
            obs.fitted_value = Some(value);
            obs.residual = Some(obs.total_sales - value);
        }

        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn observations(&self) -> &[YearlyObservation] {
        &self.observations
    }

    pub fn years(&self) -> Vec<i32> {
        self.observations.iter().map(|o| o.year).collect()
    }

    pub fn totals(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.total_sales).collect()
    }

    pub fn first_year(&self) -> i32 {
        self.observations.first().map(|o| o.year).unwrap_or_default()
    }

    pub fn last_year(&self) -> i32 {
        self.observations.last().map(|o| o.year).unwrap_or_default()
    }

    /// Check whether fitted values and residuals have been attached.
    pub fn is_fitted(&self) -> bool {
        self.observations.iter().all(|o| o.residual.is_some())
    }

    /// Residual per year; fails if the trend fit has not been attached.
    pub fn residuals(&self) -> Result<Vec<f64>> {
        self.observations
            .iter()
            .map(|o| o.residual.ok_or(ForecastError::Data(DataError::MissingResiduals)))
            .collect()
    }

    /// The last `n` observed totals (fewer if the series is shorter).
    pub fn tail(&self, n: usize) -> Vec<f64> {
        let start = self.observations.len().saturating_sub(n);
        self.observations[start..]
            .iter()
            .map(|o| o.total_sales)
            .collect()
    }
}
