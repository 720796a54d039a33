//! Property-based tests for the forecasting pipeline.
//!
//! These tests verify invariants that should hold for all valid inputs,
//! using randomly generated transactions and yearly series.

use std::collections::BTreeMap;

use approx::assert_relative_eq;
use proptest::prelude::*;
use retail_forecast::aggregate::aggregate_yearly;
use retail_forecast::core::{TransactionRecord, YearlySeries};
use retail_forecast::error::{DataError, ForecastError};
use retail_forecast::features::training_rows;
use retail_forecast::hybrid::{combine, HybridForecaster};
use retail_forecast::models::{GradientBoostedRegressor, TrendForecaster, ARIMA};

/// Strategy for transactions between 2021 and 2030 with non-negative amounts.
fn transactions_strategy(max_len: usize) -> impl Strategy<Value = Vec<(i32, u32, u32, f64)>> {
    prop::collection::vec((2021..2031i32, 1..13u32, 1..29u32, 0.0..1000.0_f64), 1..max_len)
}

/// Strategy for yearly totals with a trend and bounded noise.
/// Keeps values positive so the series is always valid.
fn yearly_totals_strategy(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    (min_len..max_len).prop_flat_map(|len| {
        (
            500.0..5000.0_f64,
            1.0..200.0_f64,
            prop::collection::vec(-50.0..50.0_f64, len),
        )
            .prop_map(|(base, slope, noise)| {
                noise
                    .iter()
                    .enumerate()
                    .map(|(i, e)| base + slope * i as f64 + e)
                    .collect()
            })
    })
}

fn fit_hybrid(totals: &[f64]) -> HybridForecaster {
    let series = YearlySeries::from_totals(2000, totals).unwrap();
    HybridForecaster::fit(
        series,
        ARIMA::new(1, 1, 0),
        GradientBoostedRegressor::default(),
        0.0,
    )
    .unwrap()
}

// =============================================================================
// Property: aggregation conserves the total amount
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn aggregation_conserves_amounts(rows in transactions_strategy(200)) {
        let records: Vec<TransactionRecord> = rows
            .iter()
            .map(|&(y, m, d, amount)| {
                TransactionRecord::new(format!("{y:04}-{m:02}-{d:02}"), amount)
            })
            .collect();
        let expected: f64 = rows.iter().map(|r| r.3).sum();

        let series = aggregate_yearly(&records, 2021).unwrap();
        let total: f64 = series.totals().iter().sum();
        prop_assert!((total - expected).abs() <= 1e-6 * expected.max(1.0));

        let years = series.years();
        prop_assert!(years.windows(2).all(|w| w[1] == w[0] + 1));
        let min_year = rows.iter().map(|r| r.0).min().unwrap();
        let max_year = rows.iter().map(|r| r.0).max().unwrap();
        prop_assert_eq!(series.first_year(), min_year);
        prop_assert_eq!(series.last_year(), max_year);
    }

    #[test]
    fn aggregation_conserves_amounts_with_refunds(
        rows in prop::collection::vec(
            (2021..2026i32, 1..13u32, 1..29u32, -400.0..1000.0_f64),
            1..100
        )
    ) {
        let records: Vec<TransactionRecord> = rows
            .iter()
            .map(|&(y, m, d, amount)| {
                TransactionRecord::new(format!("{d:02}/{m:02}/{y:04}"), amount)
            })
            .collect();
        let mut per_year: BTreeMap<i32, f64> = BTreeMap::new();
        for r in &rows {
            *per_year.entry(r.0).or_insert(0.0) += r.3;
        }
        let expected: f64 = per_year.values().sum();

        match aggregate_yearly(&records, 2021) {
            Ok(series) => {
                prop_assert!(per_year.values().all(|v| *v >= 0.0));
                let total: f64 = series.totals().iter().sum();
                let scale: f64 = rows.iter().map(|r| r.3.abs()).sum::<f64>().max(1.0);
                prop_assert!((total - expected).abs() <= 1e-9 * scale);
            }
            Err(ForecastError::Data(DataError::InvalidTotal { year, value })) => {
                prop_assert!(value < 0.0);
                prop_assert_eq!(per_year.get(&year).copied(), Some(value));
            }
            Err(e) => prop_assert!(false, "unexpected error: {}", e),
        }
    }

    #[test]
    fn cutoff_excludes_earlier_years(rows in transactions_strategy(100), cutoff in 2021..2031i32) {
        let records: Vec<TransactionRecord> = rows
            .iter()
            .map(|&(y, m, d, amount)| {
                TransactionRecord::new(format!("{d:02}-{m:02}-{y:04}"), amount)
            })
            .collect();

        match aggregate_yearly(&records, cutoff) {
            Ok(series) => prop_assert!(series.first_year() >= cutoff),
            Err(e) => {
                prop_assert!(rows.iter().all(|r| r.0 < cutoff));
                prop_assert_eq!(e.kind(), "DataError");
            }
        }
    }
}

// =============================================================================
// Property: residuals complete the observed series
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(30))]

    #[test]
    fn fitted_plus_residual_is_observed(totals in yearly_totals_strategy(6, 20)) {
        let mut trend = ARIMA::new(1, 1, 0);
        let series = YearlySeries::from_totals(2000, &totals).unwrap();
        trend.fit(&series).unwrap();
        let fitted = series.with_fitted_values(trend.fitted_values().unwrap()).unwrap();

        for obs in fitted.observations() {
            let sum = obs.fitted_value.unwrap() + obs.residual.unwrap();
            prop_assert!((sum - obs.total_sales).abs() <= 1e-9 * obs.total_sales.max(1.0));
        }

        let rows = training_rows(&fitted).unwrap();
        prop_assert_eq!(rows.len(), totals.len() - 2);
    }
}

// =============================================================================
// Property: forecast length and determinism
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    #[test]
    fn forecast_length_matches_horizon(
        totals in yearly_totals_strategy(6, 20),
        horizon in 1usize..10
    ) {
        let hybrid = fit_hybrid(&totals);
        let points = hybrid.forecast(horizon).unwrap();

        prop_assert_eq!(points.len(), horizon);
        let first = 2000 + totals.len() as i32;
        for (i, p) in points.iter().enumerate() {
            prop_assert_eq!(p.year, first + i as i32);
            prop_assert!(p.predicted_sales.is_finite());
        }
    }

    #[test]
    fn repeated_forecasts_are_identical(totals in yearly_totals_strategy(6, 15)) {
        let hybrid = fit_hybrid(&totals);
        prop_assert_eq!(hybrid.forecast(4).unwrap(), hybrid.forecast(4).unwrap());
    }
}

// =============================================================================
// Property: combine
// =============================================================================

proptest! {
    #[test]
    fn combine_is_pointwise_sum_over_shorter_length(
        trend in prop::collection::vec(-1e6..1e6_f64, 0..20),
        correction in prop::collection::vec(-1e6..1e6_f64, 0..20)
    ) {
        let combined = combine(&trend, &correction);
        prop_assert_eq!(combined.len(), trend.len().min(correction.len()));
        for (i, value) in combined.iter().enumerate() {
            prop_assert_eq!(*value, trend[i] + correction[i]);
        }
    }
}

#[test]
fn combine_of_equal_lengths_keeps_all_points() {
    let combined = combine(&[100.0, 200.0], &[-1.5, 2.5]);
    assert_eq!(combined.len(), 2);
    assert_relative_eq!(combined[0], 98.5);
    assert_relative_eq!(combined[1], 202.5);
}
