//! Reduction of raw transactions into a yearly sales series.
//!
//! Dates arrive as free text in several layouts; day-first readings win
//! where a layout is ambiguous. Rows with unreadable dates are dropped and
//! counted. Amounts that cannot be read as numbers count as zero.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use tracing::{debug, info, warn};

use crate::core::{TransactionRecord, YearlySeries};
use crate::error::{DataError, Result};

/// Date layouts tried in order. Day-first layouts precede year-first ones.
///
/// `%Y` also accepts a two-digit year, so the `%y` layouts must come first
/// to read `04-03-22` as 2022 rather than year 22.
const DATE_FORMATS: &[&str] = &[
    "%d-%m-%y", "%d/%m/%y", "%d.%m.%y", "%d-%m-%Y", "%d/%m/%Y", "%d.%m.%Y", "%Y-%m-%d",
    "%Y/%m/%d", "%d-%b-%Y", "%d %b %Y", "%d %B %Y",
];

/// Time suffixes accepted after any of the date layouts.
const TIME_SUFFIXES: &[&str] = &[" %H:%M:%S", " %H:%M", "T%H:%M:%S"];

/// Counters collected while aggregating.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregationSummary {
    /// Records handed in.
    pub rows_seen: usize,
    /// Records dropped because the date could not be parsed.
    pub invalid_dates: usize,
    /// Records dropped because their year precedes the cutoff.
    pub before_cutoff: usize,
    /// Records whose amount was coerced to zero.
    pub coerced_amounts: usize,
    /// Years present in the output, including zero-filled gaps.
    pub years: usize,
}

/// Parse a transaction date in any of the tolerated layouts.
pub fn parse_transaction_date(raw: &str) -> Option<NaiveDate> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some(date);
        }
        for suffix in TIME_SUFFIXES {
            let layout = format!("{format}{suffix}");
            if let Ok(datetime) = NaiveDateTime::parse_from_str(text, &layout) {
                return Some(datetime.date());
            }
        }
    }

    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.date_naive())
}

/// Sum transaction amounts per calendar year from `cutoff_year` onwards.
pub fn aggregate_yearly(records: &[TransactionRecord], cutoff_year: i32) -> Result<YearlySeries> {
    aggregate_yearly_with_summary(records, cutoff_year).map(|(series, _)| series)
}

/// Like [`aggregate_yearly`], also returning the row counters.
///
/// Years between the first and last observed year that have no
/// transactions are filled with a zero total. Negative amounts (refunds) are
/// summed as given; a year whose amounts sum to a negative value fails with
/// `DataError::InvalidTotal`.
pub fn aggregate_yearly_with_summary(
    records: &[TransactionRecord],
    cutoff_year: i32,
) -> Result<(YearlySeries, AggregationSummary)> {
    let mut summary = AggregationSummary {
        rows_seen: records.len(),
        ..Default::default()
    };
    let mut totals: BTreeMap<i32, f64> = BTreeMap::new();

    for (row, record) in records.iter().enumerate() {
        let Some(date) = parse_transaction_date(&record.transaction_date) else {
            summary.invalid_dates += 1;
            debug!(row, date = %record.transaction_date, "dropping row with unparsable date");
            continue;
        };

        if date.year() < cutoff_year {
            summary.before_cutoff += 1;
            continue;
        }

        let amount = match record.amount.as_f64() {
            Some(v) => v,
            None => {
                summary.coerced_amounts += 1;
                debug!(row, amount = ?record.amount, "coercing non-numeric amount to zero");
                0.0
            }
        };

        *totals.entry(date.year()).or_insert(0.0) += amount;
    }

    if summary.coerced_amounts > 0 {
        warn!(
            count = summary.coerced_amounts,
            "non-numeric sales amounts coerced to zero"
        );
    }

    let (Some(&first), Some(&last)) = (totals.keys().next(), totals.keys().next_back()) else {
        warn!(
            rows = summary.rows_seen,
            invalid_dates = summary.invalid_dates,
            before_cutoff = summary.before_cutoff,
            cutoff_year,
            "no transactions left after filtering"
        );
        return Err(DataError::EmptySeries.into());
    };

    let points: Vec<(i32, f64)> = (first..=last)
        .map(|year| {
            let total = totals.get(&year).copied().unwrap_or(0.0);
            if total < 0.0 {
                warn!(year, total, "refunds exceed sales for the year");
            }
            (year, total)
        })
        .collect();

    summary.years = points.len();
    let series = YearlySeries::new(points)?;

    info!(
        rows = summary.rows_seen,
        invalid_dates = summary.invalid_dates,
        before_cutoff = summary.before_cutoff,
        coerced_amounts = summary.coerced_amounts,
        first_year = first,
        last_year = last,
        "aggregated transactions into yearly series"
    );

    Ok((series, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RawAmount;
    use crate::error::ForecastError;
    use approx::assert_relative_eq;

    fn record(date: &str, amount: f64) -> TransactionRecord {
        TransactionRecord::new(date, amount)
    }

    #[test]
    fn parses_day_first_and_iso_layouts() {
        let expected = NaiveDate::from_ymd_opt(2022, 3, 4).unwrap();
        for text in [
            "04-03-2022",
            "04/03/2022",
            "04.03.2022",
            "2022-03-04",
            "2022/03/04",
            "04-Mar-2022",
            "4 March 2022",
            " 04-03-2022 ",
            "04-03-2022 13:45",
            "04/03/2022 13:45:10",
            "2022-03-04T13:45:10",
            "2022-03-04T13:45:10+05:30",
        ] {
            assert_eq!(parse_transaction_date(text), Some(expected), "layout {text}");
        }
    }

    #[test]
    fn rejects_garbage_dates() {
        assert_eq!(parse_transaction_date(""), None);
        assert_eq!(parse_transaction_date("yesterday"), None);
        assert_eq!(parse_transaction_date("31-02-2022"), None);
    }

    #[test]
    fn sums_per_year_in_order() {
        let records = vec![
            record("15-06-2023", 50.0),
            record("01-01-2022", 10.0),
            record("31-12-2022", 15.0),
            record("2023-02-01", 25.0),
        ];
        let series = aggregate_yearly(&records, 2021).unwrap();
        assert_eq!(series.years(), vec![2022, 2023]);
        assert_eq!(series.totals(), vec![25.0, 75.0]);
    }

    #[test]
    fn conserves_amounts_after_cutoff() {
        let records = vec![
            record("01-01-2019", 1000.0),
            record("01-01-2020", 500.0),
            record("05-05-2021", 12.5),
            record("05-05-2022", 7.25),
            record("06-05-2022", 0.25),
        ];
        let series = aggregate_yearly(&records, 2021).unwrap();
        let total: f64 = series.totals().iter().sum();
        assert_relative_eq!(total, 12.5 + 7.25 + 0.25, epsilon = 1e-12);
    }

    #[test]
    fn drops_bad_dates_and_coerces_amounts() {
        let records = vec![
            record("not a date", 99.0),
            TransactionRecord::new("01-01-2021", RawAmount::from("abc")),
            TransactionRecord::new("02-01-2021", RawAmount::Missing),
            record("03-01-2021", 4.0),
            record("03-01-2020", 4.0),
        ];
        let (series, summary) = aggregate_yearly_with_summary(&records, 2021).unwrap();
        assert_eq!(series.totals(), vec![4.0]);
        assert_eq!(
            summary,
            AggregationSummary {
                rows_seen: 5,
                invalid_dates: 1,
                before_cutoff: 1,
                coerced_amounts: 2,
                years: 1,
            }
        );
    }

    #[test]
    fn fills_missing_years_with_zero() {
        let records = vec![record("01-01-2021", 3.0), record("01-01-2024", 4.0)];
        let series = aggregate_yearly(&records, 2021).unwrap();
        assert_eq!(series.years(), vec![2021, 2022, 2023, 2024]);
        assert_eq!(series.totals(), vec![3.0, 0.0, 0.0, 4.0]);
    }

    #[test]
    fn negative_year_total_is_invalid() {
        let records = vec![
            record("01-01-2021", -30.0),
            record("02-01-2021", 10.0),
            record("01-01-2022", 50.0),
        ];
        assert_eq!(
            aggregate_yearly(&records, 2021).unwrap_err(),
            ForecastError::Data(DataError::InvalidTotal {
                year: 2021,
                value: -20.0
            })
        );
    }

    #[test]
    fn refunds_are_netted_within_the_year() {
        let records = vec![
            record("01-01-2021", 100.0),
            record("15-01-2021", -30.0),
            record("01-01-2022", 50.0),
            record("02-02-2022", -50.0),
        ];
        let series = aggregate_yearly(&records, 2021).unwrap();
        assert_eq!(series.totals(), vec![70.0, 0.0]);
        let total: f64 = series.totals().iter().sum();
        assert_relative_eq!(total, 100.0 - 30.0 + 50.0 - 50.0, epsilon = 1e-12);
    }

    #[test]
    fn two_digit_years_expand_to_four() {
        let expected = NaiveDate::from_ymd_opt(2022, 3, 4);
        assert_eq!(parse_transaction_date("04-03-22"), expected);
        assert_eq!(parse_transaction_date("04/03/22"), expected);
        assert_eq!(parse_transaction_date("04.03.22 10:30"), expected);

        let records = vec![record("04-03-22", 5.0)];
        let (series, summary) = aggregate_yearly_with_summary(&records, 2021).unwrap();
        assert_eq!(series.years(), vec![2022]);
        assert_eq!(summary.before_cutoff, 0);
        assert_eq!(summary.invalid_dates, 0);
    }

    #[test]
    fn empty_after_filtering_is_data_error() {
        let records = vec![record("01-01-2019", 10.0), record("garbage", 1.0)];
        assert_eq!(
            aggregate_yearly(&records, 2021).unwrap_err(),
            ForecastError::Data(DataError::EmptySeries)
        );
        assert_eq!(
            aggregate_yearly(&[], 2021).unwrap_err(),
            ForecastError::Data(DataError::EmptySeries)
        );
    }
}
