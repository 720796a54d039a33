//! Raw transaction rows as handed over by the dataset loader.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{DataError, Result};

/// Column holding the transaction date.
pub const DATE_COLUMN: &str = "transaction_date";
/// Column holding the sales amount of the transaction.
pub const AMOUNT_COLUMN: &str = "total_sales_per_transaction";

/// Sales amount as it appears in the source table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAmount {
    Number(f64),
    Text(String),
    Missing,
}

impl RawAmount {
    /// Numeric value, or `None` when the field cannot be read as a finite number.
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            RawAmount::Number(v) => *v,
            RawAmount::Text(s) => strip_thousands_separators(s.trim())?.parse::<f64>().ok()?,
            RawAmount::Missing => return None,
        };
        value.is_finite().then_some(value)
    }
}

/// Remove `,` thousands separators, e.g. `1,250.75` to `1250.75`.
///
/// Every comma must be followed by exactly three digits, so a decimal comma
/// such as `1,5` is rejected instead of being read as `15`.
fn strip_thousands_separators(text: &str) -> Option<String> {
    if !text.contains(',') {
        return Some(text.to_string());
    }

    let (integer, fraction) = match text.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (text, None),
    };
    if fraction.is_some_and(|f| f.contains(',')) {
        return None;
    }

    let digits = integer.strip_prefix(['-', '+']).unwrap_or(integer);
    let mut groups = digits.split(',');
    let head = groups.next()?;
    if head.is_empty() || head.len() > 3 {
        return None;
    }
    if !groups.all(|g| g.len() == 3 && g.bytes().all(|b| b.is_ascii_digit())) {
        return None;
    }

    Some(text.replace(',', ""))
}

impl From<f64> for RawAmount {
    fn from(value: f64) -> Self {
        RawAmount::Number(value)
    }
}

impl From<&str> for RawAmount {
    fn from(value: &str) -> Self {
        RawAmount::Text(value.to_string())
    }
}

/// One transaction: a date as text and an amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub transaction_date: String,
    pub amount: RawAmount,
}

impl TransactionRecord {
    pub fn new(transaction_date: impl Into<String>, amount: impl Into<RawAmount>) -> Self {
        Self {
            transaction_date: transaction_date.into(),
            amount: amount.into(),
        }
    }

    /// Build a record from a loaded table row keyed by column name.
    ///
    /// The date column is required; a missing amount column reads as
    /// [`RawAmount::Missing`] and is later coerced to zero.
    pub fn from_row(row: &HashMap<String, String>) -> Result<Self> {
        let date = row
            .get(DATE_COLUMN)
            .ok_or_else(|| DataError::MissingField(DATE_COLUMN.to_string()))?;
        let amount = row
            .get(AMOUNT_COLUMN)
            .map(|s| RawAmount::Text(s.clone()))
            .unwrap_or(RawAmount::Missing);

        Ok(Self {
            transaction_date: date.clone(),
            amount,
        })
    }
}
