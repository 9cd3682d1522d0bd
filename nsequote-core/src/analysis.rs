//! Change/average calculator.
//!
//! - `add_percent_change`: per-session `(Close - Open) / Open * 100`
//! - `average_ohlc`: column means over a row set
//!
//! Results are rounded half-to-even at two decimals. Zero opens, empty sets
//! and non-finite prices are errors, never `NaN`.

use crate::domain::table::{ColumnData, PriceTable, CHANGE_PERCENT, CLOSE, DATE, HIGH, LOW, OPEN};
use crate::domain::AverageSummary;
use crate::error::QuoteError;

/// Round to `places` decimals, ties to even.
pub fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round_ties_even() / scale
}

/// Round to 2 decimals, ties to even.
pub fn round2(value: f64) -> f64 {
    round_to(value, 2)
}

/// Percentage change from open to close for a single session, rounded to 2 decimals.
pub fn percent_change(open: f64, close: f64) -> Result<f64, QuoteError> {
    raw_change(open, close).map_err(|kind| kind.into_error("single session".into()))
}

/// Copy of `table` with a `Change %` column (replaced if present).
///
/// Fails with `DivisionByZero` if any open is exactly 0 and with
/// `TypeMismatch` if `Open` or `Close` is no longer numeric.
pub fn add_percent_change(table: &PriceTable) -> Result<PriceTable, QuoteError> {
    let open = table.floats(OPEN)?;
    let close = table.floats(CLOSE)?;
    let dates = table.dates(DATE).ok();

    let change = open
        .iter()
        .zip(close)
        .enumerate()
        .map(|(i, (&o, &c))| {
            raw_change(o, c).map_err(|kind| {
                let at = match dates.and_then(|d| d.get(i)) {
                    Some(date) => format!("row {i}, {date}"),
                    None => format!("row {i}"),
                };
                kind.into_error(at)
            })
        })
        .collect::<Result<Vec<f64>, QuoteError>>()?;

    table.with_column(CHANGE_PERCENT, ColumnData::Float(change))
}

/// Mean of Open, High, Low and Close, each rounded to 2 decimals.
pub fn average_ohlc(table: &PriceTable) -> Result<AverageSummary, QuoteError> {
    if table.is_empty() {
        return Err(QuoteError::EmptyInput("OHLC averages"));
    }
    Ok(AverageSummary {
        avg_open: column_mean(table, OPEN)?,
        avg_high: column_mean(table, HIGH)?,
        avg_low: column_mean(table, LOW)?,
        avg_close: column_mean(table, CLOSE)?,
    })
}

fn column_mean(table: &PriceTable, name: &str) -> Result<f64, QuoteError> {
    let values = table.floats(name)?;
    if values.is_empty() {
        return Err(QuoteError::EmptyInput("OHLC averages"));
    }
    if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
        return Err(QuoteError::InvalidInput(format!(
            "column '{name}' contains non-finite value {bad}"
        )));
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    Ok(round2(mean))
}

enum ChangeFailure {
    ZeroOpen,
    NonFinite(f64, f64),
}

impl ChangeFailure {
    fn into_error(self, at: String) -> QuoteError {
        match self {
            ChangeFailure::ZeroOpen => QuoteError::DivisionByZero(at),
            ChangeFailure::NonFinite(open, close) => QuoteError::InvalidInput(format!(
                "non-finite price at {at}: open={open}, close={close}"
            )),
        }
    }
}

fn raw_change(open: f64, close: f64) -> Result<f64, ChangeFailure> {
    if !open.is_finite() || !close.is_finite() {
        return Err(ChangeFailure::NonFinite(open, close));
    }
    if open == 0.0 {
        return Err(ChangeFailure::ZeroOpen);
    }
    Ok(round2((close - open) / open * 100.0))
}
