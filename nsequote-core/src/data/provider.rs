//! Data provider trait, request shapes and structured error types.
//!
//! The DataProvider trait abstracts over quote sources (Yahoo Finance, test
//! fixtures) so the quote service can be exercised without the network.

use chrono::NaiveDate;
use thiserror::Error;
use tracing::debug;

use super::period::Period;
use crate::domain::PriceRow;
use crate::symbol::Ticker;

/// Calendar days looked back for a latest-session request. Wide enough to
/// reach the last session across weekends and exchange holidays.
pub const LATEST_LOOKBACK_DAYS: u64 = 7;

/// Structured error types for data operations.
///
/// Displayable in CLI output; the core never interprets them beyond
/// propagation.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("HTTP {status} for {symbol}")]
    Http { status: u16, symbol: String },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("data error: {0}")]
    Other(String),
}

/// What to fetch for a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchRequest {
    /// The most recent trading session only.
    Latest,
    /// A trailing window ending today.
    Recent(Period),
    /// An explicit, inclusive date range.
    Range { start: NaiveDate, end: NaiveDate },
}

impl FetchRequest {
    /// Validated explicit range.
    pub fn range(start: NaiveDate, end: NaiveDate) -> Result<Self, DataError> {
        if start > end {
            return Err(DataError::InvalidRequest(format!(
                "start date {start} is after end date {end}"
            )));
        }
        Ok(FetchRequest::Range { start, end })
    }

    /// Inclusive date window this request covers, given today's date.
    pub fn window(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        match *self {
            FetchRequest::Latest => (
                today - chrono::Days::new(LATEST_LOOKBACK_DAYS),
                today,
            ),
            FetchRequest::Recent(period) => (period.start_from(today), today),
            FetchRequest::Range { start, end } => (start, end),
        }
    }

    /// Short label used in file names: `latest`, `1m`, `2024-01-01_to_2024-03-31`.
    pub fn label(&self) -> String {
        match self {
            FetchRequest::Latest => "latest".into(),
            FetchRequest::Recent(period) => period.to_string(),
            FetchRequest::Range { start, end } => format!("{start}_to_{end}"),
        }
    }
}

/// Rows fetched for one symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResult {
    pub symbol: Ticker,
    pub rows: Vec<PriceRow>,
}

/// Trait for quote providers.
///
/// Implementations handle transport, timeouts and retries. Returned rows
/// must already be tidied with [`prepare_rows`].
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch daily rows for a symbol.
    fn fetch(&self, symbol: &Ticker, request: &FetchRequest) -> Result<FetchResult, DataError>;
}

/// Tidy raw provider rows for the pipeline.
///
/// Drops rows that fail [`PriceRow::is_sane`] (non-finite or negative
/// prices, high/low not bracketing open and close), sorts by date ascending,
/// keeps the last row per date, and for `Latest` keeps only the final session.
pub fn prepare_rows(mut rows: Vec<PriceRow>, request: &FetchRequest) -> Vec<PriceRow> {
    let before = rows.len();
    rows.retain(PriceRow::is_sane);
    if rows.len() < before {
        debug!(dropped = before - rows.len(), "dropped malformed rows");
    }
    // stable sort: for duplicate dates the later provider row wins below
    rows.sort_by_key(|r| r.date);
    let mut out: Vec<PriceRow> = Vec::with_capacity(rows.len());
    for row in rows {
        match out.last_mut() {
            Some(prev) if prev.date == row.date => *prev = row,
            _ => out.push(row),
        }
    }
    if matches!(request, FetchRequest::Latest) && out.len() > 1 {
        out.drain(..out.len() - 1);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn row(day: u32, close: f64) -> PriceRow {
        PriceRow {
            date: d(day),
            open: 10.0,
            high: 12.0,
            low: 9.0,
            close,
            volume: 100,
        }
    }

    #[test]
    fn range_rejects_inverted_dates() {
        assert!(FetchRequest::range(d(5), d(1)).is_err());
        assert!(FetchRequest::range(d(1), d(1)).is_ok());
    }

    #[test]
    fn windows() {
        let today = d(20);
        assert_eq!(FetchRequest::Latest.window(today), (d(13), d(20)));
        let month: Period = "1m".parse().unwrap();
        assert_eq!(
            FetchRequest::Recent(month).window(today),
            (NaiveDate::from_ymd_opt(2024, 2, 20).unwrap(), d(20))
        );
    }

    #[test]
    fn labels() {
        assert_eq!(FetchRequest::Latest.label(), "latest");
        assert_eq!(
            FetchRequest::Recent("3M".parse().unwrap()).label(),
            "3m"
        );
        assert_eq!(
            FetchRequest::range(d(1), d(31)).unwrap().label(),
            "2024-03-01_to_2024-03-31"
        );
    }

    #[test]
    fn prepare_sorts_dedupes_and_drops_nan() {
        let rows = vec![row(3, 11.0), row(1, 10.0), row(3, 11.5), row(2, f64::NAN)];
        let out = prepare_rows(rows, &FetchRequest::Range { start: d(1), end: d(3) });
        let closes: Vec<f64> = out.iter().map(|r| r.close).collect();
        assert_eq!(closes, [10.0, 11.5]);
    }

    #[test]
    fn prepare_drops_negative_and_inverted_rows() {
        let mut negative = row(1, 10.0);
        negative.low = -1.0;
        let mut inverted = row(2, 10.0);
        inverted.high = 8.0;
        let rows = vec![negative, inverted, row(3, 11.0)];
        let out = prepare_rows(rows, &FetchRequest::Range { start: d(1), end: d(3) });
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].date, d(3));
    }

    #[test]
    fn prepare_latest_keeps_last_session() {
        let rows = vec![row(1, 10.0), row(4, 10.4), row(2, 10.2)];
        let out = prepare_rows(rows, &FetchRequest::Latest);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].date, d(4));
    }
}
