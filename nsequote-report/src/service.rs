//! Quote service: wires the fetch adapter, calculator and formatter.
//!
//! Four entry points, one per request shape:
//! - `latest()`: the most recent session for one symbol
//! - `history()`: a trailing period for one symbol
//! - `range()`: an explicit date range for one symbol
//! - `latest_many()`: the most recent session for several symbols

use chrono::NaiveDate;
use tracing::{debug, info};

use nsequote_core::analysis::{add_percent_change, average_ohlc, percent_change};
use nsequote_core::data::{
    fetch_many, DataError, DataProvider, FetchProgress, FetchRequest, Period,
};
use nsequote_core::domain::table::SYMBOL;
use nsequote_core::domain::{AverageSummary, ColumnData, PriceRow, PriceTable};
use nsequote_core::format::{format_for_display, DisplayStyle};
use nsequote_core::symbol::Ticker;
use nsequote_core::QuoteError;

/// The latest session for one symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct LatestQuote {
    pub symbol: Ticker,
    pub row: PriceRow,
    pub change_percent: f64,
}

/// A multi-session view of one symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteReport {
    pub symbol: Ticker,
    pub request: FetchRequest,
    /// Numeric table with `Change %`.
    pub derived: PriceTable,
    /// Same rows as display strings.
    pub display: PriceTable,
    pub averages: AverageSummary,
}

/// Latest sessions for several symbols, one row each, led by a `Symbol` column.
#[derive(Debug)]
pub struct MultiQuote {
    pub derived: PriceTable,
    pub display: PriceTable,
    /// Symbols the provider could not serve, in input order.
    pub failed: Vec<(Ticker, DataError)>,
}

/// Runs requests against a provider and shapes the results for display.
pub struct QuoteService<'a> {
    provider: &'a dyn DataProvider,
    style: DisplayStyle,
}

impl<'a> QuoteService<'a> {
    pub fn new(provider: &'a dyn DataProvider, style: DisplayStyle) -> Self {
        Self { provider, style }
    }

    pub fn style(&self) -> &DisplayStyle {
        &self.style
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn latest(&self, symbol: &Ticker) -> Result<LatestQuote, QuoteError> {
        let fetched = self.provider.fetch(symbol, &FetchRequest::Latest)?;
        let row = fetched
            .rows
            .last()
            .cloned()
            .ok_or_else(|| no_rows(symbol))?;
        let change_percent = percent_change(row.open, row.close)?;
        debug!(%symbol, date = %row.date, change_percent, "latest quote");
        Ok(LatestQuote {
            symbol: symbol.clone(),
            row,
            change_percent,
        })
    }

    pub fn history(&self, symbol: &Ticker, period: Period) -> Result<QuoteReport, QuoteError> {
        self.report(symbol, FetchRequest::Recent(period))
    }

    pub fn range(
        &self,
        symbol: &Ticker,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<QuoteReport, QuoteError> {
        let request =
            FetchRequest::range(start, end).map_err(|e| QuoteError::InvalidInput(e.to_string()))?;
        self.report(symbol, request)
    }

    /// Fetch, derive, average and format one symbol.
    pub fn report(&self, symbol: &Ticker, request: FetchRequest) -> Result<QuoteReport, QuoteError> {
        let fetched = self.provider.fetch(symbol, &request)?;
        if fetched.rows.is_empty() {
            return Err(no_rows(symbol).into());
        }
        let table = PriceTable::from_rows(&fetched.rows);

        let derived = add_percent_change(&table)?;
        let averages = average_ohlc(&table)?;
        let display = format_for_display(&derived, &self.style)?;

        info!(%symbol, rows = table.len(), request = %request.label(), "built quote report");
        Ok(QuoteReport {
            symbol: symbol.clone(),
            request,
            derived,
            display,
            averages,
        })
    }

    /// Latest session for each symbol.
    ///
    /// Symbols the provider cannot serve are reported in `failed`; the call
    /// only fails outright if no symbol could be fetched.
    pub fn latest_many(
        &self,
        symbols: &[Ticker],
        progress: &dyn FetchProgress,
    ) -> Result<MultiQuote, QuoteError> {
        if symbols.is_empty() {
            return Err(QuoteError::InvalidInput("no symbols given".into()));
        }

        let batch = fetch_many(self.provider, symbols, &FetchRequest::Latest, progress);
        let mut tables = Vec::new();
        let mut failed = Vec::new();

        for (symbol, outcome) in batch.outcomes {
            match outcome {
                Ok(fetched) if fetched.rows.is_empty() => {
                    let e = no_rows(&symbol);
                    failed.push((symbol, e));
                }
                Ok(fetched) => {
                    let table = PriceTable::from_rows(&fetched.rows);
                    let labels = vec![symbol.to_string(); table.len()];
                    tables.push(table.with_leading_column(SYMBOL, ColumnData::Text(labels))?);
                }
                Err(e) => failed.push((symbol, e)),
            }
        }

        if tables.is_empty() {
            // every symbol failed: surface the first provider error
            let (_, first) = failed.swap_remove(0);
            return Err(first.into());
        }

        let combined = PriceTable::concat(&tables)?;
        let derived = add_percent_change(&combined)?;
        let display = format_for_display(&derived, &self.style)?;

        info!(
            fetched = tables.len(),
            failed = failed.len(),
            "built multi-symbol quote"
        );
        Ok(MultiQuote {
            derived,
            display,
            failed,
        })
    }
}

/// A provider answered but had no sessions for `symbol`.
fn no_rows(symbol: &Ticker) -> DataError {
    DataError::SymbolNotFound {
        symbol: symbol.to_string(),
    }
}
