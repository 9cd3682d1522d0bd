//! nsequote core: symbol normalization, quote statistics, display formatting.
//!
//! This crate contains the quote pipeline:
//! - Domain types (price rows, column-typed price tables, average summaries)
//! - Symbol normalizer (exchange-qualified NSE tickers)
//! - Calculator (percentage change, OHLC averages)
//! - Display formatter (Rupee prices, percentages)
//! - Fetch adapter (provider trait, Yahoo Finance chart API)

pub mod analysis;
pub mod data;
pub mod domain;
pub mod error;
pub mod format;
pub mod symbol;

pub use error::{ColumnKind, QuoteError};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: public types can cross threads.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::PriceRow>();
        require_sync::<domain::PriceRow>();
        require_send::<domain::PriceTable>();
        require_sync::<domain::PriceTable>();
        require_send::<domain::AverageSummary>();
        require_sync::<domain::AverageSummary>();
        require_send::<domain::DisplayRow>();
        require_sync::<domain::DisplayRow>();
        require_send::<symbol::Ticker>();
        require_sync::<symbol::Ticker>();
        require_send::<format::DisplayStyle>();
        require_sync::<format::DisplayStyle>();
        require_send::<data::FetchRequest>();
        require_sync::<data::FetchRequest>();
        require_send::<data::YahooProvider>();
        require_sync::<data::YahooProvider>();
        require_send::<QuoteError>();
        require_sync::<QuoteError>();
    }

    /// Architecture contract: the calculator and formatter are pure functions
    /// over a borrowed table and hand back a new one.
    #[test]
    fn pipeline_stages_borrow_and_return_owned_tables() {
        fn _check(table: &domain::PriceTable, style: &format::DisplayStyle) {
            let _: Result<domain::PriceTable, QuoteError> = analysis::add_percent_change(table);
            let _: Result<domain::AverageSummary, QuoteError> = analysis::average_ohlc(table);
            let _: Result<domain::PriceTable, QuoteError> = format::format_currency(table, style);
            let _: Result<domain::PriceTable, QuoteError> =
                format::format_change_percent(table, style);
        }
    }
}
