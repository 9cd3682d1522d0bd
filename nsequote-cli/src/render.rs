//! Plain-text rendering for the console.

use std::fmt::Write;

use nsequote_core::data::{DataError, FetchProgress, FetchResult};
use nsequote_core::domain::table::{DATE, SYMBOL};
use nsequote_core::domain::{AverageSummary, PriceTable};
use nsequote_core::format::{format_price, format_signed_change, format_volume, DisplayStyle};
use nsequote_core::symbol::Ticker;
use nsequote_report::LatestQuote;

/// Aligned table: header, dashed separator, one line per row.
///
/// `Date` and `Symbol` are left-aligned, everything else right-aligned.
pub fn render_table(table: &PriceTable) -> String {
    let headers = table.headers();
    let rows: Vec<Vec<String>> = (0..table.len()).map(|i| table.row_cells(i)).collect();

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(c, h)| {
            rows.iter()
                .map(|r| r[c].chars().count())
                .chain(std::iter::once(h.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();
    let left: Vec<bool> = headers.iter().map(|h| *h == DATE || *h == SYMBOL).collect();

    let line = |cells: &[&str]| -> String {
        cells
            .iter()
            .enumerate()
            .map(|(c, cell)| {
                let w = widths[c];
                if left[c] {
                    format!("{cell:<w$}")
                } else {
                    format!("{cell:>w$}")
                }
            })
            .collect::<Vec<_>>()
            .join("  ")
    };

    let mut out = String::new();
    let _ = writeln!(out, "{}", line(&headers));
    let total = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
    let _ = writeln!(out, "{}", "-".repeat(total));
    for row in &rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        let _ = writeln!(out, "{}", line(&cells));
    }
    out
}

pub fn render_averages(averages: &AverageSummary, style: &DisplayStyle) -> String {
    let mut out = String::from("Averages\n");
    for (name, value) in averages.entries() {
        let _ = writeln!(out, "  {name:<10} {}", format_price(value, style));
    }
    out
}

/// The single-session quote block.
pub fn render_latest(quote: &LatestQuote, style: &DisplayStyle) -> String {
    let row = &quote.row;
    let mut out = String::new();
    let _ = writeln!(out, "Stock: {}", quote.symbol);
    let _ = writeln!(out, "Date: {}", row.date.format("%Y-%m-%d"));
    let _ = writeln!(out);
    let _ = writeln!(out, "Open: {}", format_price(row.open, style));
    let _ = writeln!(out, "High: {}", format_price(row.high, style));
    let _ = writeln!(out, "Low: {}", format_price(row.low, style));
    let _ = writeln!(out, "Close: {}", format_price(row.close, style));
    let _ = writeln!(out, "Volume: {}", format_volume(row.volume));
    let _ = writeln!(
        out,
        "Change: {}",
        format_signed_change(quote.change_percent, style)
    );
    out
}

pub fn no_data(symbol: &str) -> String {
    format!("NO DATA FOUND RELATED TO {symbol}")
}

/// Progress for multi-symbol fetches, on stderr so stdout carries only tables.
pub struct ConsoleProgress;

impl FetchProgress for ConsoleProgress {
    fn on_start(&self, symbol: &Ticker, index: usize, total: usize) {
        eprintln!("[{}/{}] Fetching {symbol}...", index + 1, total);
    }

    fn on_complete(&self, symbol: &Ticker, result: &Result<FetchResult, DataError>) {
        match result {
            Ok(fetched) => eprintln!("  OK: {symbol} ({} rows)", fetched.rows.len()),
            Err(e) => eprintln!("  FAIL: {symbol}: {e}"),
        }
    }
}
