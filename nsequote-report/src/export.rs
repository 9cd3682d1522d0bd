//! CSV export of display tables.
//!
//! Files are UTF-8 (optionally with a byte-order mark so spreadsheet apps
//! render the Rupee sign), one header row, one row per session, named
//! `<TICKER>_<PERIOD>_<YYYY-MM-DD>.csv`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::info;

use nsequote_core::domain::PriceTable;

use crate::service::{MultiQuote, QuoteReport};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Ticker label used for multi-symbol exports.
pub const MULTI_LABEL: &str = "MULTI";

/// Serialize a single-symbol report's display rows.
///
/// Columns: Date, Open, High, Low, Close, Volume, Change %
pub fn export_report_csv(report: &QuoteReport, bom: bool) -> Result<Vec<u8>> {
    let rows = report
        .display
        .display_rows()
        .context("report table is not fully formatted")?;

    let mut wtr = csv::Writer::from_writer(prefix(bom));
    for row in &rows {
        wtr.serialize(row)?;
    }
    if rows.is_empty() {
        wtr.write_record(report.display.headers())?;
    }
    wtr.into_inner().context("failed to flush CSV writer")
}

/// Serialize any table as-is: its headers, then every row's cells.
pub fn export_table_csv(table: &PriceTable, bom: bool) -> Result<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(prefix(bom));
    wtr.write_record(table.headers())?;
    for i in 0..table.len() {
        wtr.write_record(table.row_cells(i))?;
    }
    wtr.into_inner().context("failed to flush CSV writer")
}

/// `<TICKER>_<PERIOD>_<YYYY-MM-DD>.csv`
pub fn csv_file_name(ticker: &str, period: &str, date: NaiveDate) -> String {
    format!("{ticker}_{period}_{}.csv", date.format("%Y-%m-%d"))
}

/// Write a report to `dir`, creating it if needed. Returns the file path.
pub fn save_report(report: &QuoteReport, dir: &Path, bom: bool, today: NaiveDate) -> Result<PathBuf> {
    let bytes = export_report_csv(report, bom)?;
    let name = csv_file_name(report.symbol.as_str(), &report.request.label(), today);
    write_file(dir, &name, &bytes)
}

/// Write a multi-symbol quote to `dir` as `MULTI_latest_<date>.csv`.
pub fn save_multi(multi: &MultiQuote, dir: &Path, bom: bool, today: NaiveDate) -> Result<PathBuf> {
    let bytes = export_table_csv(&multi.display, bom)?;
    let name = csv_file_name(MULTI_LABEL, "latest", today);
    write_file(dir, &name, &bytes)
}

fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create export dir: {}", dir.display()))?;
    let path = dir.join(name);
    std::fs::write(&path, bytes).with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), bytes = bytes.len(), "saved CSV");
    Ok(path)
}

fn prefix(bom: bool) -> Vec<u8> {
    if bom {
        UTF8_BOM.to_vec()
    } else {
        Vec::new()
    }
}
