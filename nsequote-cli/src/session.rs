//! Console session: the interactive menu and the one-shot views it shares
//! with the subcommands.
//!
//! Generic over input and output so the whole flow can be driven from a
//! byte buffer in tests.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::debug;

use nsequote_core::data::{FetchProgress, NoProgress, Period};
use nsequote_core::symbol::{Normalizer, Ticker};
use nsequote_core::QuoteError;
use nsequote_report::{save_multi, save_report, QuoteService};

use crate::render::{no_data, render_averages, render_latest, render_table};

/// What to do after a history, range or compare view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SavePolicy {
    Ask,
    Always,
    Never,
}

/// Where and how CSV files are written.
#[derive(Debug, Clone)]
pub struct ExportTarget {
    pub dir: PathBuf,
    pub bom: bool,
    pub policy: SavePolicy,
}

const MENU: &str = "\
1. For Today stock detail
2. For Historical stock detail
3. For Date range stock detail
4. For Comparing stocks
5. For Exit
";

pub struct Session<'a, R, W> {
    service: QuoteService<'a>,
    normalizer: Normalizer,
    export: ExportTarget,
    progress: &'a dyn FetchProgress,
    today: NaiveDate,
    input: R,
    out: W,
}

impl<'a, R: BufRead, W: Write> Session<'a, R, W> {
    pub fn new(
        service: QuoteService<'a>,
        normalizer: Normalizer,
        export: ExportTarget,
        input: R,
        out: W,
    ) -> Self {
        Self {
            service,
            normalizer,
            export,
            progress: &NoProgress,
            today: chrono::Local::now().date_naive(),
            input,
            out,
        }
    }

    pub fn with_progress(mut self, progress: &'a dyn FetchProgress) -> Self {
        self.progress = progress;
        self
    }

    /// Date stamped into saved file names.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Run the numbered menu until the user exits or input ends.
    pub fn run_menu(&mut self) -> Result<()> {
        loop {
            write!(self.out, "\n{MENU}")?;
            let Some(choice) = self.prompt("Choose Option: ")? else {
                break;
            };
            match choice.parse::<u8>() {
                Ok(1) => self.menu_today()?,
                Ok(2) => self.menu_history()?,
                Ok(3) => self.menu_range()?,
                Ok(4) => self.menu_compare()?,
                Ok(5) => break,
                _ => writeln!(self.out, "Invalid option '{choice}', choose 1-5")?,
            }
        }
        writeln!(self.out, "Goodbye")?;
        Ok(())
    }

    fn menu_today(&mut self) -> Result<()> {
        if let Some(symbol) = self.prompt("Enter Stock Name: ")? {
            self.show_today(&symbol)?;
        }
        Ok(())
    }

    fn menu_history(&mut self) -> Result<()> {
        let Some(symbol) = self.prompt("Enter Stock Name: ")? else {
            return Ok(());
        };
        let Some(raw) = self.prompt("Enter Period (1d/3d/7d/1m/3m): ")? else {
            return Ok(());
        };
        match raw.parse::<Period>() {
            Ok(period) => {
                self.show_history(&symbol, period)?;
            }
            Err(e) => writeln!(self.out, "{e}")?,
        }
        Ok(())
    }

    fn menu_range(&mut self) -> Result<()> {
        let Some(symbol) = self.prompt("Enter Stock Name: ")? else {
            return Ok(());
        };
        let Some(start) = self.prompt_date("Enter Start Date (YYYY-MM-DD): ")? else {
            return Ok(());
        };
        let Some(end) = self.prompt_date("Enter End Date (YYYY-MM-DD): ")? else {
            return Ok(());
        };
        self.show_range(&symbol, start, end)?;
        Ok(())
    }

    fn menu_compare(&mut self) -> Result<()> {
        if let Some(line) = self.prompt("Enter Stock Names (space or comma separated): ")? {
            let symbols: Vec<String> = line
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            self.show_compare(&symbols)?;
        }
        Ok(())
    }

    /// Latest session for one symbol. Returns false if nothing was shown.
    pub fn show_today(&mut self, raw: &str) -> Result<bool> {
        let Some(symbol) = self.parse_symbol(raw)? else {
            return Ok(false);
        };
        match self.service.latest(&symbol) {
            Ok(quote) => {
                let text = render_latest(&quote, self.service.style());
                write!(self.out, "\n{text}")?;
                Ok(true)
            }
            Err(e) => self.report_failure(symbol.as_str(), e),
        }
    }

    /// Trailing period for one symbol, then the save step.
    pub fn show_history(&mut self, raw: &str, period: Period) -> Result<bool> {
        let Some(symbol) = self.parse_symbol(raw)? else {
            return Ok(false);
        };
        let result = self.service.history(&symbol, period);
        self.show_report(symbol.as_str(), result)
    }

    /// Explicit date range for one symbol, then the save step.
    pub fn show_range(&mut self, raw: &str, start: NaiveDate, end: NaiveDate) -> Result<bool> {
        let Some(symbol) = self.parse_symbol(raw)? else {
            return Ok(false);
        };
        let result = self.service.range(&symbol, start, end);
        self.show_report(symbol.as_str(), result)
    }

    /// Latest session for several symbols side by side, then the save step.
    pub fn show_compare<S: AsRef<str>>(&mut self, raws: &[S]) -> Result<bool> {
        if raws.is_empty() {
            writeln!(self.out, "No symbols given")?;
            return Ok(false);
        }
        let symbols = match Ticker::parse_many(raws, &self.normalizer) {
            Ok(s) => s,
            Err(e) => {
                writeln!(self.out, "{e}")?;
                return Ok(false);
            }
        };

        let multi = match self.service.latest_many(&symbols, self.progress) {
            Ok(m) => m,
            Err(e) if e.is_upstream() => {
                debug!(error = %e, "compare: no symbol could be fetched");
                for symbol in &symbols {
                    writeln!(self.out, "{}", no_data(symbol.as_str()))?;
                }
                return Ok(false);
            }
            Err(e) => {
                writeln!(self.out, "Error: {e}")?;
                return Ok(false);
            }
        };

        write!(self.out, "\n{}", render_table(&multi.display))?;
        for (symbol, e) in &multi.failed {
            debug!(%symbol, error = %e, "compare: symbol skipped");
            writeln!(self.out, "{}", no_data(symbol.as_str()))?;
        }

        let (bom, today) = (self.export.bom, self.today);
        self.offer_save(|dir| save_multi(&multi, dir, bom, today))?;
        Ok(true)
    }

    fn show_report(
        &mut self,
        label: &str,
        result: Result<nsequote_report::QuoteReport, QuoteError>,
    ) -> Result<bool> {
        let report = match result {
            Ok(r) => r,
            Err(e) => return self.report_failure(label, e),
        };
        let style = self.service.style();
        let text = format!(
            "\n{}\n{}",
            render_table(&report.display),
            render_averages(&report.averages, style)
        );
        write!(self.out, "{text}")?;

        let (bom, today) = (self.export.bom, self.today);
        self.offer_save(|dir| save_report(&report, dir, bom, today))?;
        Ok(true)
    }

    fn report_failure(&mut self, label: &str, e: QuoteError) -> Result<bool> {
        if e.is_upstream() {
            debug!(symbol = label, error = %e, "no data");
            writeln!(self.out, "{}", no_data(label))?;
        } else {
            writeln!(self.out, "Error: {e}")?;
        }
        Ok(false)
    }

    fn parse_symbol(&mut self, raw: &str) -> Result<Option<Ticker>> {
        match Ticker::parse(raw, &self.normalizer) {
            Ok(t) => Ok(Some(t)),
            Err(e) => {
                writeln!(self.out, "{e}")?;
                Ok(None)
            }
        }
    }

    fn offer_save<F>(&mut self, save: F) -> Result<()>
    where
        F: FnOnce(&Path) -> Result<PathBuf>,
    {
        let wanted = match self.export.policy {
            SavePolicy::Always => true,
            SavePolicy::Never => false,
            SavePolicy::Ask => {
                let answer = self.prompt("Save to CSV? (y/n): ")?.unwrap_or_default();
                matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes")
            }
        };
        if !wanted {
            return Ok(());
        }
        match save(&self.export.dir) {
            Ok(path) => writeln!(self.out, "Saved to {}", path.display())?,
            Err(e) => writeln!(self.out, "Failed to save CSV: {e:#}")?,
        }
        Ok(())
    }

    fn prompt_date(&mut self, label: &str) -> Result<Option<NaiveDate>> {
        loop {
            let Some(raw) = self.prompt(label)? else {
                return Ok(None);
            };
            match NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
                Ok(d) => return Ok(Some(d)),
                Err(_) => writeln!(self.out, "Invalid date '{raw}', expected YYYY-MM-DD")?,
            }
        }
    }

    /// Print `label`, read one trimmed line. `None` at end of input.
    fn prompt(&mut self, label: &str) -> Result<Option<String>> {
        write!(self.out, "{label}")?;
        self.out.flush()?;
        let mut line = String::new();
        let n = self
            .input
            .read_line(&mut line)
            .context("failed to read from stdin")?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}
