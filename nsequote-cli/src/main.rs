//! nsequote CLI: NSE stock quotes from Yahoo Finance.
//!
//! Commands:
//! - `today`: latest session for one symbol
//! - `history`: trailing period (`1d`, `7d`, `1m`, `3m`, `1y`, ...)
//! - `range`: explicit date range
//! - `compare`: latest session for several symbols
//! - `menu`: interactive numbered menu (default)

mod render;
mod session;

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::info;

use nsequote_core::data::{Period, YahooProvider};
use nsequote_report::{QuoteConfig, QuoteService};

use crate::render::ConsoleProgress;
use crate::session::{ExportTarget, SavePolicy, Session};

#[derive(Parser)]
#[command(
    name = "nsequote",
    version,
    about = "nsequote: NSE stock quotes, history and CSV export"
)]
struct Cli {
    /// Path to a TOML config file. Defaults to <config dir>/nsequote/config.toml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Save every view to CSV without asking.
    #[arg(long, global = true, conflicts_with = "no_save")]
    save: bool,

    /// Never save, never ask.
    #[arg(long, global = true)]
    no_save: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Latest trading session for a symbol.
    Today {
        /// Symbol, with or without the market suffix (e.g., ITC or ITC.NS).
        symbol: String,
    },
    /// Daily rows for a trailing period.
    History {
        symbol: String,

        /// Look-back period: <n>d, <n>w, <n>m or <n>y.
        #[arg(long, default_value = "1m")]
        period: Period,
    },
    /// Daily rows between two dates, inclusive.
    Range {
        symbol: String,

        /// Start date (YYYY-MM-DD).
        #[arg(long)]
        start: NaiveDate,

        /// End date (YYYY-MM-DD).
        #[arg(long)]
        end: NaiveDate,
    },
    /// Latest session for several symbols side by side.
    Compare {
        #[arg(required = true)]
        symbols: Vec<String>,
    },
    /// Interactive menu.
    Menu,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = QuoteConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    let provider = YahooProvider::new(config.yahoo_settings())?;

    let policy = match (cli.save, cli.no_save) {
        (true, _) => SavePolicy::Always,
        (_, true) => SavePolicy::Never,
        _ => SavePolicy::Ask,
    };
    let export = ExportTarget {
        dir: config.export.output_dir.clone(),
        bom: config.export.bom,
        policy,
    };

    let service = QuoteService::new(&provider, config.display_style());
    info!(provider = service.provider_name(), "starting");
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut session = Session::new(
        service,
        config.normalizer()?,
        export,
        stdin.lock(),
        stdout.lock(),
    )
    .with_progress(&ConsoleProgress);

    let shown = match cli.command.unwrap_or(Commands::Menu) {
        Commands::Today { symbol } => session.show_today(&symbol)?,
        Commands::History { symbol, period } => session.show_history(&symbol, period)?,
        Commands::Range { symbol, start, end } => session.show_range(&symbol, start, end)?,
        Commands::Compare { symbols } => session.show_compare(&symbols)?,
        Commands::Menu => {
            session.run_menu()?;
            true
        }
    };

    if !shown {
        std::process::exit(1);
    }
    Ok(())
}

/// Log to stderr, filtered by `RUST_LOG` (default `warn`).
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand_means_menu() {
        let cli = Cli::try_parse_from(["nsequote"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.save && !cli.no_save);
    }

    #[test]
    fn history_parses_period() {
        let cli = Cli::try_parse_from(["nsequote", "history", "itc", "--period", "3m"]).unwrap();
        match cli.command {
            Some(Commands::History { symbol, period }) => {
                assert_eq!(symbol, "itc");
                assert_eq!(period, Period::months(3));
            }
            _ => panic!("expected history"),
        }
    }

    #[test]
    fn bad_period_and_dates_are_rejected() {
        assert!(Cli::try_parse_from(["nsequote", "history", "itc", "--period", "3q"]).is_err());
        assert!(Cli::try_parse_from([
            "nsequote", "range", "itc", "--start", "2024-13-01", "--end", "2024-12-31"
        ])
        .is_err());
    }

    #[test]
    fn save_flags_conflict() {
        assert!(Cli::try_parse_from(["nsequote", "--save", "--no-save", "today", "itc"]).is_err());
        let cli = Cli::try_parse_from(["nsequote", "compare", "itc", "tcs", "--save"]).unwrap();
        assert!(cli.save);
    }
}
