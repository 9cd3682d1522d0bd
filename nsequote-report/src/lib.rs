//! nsequote report: quote orchestration, configuration and CSV export.
//!
//! This crate builds on `nsequote-core` to provide:
//! - TOML configuration with per-user defaults
//! - The quote service (fetch → derive → average → format)
//! - CSV persistence of display tables

pub mod config;
pub mod export;
pub mod service;

pub use config::{ConfigError, QuoteConfig};
pub use export::{csv_file_name, export_report_csv, export_table_csv, save_multi, save_report};
pub use service::{LatestQuote, MultiQuote, QuoteReport, QuoteService};
