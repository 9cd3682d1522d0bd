//! PriceRow: one trading session for one symbol.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily OHLCV record as delivered by a data provider.
///
/// Dividend, split and adjusted-close metadata are dropped by the provider
/// before a row is built; only the raw session prices remain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRow {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl PriceRow {
    /// Returns true if any price field is NaN or infinite.
    pub fn has_non_finite(&self) -> bool {
        !(self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite())
    }

    /// Basic sanity check: finite, non-negative, high/low bracket open and close.
    pub fn is_sane(&self) -> bool {
        if self.has_non_finite() {
            return false;
        }
        self.open >= 0.0
            && self.low >= 0.0
            && self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
    }
}

/// Mean OHLC values across a row set, each rounded to 2 decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AverageSummary {
    pub avg_open: f64,
    pub avg_high: f64,
    pub avg_low: f64,
    pub avg_close: f64,
}

impl AverageSummary {
    /// The four averages keyed by their canonical names, in OHLC order.
    pub fn entries(&self) -> [(&'static str, f64); 4] {
        [
            ("avg_open", self.avg_open),
            ("avg_high", self.avg_high),
            ("avg_low", self.avg_low),
            ("avg_close", self.avg_close),
        ]
    }
}

/// Presentation form of a derived row. Field order is the persisted CSV
/// column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayRow {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Open")]
    pub open: String,
    #[serde(rename = "High")]
    pub high: String,
    #[serde(rename = "Low")]
    pub low: String,
    #[serde(rename = "Close")]
    pub close: String,
    #[serde(rename = "Volume")]
    pub volume: u64,
    #[serde(rename = "Change %")]
    pub change_percent: String,
}
