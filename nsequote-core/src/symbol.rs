//! Symbol normalization: raw user input to exchange-qualified tickers.
//!
//! `normalize` is the total, pure rule (trim, uppercase, append the market
//! suffix once). `Ticker::parse` layers validation on top and is what every
//! shell path uses, so an empty or garbled symbol never reaches the provider.

use serde::{Deserialize, Serialize};

use crate::error::QuoteError;

/// National Stock Exchange of India market identifier.
pub const NSE_SUFFIX: &str = "NS";

/// Normalizes symbols for one market.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalizer {
    /// Dotted suffix, e.g. `.NS`.
    suffix: String,
}

impl Normalizer {
    /// Build a normalizer for a market identifier (`"NS"`, `".bo"`, ...).
    pub fn new(market: &str) -> Result<Self, QuoteError> {
        let market = market.trim().trim_start_matches('.').to_uppercase();
        if market.is_empty() || !market.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(QuoteError::InvalidInput(format!(
                "invalid market suffix '{market}'"
            )));
        }
        Ok(Self {
            suffix: format!(".{market}"),
        })
    }

    /// The NSE normalizer.
    pub fn nse() -> Self {
        Self {
            suffix: format!(".{NSE_SUFFIX}"),
        }
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Trim, uppercase, and append the suffix unless already present.
    ///
    /// Uppercasing happens before the suffix check, so `itc.ns` is recognized.
    pub fn normalize(&self, raw: &str) -> String {
        let mut symbol = raw.trim().to_uppercase();
        if !symbol.ends_with(&self.suffix) {
            symbol.push_str(&self.suffix);
        }
        symbol
    }

    /// Apply `normalize` to each element, preserving order and duplicates.
    pub fn normalize_many<S: AsRef<str>>(&self, raws: &[S]) -> Vec<String> {
        raws.iter().map(|s| self.normalize(s.as_ref())).collect()
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::nse()
    }
}

/// Normalize with the NSE suffix.
pub fn normalize(raw: &str) -> String {
    Normalizer::nse().normalize(raw)
}

/// Normalize a batch with the NSE suffix.
pub fn normalize_many<S: AsRef<str>>(raws: &[S]) -> Vec<String> {
    Normalizer::nse().normalize_many(raws)
}

/// A validated, normalized ticker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ticker(String);

impl Ticker {
    /// Validate and normalize user input.
    ///
    /// Rejects empty input, a bare suffix and characters Yahoo symbols never
    /// contain. `&`, `-` and `^` are allowed (`M&M`, `BAJAJ-AUTO`, `^NSEI`).
    pub fn parse(raw: &str, normalizer: &Normalizer) -> Result<Self, QuoteError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(QuoteError::InvalidInput("ticker is empty".into()));
        }
        if let Some(bad) = trimmed.chars().find(|c| !is_symbol_char(*c)) {
            return Err(QuoteError::InvalidInput(format!(
                "ticker '{trimmed}' contains invalid character '{bad}'"
            )));
        }

        let symbol = normalizer.normalize(trimmed);
        let base = &symbol[..symbol.len() - normalizer.suffix().len()];
        if base.is_empty() || base.ends_with('.') {
            return Err(QuoteError::InvalidInput(format!(
                "ticker '{trimmed}' has no symbol before the market suffix"
            )));
        }
        Ok(Self(symbol))
    }

    /// Validate a batch; fails on the first invalid entry.
    pub fn parse_many<S: AsRef<str>>(
        raws: &[S],
        normalizer: &Normalizer,
    ) -> Result<Vec<Self>, QuoteError> {
        raws.iter()
            .map(|s| Self::parse(s.as_ref(), normalizer))
            .collect()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Ticker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Ticker {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn is_symbol_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '&' | '^' | '_')
}
