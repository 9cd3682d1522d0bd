//! Display formatter: numeric columns to presentation strings.
//!
//! Formatting is one-way: it turns `Float` columns into `Text` columns, after
//! which no calculation is possible. Run it after the calculator, and only
//! once; a second pass fails with `TypeMismatch`.

use serde::{Deserialize, Serialize};

use crate::analysis::round2;
use crate::domain::table::{ColumnData, PriceTable, CHANGE_PERCENT, PRICE_COLUMNS};
use crate::error::{ColumnKind, QuoteError};

/// Indian Rupee sign.
pub const RUPEE: &str = "₹";

/// How many fractional digits a rounded value is rendered with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FractionStyle {
    /// Always two digits: `100.00`, `10.50`.
    #[default]
    Fixed,
    /// Shortest form with at least one digit: `100.0`, `10.5`, `10.57`.
    Compact,
}

/// Presentation settings shared by every formatter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayStyle {
    pub currency_symbol: String,
    pub fraction: FractionStyle,
}

impl Default for DisplayStyle {
    fn default() -> Self {
        Self {
            currency_symbol: RUPEE.to_string(),
            fraction: FractionStyle::Fixed,
        }
    }
}

impl DisplayStyle {
    /// Render a number rounded to 2 decimals according to the fraction style.
    pub fn number(&self, value: f64) -> String {
        // avoid "-0.00"
        let rounded = match round2(value) {
            v if v == 0.0 => 0.0,
            v => v,
        };
        match self.fraction {
            FractionStyle::Fixed => format!("{rounded:.2}"),
            FractionStyle::Compact => {
                let mut s = rounded.to_string();
                if !s.contains('.') {
                    s.push_str(".0");
                }
                s
            }
        }
    }
}

/// `₹1234.50`
pub fn format_price(value: f64, style: &DisplayStyle) -> String {
    format!("{}{}", style.currency_symbol, style.number(value))
}

/// `-3.25 %`
pub fn format_percent(value: f64, style: &DisplayStyle) -> String {
    format!("{} %", style.number(value))
}

/// `+3.25%`, `-3.25%` or `0.00%`, used by the single-quote view.
pub fn format_signed_change(value: f64, style: &DisplayStyle) -> String {
    let body = style.number(value);
    if round2(value) > 0.0 {
        format!("+{body}%")
    } else {
        format!("{body}%")
    }
}

/// Volume with thousands separators: `1,234,567`.
pub fn format_volume(volume: u64) -> String {
    let digits = volume.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Copy of `table` with Open/High/Low/Close rendered as currency strings.
pub fn format_currency(table: &PriceTable, style: &DisplayStyle) -> Result<PriceTable, QuoteError> {
    let mut out = table.clone();
    for name in PRICE_COLUMNS {
        let values = checked_floats(table, name)?;
        let text = values.iter().map(|v| format_price(*v, style)).collect();
        out = out.with_column(name, ColumnData::Text(text))?;
    }
    Ok(out)
}

/// Copy of `table` with `Change %` rendered as `"<value> %"`.
pub fn format_change_percent(
    table: &PriceTable,
    style: &DisplayStyle,
) -> Result<PriceTable, QuoteError> {
    let values = checked_floats(table, CHANGE_PERCENT)?;
    let text = values.iter().map(|v| format_percent(*v, style)).collect();
    table.with_column(CHANGE_PERCENT, ColumnData::Text(text))
}

/// Currency then percentage formatting: the full display table.
pub fn format_for_display(
    table: &PriceTable,
    style: &DisplayStyle,
) -> Result<PriceTable, QuoteError> {
    let priced = format_currency(table, style)?;
    format_change_percent(&priced, style)
}

/// Numeric input column for a formatter stage.
///
/// A column that is absent (the calculator has not run yet) is reported as a
/// `TypeMismatch` against `Absent`, same as one that is already text.
fn checked_floats<'a>(table: &'a PriceTable, name: &str) -> Result<&'a [f64], QuoteError> {
    let values = table.floats(name).map_err(|e| match e {
        QuoteError::MissingColumn(column) => QuoteError::TypeMismatch {
            column,
            expected: ColumnKind::Float,
            found: ColumnKind::Absent,
        },
        other => other,
    })?;
    if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
        return Err(QuoteError::InvalidInput(format!(
            "cannot format non-finite value {bad} in column '{name}'"
        )));
    }
    Ok(values)
}
