//! PriceTable: column-typed row set passed between pipeline stages.
//!
//! Columns carry their kind at runtime so that a stage handed a column it
//! cannot work with (for example a price column that has already been turned
//! into currency text) fails with `TypeMismatch` instead of producing garbage.
//! Every transform clones: stages never mutate the table they receive.

use chrono::NaiveDate;

use super::price::{DisplayRow, PriceRow};
use crate::error::{ColumnKind, QuoteError};

pub const DATE: &str = "Date";
pub const OPEN: &str = "Open";
pub const HIGH: &str = "High";
pub const LOW: &str = "Low";
pub const CLOSE: &str = "Close";
pub const VOLUME: &str = "Volume";
pub const CHANGE_PERCENT: &str = "Change %";
pub const SYMBOL: &str = "Symbol";

/// The four price columns, in OHLC order.
pub const PRICE_COLUMNS: [&str; 4] = [OPEN, HIGH, LOW, CLOSE];

/// Values of a single column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Date(Vec<NaiveDate>),
    Float(Vec<f64>),
    Int(Vec<u64>),
    Text(Vec<String>),
}

impl ColumnData {
    pub fn kind(&self) -> ColumnKind {
        match self {
            ColumnData::Date(_) => ColumnKind::Date,
            ColumnData::Float(_) => ColumnKind::Float,
            ColumnData::Int(_) => ColumnKind::Int,
            ColumnData::Text(_) => ColumnKind::Text,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnData::Date(v) => v.len(),
            ColumnData::Float(v) => v.len(),
            ColumnData::Int(v) => v.len(),
            ColumnData::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Plain rendering of one cell. Dates use ISO format.
    pub fn cell(&self, index: usize) -> Option<String> {
        match self {
            ColumnData::Date(v) => v.get(index).map(|d| d.format("%Y-%m-%d").to_string()),
            ColumnData::Float(v) => v.get(index).map(|x| x.to_string()),
            ColumnData::Int(v) => v.get(index).map(|x| x.to_string()),
            ColumnData::Text(v) => v.get(index).cloned(),
        }
    }

    fn extend(&mut self, other: &ColumnData) -> bool {
        match (self, other) {
            (ColumnData::Date(a), ColumnData::Date(b)) => a.extend_from_slice(b),
            (ColumnData::Float(a), ColumnData::Float(b)) => a.extend_from_slice(b),
            (ColumnData::Int(a), ColumnData::Int(b)) => a.extend_from_slice(b),
            (ColumnData::Text(a), ColumnData::Text(b)) => a.extend_from_slice(b),
            _ => return false,
        }
        true
    }
}

/// A named column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

/// Ordered, column-typed set of price rows (date ascending by provider convention).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PriceTable {
    columns: Vec<Column>,
    rows: usize,
}

impl PriceTable {
    /// Build the numeric `Date, Open, High, Low, Close, Volume` table.
    pub fn from_rows(rows: &[PriceRow]) -> Self {
        let columns = vec![
            Column {
                name: DATE.into(),
                data: ColumnData::Date(rows.iter().map(|r| r.date).collect()),
            },
            Column {
                name: OPEN.into(),
                data: ColumnData::Float(rows.iter().map(|r| r.open).collect()),
            },
            Column {
                name: HIGH.into(),
                data: ColumnData::Float(rows.iter().map(|r| r.high).collect()),
            },
            Column {
                name: LOW.into(),
                data: ColumnData::Float(rows.iter().map(|r| r.low).collect()),
            },
            Column {
                name: CLOSE.into(),
                data: ColumnData::Float(rows.iter().map(|r| r.close).collect()),
            },
            Column {
                name: VOLUME.into(),
                data: ColumnData::Int(rows.iter().map(|r| r.volume).collect()),
            },
        ];
        Self {
            columns,
            rows: rows.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn headers(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Result<&Column, QuoteError> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| QuoteError::MissingColumn(name.to_string()))
    }

    pub fn floats(&self, name: &str) -> Result<&[f64], QuoteError> {
        match &self.column(name)?.data {
            ColumnData::Float(v) => Ok(v),
            other => Err(mismatch(name, ColumnKind::Float, other)),
        }
    }

    pub fn dates(&self, name: &str) -> Result<&[NaiveDate], QuoteError> {
        match &self.column(name)?.data {
            ColumnData::Date(v) => Ok(v),
            other => Err(mismatch(name, ColumnKind::Date, other)),
        }
    }

    pub fn ints(&self, name: &str) -> Result<&[u64], QuoteError> {
        match &self.column(name)?.data {
            ColumnData::Int(v) => Ok(v),
            other => Err(mismatch(name, ColumnKind::Int, other)),
        }
    }

    pub fn texts(&self, name: &str) -> Result<&[String], QuoteError> {
        match &self.column(name)?.data {
            ColumnData::Text(v) => Ok(v),
            other => Err(mismatch(name, ColumnKind::Text, other)),
        }
    }

    /// Copy of this table with `name` replaced in place, or appended if absent.
    pub fn with_column(&self, name: &str, data: ColumnData) -> Result<Self, QuoteError> {
        self.check_len(name, &data)?;
        let mut next = self.clone();
        match next.columns.iter_mut().find(|c| c.name == name) {
            Some(col) => col.data = data,
            None => next.columns.push(Column {
                name: name.to_string(),
                data,
            }),
        }
        next.rows = next.columns[0].data.len();
        Ok(next)
    }

    /// Copy of this table with a new first column.
    pub fn with_leading_column(&self, name: &str, data: ColumnData) -> Result<Self, QuoteError> {
        if self.has_column(name) {
            return Err(QuoteError::InvalidInput(format!(
                "column '{name}' already exists"
            )));
        }
        self.check_len(name, &data)?;
        let mut next = self.clone();
        next.rows = data.len();
        next.columns.insert(
            0,
            Column {
                name: name.to_string(),
                data,
            },
        );
        Ok(next)
    }

    /// Stack tables with identical layouts on top of each other.
    pub fn concat(tables: &[PriceTable]) -> Result<Self, QuoteError> {
        let Some((first, rest)) = tables.split_first() else {
            return Ok(Self::default());
        };
        let mut out = first.clone();
        for table in rest {
            if table.headers() != out.headers() {
                return Err(QuoteError::InvalidInput(format!(
                    "cannot stack tables with columns {:?} and {:?}",
                    out.headers(),
                    table.headers()
                )));
            }
            for (dst, src) in out.columns.iter_mut().zip(&table.columns) {
                if !dst.data.extend(&src.data) {
                    return Err(mismatch(&dst.name, dst.data.kind(), &src.data));
                }
            }
            out.rows += table.rows;
        }
        Ok(out)
    }

    /// Plain string cells of one row, in column order.
    pub fn row_cells(&self, index: usize) -> Vec<String> {
        self.columns
            .iter()
            .map(|c| c.data.cell(index).unwrap_or_default())
            .collect()
    }

    /// Typed view of a fully formatted table.
    ///
    /// Requires text prices and a text `Change %` column; a table that still
    /// holds numbers fails with `TypeMismatch`.
    pub fn display_rows(&self) -> Result<Vec<DisplayRow>, QuoteError> {
        let dates = self.dates(DATE)?;
        let open = self.texts(OPEN)?;
        let high = self.texts(HIGH)?;
        let low = self.texts(LOW)?;
        let close = self.texts(CLOSE)?;
        let volume = self.ints(VOLUME)?;
        let change = self.texts(CHANGE_PERCENT)?;

        Ok((0..self.rows)
            .map(|i| DisplayRow {
                date: dates[i].format("%Y-%m-%d").to_string(),
                open: open[i].clone(),
                high: high[i].clone(),
                low: low[i].clone(),
                close: close[i].clone(),
                volume: volume[i],
                change_percent: change[i].clone(),
            })
            .collect())
    }

    fn check_len(&self, name: &str, data: &ColumnData) -> Result<(), QuoteError> {
        if !self.columns.is_empty() && data.len() != self.rows {
            return Err(QuoteError::InvalidInput(format!(
                "column '{name}' has {} values, table has {} rows",
                data.len(),
                self.rows
            )));
        }
        Ok(())
    }
}

fn mismatch(name: &str, expected: ColumnKind, found: &ColumnData) -> QuoteError {
    QuoteError::TypeMismatch {
        column: name.to_string(),
        expected,
        found: found.kind(),
    }
}
