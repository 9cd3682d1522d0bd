//! Error taxonomy for the normalize → compute → format pipeline.

use thiserror::Error;

use crate::data::DataError;

/// Runtime kind of a table column.
///
/// `Absent` is never held by a column; it reports a stage input that lacks
/// the column altogether.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Date,
    Float,
    Int,
    Text,
    Absent,
}

impl std::fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ColumnKind::Date => "date",
            ColumnKind::Float => "float",
            ColumnKind::Int => "integer",
            ColumnKind::Text => "text",
            ColumnKind::Absent => "no column",
        };
        f.write_str(name)
    }
}

/// Errors raised by the core pipeline.
///
/// Every variant is a hard failure: the pipeline never hands back a partial
/// table or a `NaN` placeholder.
#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("division by zero: open price is 0 ({0})")]
    DivisionByZero(String),

    #[error("empty input: cannot compute {0} over zero rows")]
    EmptyInput(&'static str),

    #[error("type mismatch in column '{column}': expected {expected}, found {found}")]
    TypeMismatch {
        column: String,
        expected: ColumnKind,
        found: ColumnKind,
    },

    #[error("missing column '{0}'")]
    MissingColumn(String),

    #[error("upstream fetch failed: {0}")]
    UpstreamFetchFailure(#[from] DataError),
}

impl QuoteError {
    /// True if the error originated in the data provider rather than the core.
    pub fn is_upstream(&self) -> bool {
        matches!(self, QuoteError::UpstreamFetchFailure(_))
    }
}
