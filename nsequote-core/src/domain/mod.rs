//! Domain types for nsequote

pub mod price;
pub mod table;

pub use price::{AverageSummary, DisplayRow, PriceRow};
pub use table::{Column, ColumnData, PriceTable};
