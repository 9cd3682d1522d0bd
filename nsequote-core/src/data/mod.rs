//! Fetch adapter: provider trait, Yahoo implementation, batch fetches.

pub mod batch;
pub mod period;
pub mod provider;
pub mod yahoo;

pub use batch::{fetch_many, BatchFetch, FetchProgress, NoProgress};
pub use period::{Period, PeriodUnit};
pub use provider::{prepare_rows, DataError, DataProvider, FetchRequest, FetchResult};
pub use yahoo::{YahooProvider, YahooSettings};
