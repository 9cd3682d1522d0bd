//! Multi-symbol fetches with progress reporting.

use tracing::{info, warn};

use super::provider::{DataError, DataProvider, FetchRequest, FetchResult};
use crate::symbol::Ticker;

/// Progress callback for multi-symbol operations.
pub trait FetchProgress {
    /// Called when starting to fetch a symbol.
    fn on_start(&self, symbol: &Ticker, index: usize, total: usize);

    /// Called when a symbol fetch completes.
    fn on_complete(&self, symbol: &Ticker, result: &Result<FetchResult, DataError>);
}

/// Progress reporter that reports nothing.
pub struct NoProgress;

impl FetchProgress for NoProgress {
    fn on_start(&self, _symbol: &Ticker, _index: usize, _total: usize) {}

    fn on_complete(&self, _symbol: &Ticker, _result: &Result<FetchResult, DataError>) {}
}

/// Per-symbol outcomes of a batch fetch, in input order.
#[derive(Debug)]
pub struct BatchFetch {
    pub outcomes: Vec<(Ticker, Result<FetchResult, DataError>)>,
}

impl BatchFetch {
    pub fn failed(&self) -> impl Iterator<Item = (&Ticker, &DataError)> {
        self.outcomes
            .iter()
            .filter_map(|(t, r)| r.as_ref().err().map(|e| (t, e)))
    }
}

/// Fetch the same request for several symbols, one after another.
///
/// A failing symbol is recorded and the batch continues.
pub fn fetch_many(
    provider: &dyn DataProvider,
    symbols: &[Ticker],
    request: &FetchRequest,
    progress: &dyn FetchProgress,
) -> BatchFetch {
    let total = symbols.len();
    let mut outcomes = Vec::with_capacity(total);

    for (i, symbol) in symbols.iter().enumerate() {
        progress.on_start(symbol, i, total);
        let result = provider.fetch(symbol, request);
        if let Err(e) = &result {
            warn!(%symbol, error = %e, "batch fetch failed for symbol");
        }
        progress.on_complete(symbol, &result);
        outcomes.push((symbol.clone(), result));
    }

    let batch = BatchFetch { outcomes };
    info!(
        total,
        failed = batch.failed().count(),
        request = %request.label(),
        "batch fetch complete"
    );
    batch
}
