//! Integration tests for the quote service against a scripted provider.

use std::collections::HashMap;

use chrono::NaiveDate;
use proptest::prelude::*;

use nsequote_core::data::{
    prepare_rows, DataError, DataProvider, FetchRequest, FetchResult, NoProgress, Period,
};
use nsequote_core::domain::table::{CHANGE_PERCENT, CLOSE, OPEN, SYMBOL};
use nsequote_core::domain::PriceRow;
use nsequote_core::format::{DisplayStyle, FractionStyle};
use nsequote_core::symbol::{Normalizer, Ticker};
use nsequote_core::QuoteError;
use nsequote_report::QuoteService;

struct ScriptedProvider {
    rows: HashMap<String, Vec<PriceRow>>,
}

impl DataProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn fetch(&self, symbol: &Ticker, request: &FetchRequest) -> Result<FetchResult, DataError> {
        match self.rows.get(symbol.as_str()) {
            Some(rows) => Ok(FetchResult {
                symbol: symbol.clone(),
                rows: prepare_rows(rows.clone(), request),
            }),
            None => Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            }),
        }
    }
}

fn row(day: u32, open: f64, high: f64, low: f64, close: f64) -> PriceRow {
    PriceRow {
        date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
        open,
        high,
        low,
        close,
        volume: 1_000 * u64::from(day),
    }
}

fn provider() -> ScriptedProvider {
    let mut rows = HashMap::new();
    rows.insert(
        "ITC.NS".to_string(),
        vec![
            row(2, 100.0, 112.0, 99.0, 110.0),
            row(3, 200.0, 205.0, 190.0, 190.0),
            row(4, 300.0, 310.0, 295.0, 300.0),
        ],
    );
    rows.insert("ZERO.NS".to_string(), vec![row(2, 0.0, 1.0, 0.0, 1.0)]);
    // answers, but with no sessions
    rows.insert("EMPTY.NS".to_string(), Vec::new());
    rows.insert(
        "TCS.NS".to_string(),
        vec![row(3, 4000.0, 4100.0, 3950.0, 4040.0)],
    );
    ScriptedProvider { rows }
}

fn ticker(raw: &str) -> Ticker {
    Ticker::parse(raw, &Normalizer::nse()).unwrap()
}

#[test]
fn latest_quote_uses_last_session() {
    let p = provider();
    let service = QuoteService::new(&p, DisplayStyle::default());
    assert_eq!(service.provider_name(), "scripted");
    let quote = service.latest(&ticker("itc")).unwrap();
    assert_eq!(quote.symbol.as_str(), "ITC.NS");
    assert_eq!(quote.row.date, NaiveDate::from_ymd_opt(2024, 1, 4).unwrap());
    assert_eq!(quote.change_percent, 0.0);
}

#[test]
fn history_report_has_derived_display_and_averages() {
    let p = provider();
    let service = QuoteService::new(&p, DisplayStyle::default());
    let report = service.history(&ticker("ITC"), Period::months(1)).unwrap();

    assert_eq!(report.derived.floats(CHANGE_PERCENT).unwrap(), &[10.0, -5.0, 0.0]);
    assert_eq!(
        report.display.texts(CHANGE_PERCENT).unwrap(),
        &["10.00 %", "-5.00 %", "0.00 %"]
    );
    assert_eq!(report.display.texts(OPEN).unwrap()[0], "₹100.00");
    assert_eq!(report.averages.avg_close, 200.0);
    assert_eq!(report.averages.avg_open, 200.0);
    assert_eq!(report.request.label(), "1m");
}

#[test]
fn compact_style_reproduces_short_rendering() {
    let p = provider();
    let style = DisplayStyle {
        fraction: FractionStyle::Compact,
        ..DisplayStyle::default()
    };
    let service = QuoteService::new(&p, style);
    let report = service.history(&ticker("itc"), Period::days(7)).unwrap();
    assert_eq!(report.display.texts(OPEN).unwrap()[0], "₹100.0");
    assert_eq!(report.display.texts(CHANGE_PERCENT).unwrap()[0], "10.0 %");
}

#[test]
fn range_rejects_inverted_dates_as_invalid_input() {
    let p = provider();
    let service = QuoteService::new(&p, DisplayStyle::default());
    let err = service
        .range(
            &ticker("itc"),
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        )
        .unwrap_err();
    assert!(matches!(err, QuoteError::InvalidInput(_)));
}

#[test]
fn unknown_symbol_is_upstream_failure() {
    let p = provider();
    let service = QuoteService::new(&p, DisplayStyle::default());
    let err = service.latest(&ticker("nope")).unwrap_err();
    assert!(err.is_upstream());
}

#[test]
fn provider_with_no_rows_is_reported_as_not_found() {
    let p = provider();
    let service = QuoteService::new(&p, DisplayStyle::default());
    let empty = ticker("empty");

    for err in [
        service.history(&empty, Period::months(1)).unwrap_err(),
        service.latest(&empty).unwrap_err(),
    ] {
        assert!(
            matches!(
                &err,
                QuoteError::UpstreamFetchFailure(DataError::SymbolNotFound { symbol })
                    if symbol == "EMPTY.NS"
            ),
            "got {err:?}"
        );
    }

    let multi = service
        .latest_many(&[empty.clone(), ticker("tcs")], &NoProgress)
        .unwrap();
    assert_eq!(multi.derived.len(), 1);
    assert_eq!(multi.failed.len(), 1);
    assert_eq!(multi.failed[0].0, empty);
}

#[test]
fn zero_open_aborts_report() {
    let p = provider();
    let service = QuoteService::new(&p, DisplayStyle::default());
    assert!(matches!(
        service.history(&ticker("zero"), Period::days(3)),
        Err(QuoteError::DivisionByZero(_))
    ));
    assert!(matches!(
        service.latest(&ticker("zero")),
        Err(QuoteError::DivisionByZero(_))
    ));
}

#[test]
fn latest_many_collects_rows_and_failures() {
    let p = provider();
    let service = QuoteService::new(&p, DisplayStyle::default());
    let symbols = vec![ticker("tcs"), ticker("missing"), ticker("itc")];
    let multi = service.latest_many(&symbols, &NoProgress).unwrap();

    assert_eq!(multi.derived.headers()[0], SYMBOL);
    assert_eq!(multi.derived.texts(SYMBOL).unwrap(), &["TCS.NS", "ITC.NS"]);
    assert_eq!(multi.derived.floats(CLOSE).unwrap(), &[4040.0, 300.0]);
    assert_eq!(multi.derived.floats(CHANGE_PERCENT).unwrap(), &[1.0, 0.0]);
    assert_eq!(multi.display.texts(CLOSE).unwrap(), &["₹4040.00", "₹300.00"]);

    assert_eq!(multi.failed.len(), 1);
    assert_eq!(multi.failed[0].0.as_str(), "MISSING.NS");
}

#[test]
fn latest_many_fails_when_nothing_fetched() {
    let p = provider();
    let service = QuoteService::new(&p, DisplayStyle::default());
    let err = service
        .latest_many(&[ticker("missing"), ticker("gone")], &NoProgress)
        .unwrap_err();
    assert!(err.is_upstream());
    assert!(matches!(
        service.latest_many(&[], &NoProgress),
        Err(QuoteError::InvalidInput(_))
    ));
}

proptest! {
    /// One output row per symbol the provider knows, regardless of order or repeats.
    #[test]
    fn latest_many_row_count_matches_known_symbols(
        picks in prop::collection::vec(prop::sample::select(vec!["itc", "tcs", "missing"]), 1..8)
    ) {
        let p = provider();
        let service = QuoteService::new(&p, DisplayStyle::default());
        let symbols: Vec<Ticker> = picks.iter().map(|s| ticker(s)).collect();
        let known = picks.iter().filter(|s| **s != "missing").count();

        match service.latest_many(&symbols, &NoProgress) {
            Ok(multi) => {
                prop_assert_eq!(multi.derived.len(), known);
                prop_assert_eq!(multi.failed.len(), picks.len() - known);
            }
            Err(e) => {
                prop_assert_eq!(known, 0);
                prop_assert!(e.is_upstream());
            }
        }
    }
}
