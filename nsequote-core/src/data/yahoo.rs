//! Yahoo Finance data provider.
//!
//! Fetches daily OHLCV rows from Yahoo's v8 chart API for NSE symbols.
//! Handles rate limiting, retries with exponential backoff, and response
//! parsing. Adjusted-close and corporate-action data are never requested.

use std::time::Duration;

use chrono::NaiveDate;
use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::provider::{prepare_rows, DataError, DataProvider, FetchRequest, FetchResult};
use crate::domain::PriceRow;
use crate::symbol::Ticker;

pub const DEFAULT_BASE_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart/";

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    /// Exchange offset from UTC in seconds (19800 for IST).
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

/// Transport settings for the Yahoo provider.
#[derive(Debug, Clone)]
pub struct YahooSettings {
    pub base_url: String,
    pub timeout: Duration,
    pub max_retries: u32,
    pub base_delay: Duration,
    pub user_agent: String,
}

impl Default for YahooSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".into(),
        }
    }
}

/// Yahoo Finance data provider.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
    base_url: Url,
    max_retries: u32,
    base_delay: Duration,
}

impl YahooProvider {
    pub fn new(settings: YahooSettings) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(settings.timeout)
            .user_agent(settings.user_agent)
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;
        let base_url = Url::parse(&settings.base_url)
            .map_err(|e| DataError::InvalidRequest(format!("bad base URL: {e}")))?;

        Ok(Self {
            client,
            base_url,
            max_retries: settings.max_retries,
            base_delay: settings.base_delay,
        })
    }

    /// Build the chart API URL for a symbol and date range.
    fn chart_url(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Url, DataError> {
        let start_ts = start.and_time(chrono::NaiveTime::MIN).and_utc().timestamp();
        // period2 is exclusive upstream
        let end_ts = (end + chrono::Days::new(1))
            .and_time(chrono::NaiveTime::MIN)
            .and_utc()
            .timestamp();

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| DataError::InvalidRequest("base URL cannot take a path".into()))?
            .pop_if_empty()
            .push(symbol);
        url.query_pairs_mut()
            .append_pair("period1", &start_ts.to_string())
            .append_pair("period2", &end_ts.to_string())
            .append_pair("interval", "1d")
            .append_pair("events", "history");
        Ok(url)
    }

    /// Execute the request with retry logic.
    fn fetch_with_retry(
        &self,
        symbol: &Ticker,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceRow>, DataError> {
        let url = self.chart_url(symbol.as_str(), start, end)?;
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = backoff_delay(self.base_delay, attempt);
                warn!(%symbol, attempt, ?delay, "retrying chart request");
                std::thread::sleep(delay);
            }
            debug!(%url, attempt, "requesting chart");

            let resp = match self.client.get(url.clone()).send() {
                Ok(resp) => resp,
                Err(e) if e.is_connect() || e.is_timeout() => {
                    last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                    continue;
                }
                Err(e) => return Err(DataError::NetworkUnreachable(e.to_string())),
            };

            let status = resp.status();

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                let retry_after = resp
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                last_error = Some(DataError::RateLimited {
                    retry_after_secs: retry_after,
                });
                continue;
            }

            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(DataError::SymbolNotFound {
                    symbol: symbol.to_string(),
                });
            }

            if status.is_server_error() {
                last_error = Some(DataError::Http {
                    status: status.as_u16(),
                    symbol: symbol.to_string(),
                });
                continue;
            }

            if !status.is_success() {
                return Err(DataError::Http {
                    status: status.as_u16(),
                    symbol: symbol.to_string(),
                });
            }

            let body = resp
                .text()
                .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?;
            return parse_chart(symbol.as_str(), &body);
        }

        Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
    }
}

/// Upper bound on a single backoff sleep.
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// `base * 2^(attempt-1)` for retry `attempt` (1-based), capped at
/// [`MAX_BACKOFF`].
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    if base.is_zero() {
        return Duration::ZERO;
    }
    2u32.checked_pow(attempt.saturating_sub(1))
        .and_then(|factor| base.checked_mul(factor))
        .map_or(MAX_BACKOFF, |delay| delay.min(MAX_BACKOFF))
}

/// Parse a chart API response body into rows, oldest first.
///
/// Timestamps are shifted by the exchange's UTC offset before taking the
/// date, so a session opening at 09:15 IST is dated by its local day.
fn parse_chart(symbol: &str, body: &str) -> Result<Vec<PriceRow>, DataError> {
    let resp: ChartResponse = serde_json::from_str(body).map_err(|e| {
        DataError::ResponseFormatChanged(format!("failed to parse response for {symbol}: {e}"))
    })?;

    let result = resp.chart.result.ok_or_else(|| match resp.chart.error {
        Some(err) if err.code == "Not Found" => DataError::SymbolNotFound {
            symbol: symbol.to_string(),
        },
        Some(err) => {
            DataError::ResponseFormatChanged(format!("{}: {}", err.code, err.description))
        }
        None => DataError::ResponseFormatChanged("empty result with no error".into()),
    })?;

    let data = result
        .into_iter()
        .next()
        .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))?;

    let offset = data.meta.and_then(|m| m.gmtoffset).unwrap_or(0);

    // A symbol with no sessions in the window comes back without timestamps.
    let Some(timestamps) = data.timestamp else {
        return Err(DataError::SymbolNotFound {
            symbol: symbol.to_string(),
        });
    };

    let quote = data
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| DataError::ResponseFormatChanged("no quote data".into()))?;

    let mut rows = Vec::with_capacity(timestamps.len());
    for (i, &ts) in timestamps.iter().enumerate() {
        let date = chrono::DateTime::from_timestamp(ts + offset, 0)
            .map(|dt| dt.naive_utc().date())
            .ok_or_else(|| DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}")))?;

        let open = quote.open.get(i).copied().flatten();
        let high = quote.high.get(i).copied().flatten();
        let low = quote.low.get(i).copied().flatten();
        let close = quote.close.get(i).copied().flatten();
        let volume = quote.volume.get(i).copied().flatten();

        // Holidays and halted sessions come back as all-null rows
        let (Some(open), Some(high), Some(low), Some(close)) = (open, high, low, close) else {
            continue;
        };

        rows.push(PriceRow {
            date,
            open,
            high,
            low,
            close,
            volume: volume.filter(|v| v.is_finite() && *v > 0.0).unwrap_or(0.0).round() as u64,
        });
    }

    if rows.is_empty() {
        return Err(DataError::SymbolNotFound {
            symbol: symbol.to_string(),
        });
    }
    Ok(rows)
}

impl DataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch(&self, symbol: &Ticker, request: &FetchRequest) -> Result<FetchResult, DataError> {
        let (start, end) = request.window(chrono::Local::now().date_naive());
        let raw = self.fetch_with_retry(symbol, start, end)?;
        let rows = prepare_rows(raw, request);
        if rows.is_empty() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        info!(%symbol, rows = rows.len(), request = %request.label(), "fetched quotes");
        Ok(FetchResult {
            symbol: symbol.clone(),
            rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::Normalizer;

    const BODY: &str = r#"{
        "chart": {
            "result": [{
                "meta": {"currency": "INR", "symbol": "ITC.NS", "gmtoffset": 19800},
                "timestamp": [1704167100, 1704253500, 1704339900],
                "indicators": {
                    "quote": [{
                        "open":   [460.0, null, 465.5],
                        "high":   [470.0, null, 468.0],
                        "low":    [455.0, null, 461.2],
                        "close":  [468.1, null, 462.0],
                        "volume": [12000000, null, 9500000]
                    }],
                    "adjclose": [{"adjclose": [468.1, null, 462.0]}]
                }
            }],
            "error": null
        }
    }"#;

    #[test]
    fn parses_rows_and_skips_null_sessions() {
        let rows = parse_chart("ITC.NS", BODY).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(rows[0].open, 460.0);
        assert_eq!(rows[0].volume, 12_000_000);
        assert_eq!(rows[1].date, NaiveDate::from_ymd_opt(2024, 1, 4).unwrap());
    }

    #[test]
    fn not_found_error_maps_to_symbol_not_found() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        assert!(matches!(
            parse_chart("NOPE.NS", body),
            Err(DataError::SymbolNotFound { symbol }) if symbol == "NOPE.NS"
        ));
    }

    #[test]
    fn missing_timestamps_is_symbol_not_found() {
        let body = r#"{"chart":{"result":[{"meta":{},"indicators":{"quote":[{}]}}],"error":null}}"#;
        assert!(matches!(
            parse_chart("ITC.NS", body),
            Err(DataError::SymbolNotFound { .. })
        ));
    }

    #[test]
    fn garbage_is_format_change() {
        assert!(matches!(
            parse_chart("ITC.NS", "<html>"),
            Err(DataError::ResponseFormatChanged(_))
        ));
    }

    #[test]
    fn backoff_doubles_then_caps_without_overflow() {
        let base = Duration::from_millis(500);
        assert_eq!(backoff_delay(base, 1), Duration::from_millis(500));
        assert_eq!(backoff_delay(base, 3), Duration::from_secs(2));
        assert_eq!(backoff_delay(base, 20), MAX_BACKOFF);
        assert_eq!(backoff_delay(base, 33), MAX_BACKOFF);
        assert_eq!(backoff_delay(base, u32::MAX), MAX_BACKOFF);
        assert_eq!(backoff_delay(Duration::ZERO, 40), Duration::ZERO);
    }

    #[test]
    fn chart_url_encodes_symbol_and_window() {
        let provider = YahooProvider::new(YahooSettings::default()).unwrap();
        let ticker = Ticker::parse("m&m", &Normalizer::nse()).unwrap();
        let url = provider
            .chart_url(
                ticker.as_str(),
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            )
            .unwrap();
        let text = url.as_str();
        assert!(text.starts_with("https://query2.finance.yahoo.com/v8/finance/chart/M&M.NS?"));
        assert!(text.contains("period1=1704067200"));
        assert!(text.contains("period2=1706745600"));
        assert!(text.contains("interval=1d"));
    }
}
