//! Yahoo Finance chart API client.
//!
//! Fetches daily bars from `GET {base}/v8/finance/chart/{ticker}` with a
//! relative `range` and an `interval`.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use types::{PriceBar, PriceSeries};

use crate::{FetchError, PriceSource, validate_period};

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Browser user agent; the chart API rejects requests without one.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

// =============================================================================
// Response Shape
// =============================================================================

#[derive(Debug, Deserialize)]
struct YahooResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartPayload>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartPayload {
    #[serde(default)]
    meta: Option<ChartMeta>,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    /// Exchange offset from UTC in seconds.
    #[serde(default)]
    gmtoffset: i64,
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
}

// =============================================================================
// Client
// =============================================================================

/// Yahoo Finance price source.
///
/// A blocking HTTP client is built per call, so the source itself is cheap
/// to clone and safe to hold inside async state.
#[derive(Debug, Clone)]
pub struct YahooSource {
    base_url: String,
    timeout: Duration,
}

impl Default for YahooSource {
    fn default() -> Self {
        Self::new()
    }
}

impl YahooSource {
    /// Client for the public endpoint with a 30 s request timeout.
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Point the client at another host (mirrors, local fixtures).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Override the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn chart_url(&self, ticker: &str) -> String {
        format!("{}/v8/finance/chart/{}", self.base_url, ticker)
    }

    /// Decode a chart API reply into a validated series.
    ///
    /// Null closes are kept as `None`. Rows sharing a date after the exchange
    /// offset is applied collapse to the last one.
    pub(crate) fn parse_response(json: &str) -> Result<PriceSeries, FetchError> {
        let response: YahooResponse =
            serde_json::from_str(json).map_err(|e| FetchError::Parse(e.to_string()))?;

        if let Some(err) = response.chart.error {
            return Err(FetchError::Api {
                code: err.code,
                description: err.description,
            });
        }

        let payload = response
            .chart
            .result
            .and_then(|results| results.into_iter().next())
            .ok_or(FetchError::NoData)?;

        if payload.timestamp.is_empty() {
            return Err(FetchError::NoData);
        }
        let quote = payload
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::Parse("missing quote indicators".into()))?;

        let n = payload.timestamp.len();
        for (column, len) in [
            ("open", quote.open.len()),
            ("high", quote.high.len()),
            ("low", quote.low.len()),
            ("close", quote.close.len()),
        ] {
            if len != n {
                return Err(FetchError::Parse(format!(
                    "{} has {} values for {} timestamps",
                    column, len, n
                )));
            }
        }

        let offset = payload.meta.map_or(0, |m| m.gmtoffset);
        let mut by_date: BTreeMap<NaiveDate, PriceBar> = BTreeMap::new();
        for (i, &ts) in payload.timestamp.iter().enumerate() {
            let date = ts
                .checked_add(offset)
                .and_then(|local| DateTime::from_timestamp(local, 0))
                .ok_or_else(|| FetchError::Parse(format!("timestamp {} out of range", ts)))?
                .date_naive();
            by_date.insert(
                date,
                PriceBar {
                    date,
                    open: quote.open[i],
                    high: quote.high[i],
                    low: quote.low[i],
                    close: quote.close[i],
                },
            );
        }

        Ok(PriceSeries::new(by_date.into_values().collect())?)
    }
}

impl PriceSource for YahooSource {
    fn fetch(
        &self,
        ticker: &str,
        period: &str,
        interval: &str,
    ) -> Result<PriceSeries, FetchError> {
        validate_period(period)?;

        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .build()?;

        tracing::debug!(ticker, period, interval, "fetching chart data");
        let body = client
            .get(self.chart_url(ticker))
            .query(&[("range", period), ("interval", interval)])
            .send()?
            .text()?;

        let series = Self::parse_response(&body)?;
        tracing::debug!(ticker, rows = series.len(), "chart data fetched");
        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2024-01-02 .. 2024-01-04 at 14:30 UTC (US market open)
    const US_RESPONSE: &str = r#"{"chart":{"result":[{"meta":{"gmtoffset":-18000},"timestamp":[1704205800,1704292200,1704378600],"indicators":{"quote":[{"open":[185.0,186.0,187.0],"high":[186.0,187.0,188.0],"low":[184.0,185.0,186.0],"close":[185.5,186.5,187.5],"volume":[1000000,1100000,1200000]}]}}],"error":null}}"#;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_parse_response_valid() {
        let series = YahooSource::parse_response(US_RESPONSE).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.first_date(), Some(day(2)));
        assert_eq!(series.last_date(), Some(day(4)));
        assert_eq!(series.bars()[0].close, Some(185.5));
        assert_eq!(series.bars()[2].high, Some(188.0));
    }

    #[test]
    fn test_parse_response_keeps_null_close() {
        let json = r#"{"chart":{"result":[{"timestamp":[1704205800,1704292200,1704378600],"indicators":{"quote":[{"open":[185.0,null,187.0],"high":[186.0,null,188.0],"low":[184.0,null,186.0],"close":[185.5,null,187.5]}]}}],"error":null}}"#;
        let series = YahooSource::parse_response(json).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.bars()[1].close, None);
        assert_eq!(series.bars()[1].date, day(3));
    }

    #[test]
    fn test_exchange_offset_moves_date() {
        // 2024-01-01 20:00 UTC is already 2024-01-02 in India (+05:30).
        let json = r#"{"chart":{"result":[{"meta":{"gmtoffset":19800},"timestamp":[1704139200],"indicators":{"quote":[{"open":[1.0],"high":[1.0],"low":[1.0],"close":[1.0]}]}}],"error":null}}"#;
        let series = YahooSource::parse_response(json).unwrap();
        assert_eq!(series.first_date(), Some(day(2)));
    }

    #[test]
    fn test_same_day_rows_keep_last() {
        // Two timestamps on 2024-01-02 UTC.
        let json = r#"{"chart":{"result":[{"timestamp":[1704205800,1704218400],"indicators":{"quote":[{"open":[1.0,2.0],"high":[1.0,2.0],"low":[1.0,2.0],"close":[1.0,2.0]}]}}],"error":null}}"#;
        let series = YahooSource::parse_response(json).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series.bars()[0].close, Some(2.0));
    }

    #[test]
    fn test_parse_response_api_error() {
        let json = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let err = YahooSource::parse_response(json).unwrap_err();
        assert!(matches!(err, FetchError::Api { .. }));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_parse_response_no_data() {
        let json = r#"{"chart":{"result":[],"error":null}}"#;
        assert!(matches!(
            YahooSource::parse_response(json),
            Err(FetchError::NoData)
        ));
    }

    #[test]
    fn test_parse_response_no_timestamps() {
        let json = r#"{"chart":{"result":[{"indicators":{"quote":[{}]}}],"error":null}}"#;
        assert!(matches!(
            YahooSource::parse_response(json),
            Err(FetchError::NoData)
        ));
    }

    #[test]
    fn test_parse_response_ragged_columns() {
        let json = r#"{"chart":{"result":[{"timestamp":[1704205800,1704292200],"indicators":{"quote":[{"open":[1.0,2.0],"high":[1.0,2.0],"low":[1.0,2.0],"close":[1.0]}]}}],"error":null}}"#;
        assert!(matches!(
            YahooSource::parse_response(json),
            Err(FetchError::Parse(_))
        ));
    }

    #[test]
    fn test_timestamp_overflow_is_parse_error() {
        let json = r#"{"chart":{"result":[{"meta":{"gmtoffset":19800},"timestamp":[9223372036854775000],"indicators":{"quote":[{"open":[1.0],"high":[1.0],"low":[1.0],"close":[1.0]}]}}],"error":null}}"#;
        let err = YahooSource::parse_response(json).unwrap_err();
        assert!(matches!(err, FetchError::Parse(ref msg) if msg.contains("out of range")));
    }

    #[test]
    fn test_parse_response_invalid_json() {
        assert!(matches!(
            YahooSource::parse_response("not json"),
            Err(FetchError::Parse(_))
        ));
    }

    #[test]
    fn test_chart_url() {
        let source = YahooSource::new().with_base_url("http://localhost:9000/");
        assert_eq!(
            source.chart_url("RELIANCE.NS"),
            "http://localhost:9000/v8/finance/chart/RELIANCE.NS"
        );
    }

    #[test]
    fn test_timeout_override() {
        assert_eq!(YahooSource::new().timeout, Duration::from_secs(30));
        let source = YahooSource::new().with_timeout(Duration::from_secs(5));
        assert_eq!(source.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_fetch_rejects_bad_period_before_network() {
        let source = YahooSource::new().with_base_url("http://127.0.0.1:1");
        assert!(matches!(
            source.fetch("GOOGL", "forever", "1d"),
            Err(FetchError::InvalidPeriod(_))
        ));
    }
}
