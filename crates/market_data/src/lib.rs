//! Daily price history for training and charting.
//!
//! # Architecture
//!
//! ```text
//! Trainer / chart route
//!   -> PriceSource::fetch(ticker, period, interval)
//!        YahooSource     (HTTP, blocking reqwest)
//!        InMemorySource  (tests, offline runs)
//!   -> PriceSeries (validated, oldest first)
//!   -> ChartData (flattened columns for the front-end)
//! ```
//!
//! `fetch` is blocking. Async callers run it inside
//! `tokio::task::spawn_blocking`.

mod chart;
mod memory;
mod yahoo;

pub use chart::ChartData;
pub use memory::InMemorySource;
pub use yahoo::YahooSource;

use types::{PriceSeries, SeriesError};

/// Errors raised while fetching price history.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Transport failure or non-JSON reply.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The reply could not be decoded.
    #[error("parse error: {0}")]
    Parse(String),

    /// The provider answered with an error object.
    #[error("API error [{code}]: {description}")]
    Api { code: String, description: String },

    /// The provider returned no rows.
    #[error("no data returned")]
    NoData,

    /// The period string is not a range the provider understands.
    #[error("invalid period: {0}")]
    InvalidPeriod(String),

    /// Rows could not form a valid series.
    #[error(transparent)]
    InvalidSeries(#[from] SeriesError),
}

impl FetchError {
    /// True when the provider has nothing for this ticker and range.
    pub fn is_not_found(&self) -> bool {
        match self {
            FetchError::NoData => true,
            FetchError::Api { code, .. } => code.eq_ignore_ascii_case("not found"),
            _ => false,
        }
    }
}

/// A provider of daily price history.
pub trait PriceSource: Send + Sync {
    /// Fetch bars for `ticker` over a relative range such as `"18mo"`.
    ///
    /// An empty history is reported as [`FetchError::NoData`], never as an
    /// empty series.
    fn fetch(&self, ticker: &str, period: &str, interval: &str)
    -> Result<PriceSeries, FetchError>;
}

/// Check a relative range: `ytd`, `max`, or a count followed by `d`, `wk`,
/// `mo` or `y` (e.g. `5d`, `1mo`, `18mo`, `2y`).
pub fn validate_period(period: &str) -> Result<(), FetchError> {
    if period == "ytd" || period == "max" {
        return Ok(());
    }
    let split = period
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(period.len());
    let (count, unit) = period.split_at(split);
    let count_ok = count.parse::<u32>().is_ok_and(|n| n > 0);
    if count_ok && matches!(unit, "d" | "wk" | "mo" | "y") {
        Ok(())
    } else {
        Err(FetchError::InvalidPeriod(period.to_string()))
    }
}
