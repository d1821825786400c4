//! Price source backed by series held in memory.

use std::collections::HashMap;

use types::PriceSeries;

use crate::{FetchError, PriceSource, validate_period};

/// Serves pre-built series by ticker, ignoring period and interval.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    series: HashMap<String, PriceSeries>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a series for `ticker`, replacing any previous one.
    pub fn with_series(mut self, ticker: impl Into<String>, series: PriceSeries) -> Self {
        self.series.insert(ticker.into(), series);
        self
    }
}

impl PriceSource for InMemorySource {
    fn fetch(
        &self,
        ticker: &str,
        period: &str,
        _interval: &str,
    ) -> Result<PriceSeries, FetchError> {
        validate_period(period)?;
        match self.series.get(ticker) {
            Some(series) if !series.is_empty() => Ok(series.clone()),
            _ => Err(FetchError::NoData),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_fetch_registered_and_missing() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let source = InMemorySource::new()
            .with_series("GOOGL", PriceSeries::from_closes(start, &[1.0, 2.0]))
            .with_series("EMPTY", PriceSeries::default());

        assert_eq!(source.fetch("GOOGL", "1mo", "1d").unwrap().len(), 2);
        assert!(matches!(
            source.fetch("EMPTY", "1mo", "1d"),
            Err(FetchError::NoData)
        ));
        assert!(matches!(
            source.fetch("TSLA", "1mo", "1d"),
            Err(FetchError::NoData)
        ));
    }
}
