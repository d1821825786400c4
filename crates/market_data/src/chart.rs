//! Column-oriented price history for the chart front-end.

use serde::{Deserialize, Serialize};
use types::PriceSeries;

/// One column per price field, aligned by index with `dates`.
///
/// # JSON Format
///
/// ```json
/// {
///   "dates": ["2024-01-02", "2024-01-03"],
///   "close_prices": [185.5, 186.5],
///   "open_prices": [185.0, 186.0],
///   "high_prices": [186.0, 187.0],
///   "low_prices": [184.0, 185.0]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    /// `YYYY-MM-DD` dates, oldest first.
    pub dates: Vec<String>,
    pub close_prices: Vec<f64>,
    pub open_prices: Vec<f64>,
    pub high_prices: Vec<f64>,
    pub low_prices: Vec<f64>,
}

impl ChartData {
    /// Flatten a series, dropping rows without a full set of finite prices.
    pub fn from_series(series: &PriceSeries) -> Self {
        let mut chart = Self::default();
        for bar in series {
            let (Some(open), Some(high), Some(low), Some(close)) =
                (bar.open, bar.high, bar.low, bar.usable_close())
            else {
                continue;
            };
            if ![open, high, low].iter().all(|v| v.is_finite()) {
                continue;
            }
            chart.dates.push(bar.date.format("%Y-%m-%d").to_string());
            chart.close_prices.push(close);
            chart.open_prices.push(open);
            chart.high_prices.push(high);
            chart.low_prices.push(low);
        }
        chart
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// True when no complete row survived.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}
