//! Core types for the stock predictor.
//!
//! This crate provides the shared data types used across the workspace:
//! daily price bars, validated price series, lag vectors and the supervised
//! training table built from them.

use chrono::NaiveDate;
use ndarray::{Array1, Array2, ErrorKind, ShapeError};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Constants
// =============================================================================

/// Number of past closing prices in one feature window.
///
/// Trained models expect exactly this many inputs, oldest first.
pub const LAG_DAYS: usize = 7;

// =============================================================================
// Ticker Type
// =============================================================================

/// Stock ticker symbol (e.g., "GOOGL", "RELIANCE.NS").
pub type Ticker = String;

// =============================================================================
// Price Data
// =============================================================================

/// One daily OHLC row.
///
/// Every price is optional because upstream rows can arrive with null
/// fields. A bar with a missing close never contributes to a training window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    /// Trading date.
    pub date: NaiveDate,
    /// Opening price.
    pub open: Option<f64>,
    /// Highest price.
    pub high: Option<f64>,
    /// Lowest price.
    pub low: Option<f64>,
    /// Closing price.
    pub close: Option<f64>,
}

impl PriceBar {
    /// Create a fully populated bar.
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            date,
            open: Some(open),
            high: Some(high),
            low: Some(low),
            close: Some(close),
        }
    }

    /// Create a bar whose open, high, low and close all equal `close`.
    pub fn flat(date: NaiveDate, close: f64) -> Self {
        Self::new(date, close, close, close, close)
    }

    /// Create a bar with no closing price.
    pub fn missing_close(date: NaiveDate) -> Self {
        Self {
            date,
            open: None,
            high: None,
            low: None,
            close: None,
        }
    }

    /// Closing price if present and finite.
    #[inline]
    pub fn usable_close(&self) -> Option<f64> {
        self.close.filter(|c| c.is_finite())
    }
}

/// Reasons a sequence of bars cannot form a [`PriceSeries`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SeriesError {
    /// A bar is dated before the one preceding it.
    #[error("bars out of order: {later} comes after {earlier}")]
    OutOfOrder { earlier: NaiveDate, later: NaiveDate },

    /// Two bars share a date.
    #[error("duplicate bar for {0}")]
    DuplicateDate(NaiveDate),
}

/// Daily bars ordered strictly by date.
///
/// Only constructible through [`PriceSeries::new`], which enforces the
/// ordering, so downstream code may rely on index order being time order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PriceSeries {
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Validate and wrap a list of bars.
    pub fn new(bars: Vec<PriceBar>) -> Result<Self, SeriesError> {
        for pair in bars.windows(2) {
            let (prev, next) = (pair[0].date, pair[1].date);
            if next == prev {
                return Err(SeriesError::DuplicateDate(next));
            }
            if next < prev {
                return Err(SeriesError::OutOfOrder {
                    earlier: prev,
                    later: next,
                });
            }
        }
        Ok(Self { bars })
    }

    /// Build a series of flat bars on consecutive calendar days.
    pub fn from_closes(start: NaiveDate, closes: &[f64]) -> Self {
        let bars = start
            .iter_days()
            .zip(closes)
            .map(|(date, &close)| PriceBar::flat(date, close))
            .collect();
        Self { bars }
    }

    /// All bars, oldest first.
    #[inline]
    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    /// Number of bars.
    #[inline]
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// True when the series holds no bars.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Date of the oldest bar.
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    /// Date of the newest bar.
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }

    /// Iterate over bars, oldest first.
    pub fn iter(&self) -> std::slice::Iter<'_, PriceBar> {
        self.bars.iter()
    }
}

impl<'a> IntoIterator for &'a PriceSeries {
    type Item = &'a PriceBar;
    type IntoIter = std::slice::Iter<'a, PriceBar>;

    fn into_iter(self) -> Self::IntoIter {
        self.bars.iter()
    }
}

// =============================================================================
// Supervised Learning Types
// =============================================================================

/// Closing prices of one feature window, oldest first and newest last.
///
/// Training and inference must agree on this ordering; a model fed the
/// reverse order still produces a number, just a wrong one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LagVector(Vec<f64>);

impl LagVector {
    /// Wrap prices that are already ordered oldest to newest.
    pub fn from_oldest_first(prices: Vec<f64>) -> Self {
        Self(prices)
    }

    /// Prices, oldest first.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Window width.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for a zero-width window.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Oldest price in the window.
    pub fn oldest(&self) -> Option<f64> {
        self.0.first().copied()
    }

    /// Most recent price in the window.
    pub fn newest(&self) -> Option<f64> {
        self.0.last().copied()
    }
}

impl AsRef<[f64]> for LagVector {
    fn as_ref(&self) -> &[f64] {
        &self.0
    }
}

/// One supervised example: a lag window and the close that followed it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingExample {
    /// Feature window.
    pub features: LagVector,
    /// Close on the row right after the newest feature.
    pub target: f64,
    /// Date of the newest feature row.
    pub newest_feature_date: NaiveDate,
    /// Date of the target row.
    pub target_date: NaiveDate,
}

/// Chronologically ordered training examples sharing one window width.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TrainingTable {
    lag: usize,
    examples: Vec<TrainingExample>,
}

impl TrainingTable {
    /// Create a table. Examples must already be in chronological order.
    pub fn new(lag: usize, examples: Vec<TrainingExample>) -> Self {
        Self { lag, examples }
    }

    /// Empty table for the given window width.
    pub fn empty(lag: usize) -> Self {
        Self::new(lag, Vec::new())
    }

    /// Window width of every example.
    #[inline]
    pub fn lag(&self) -> usize {
        self.lag
    }

    /// Examples, oldest target first.
    #[inline]
    pub fn examples(&self) -> &[TrainingExample] {
        &self.examples
    }

    /// Number of examples.
    #[inline]
    pub fn len(&self) -> usize {
        self.examples.len()
    }

    /// True when no example could be built.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    /// Split at `mid`: examples `[0, mid)` and `[mid, len)`.
    ///
    /// `mid` is clamped to the table length.
    pub fn split_at(&self, mid: usize) -> (TrainingTable, TrainingTable) {
        let mid = mid.min(self.examples.len());
        let (head, tail) = self.examples.split_at(mid);
        (
            TrainingTable::new(self.lag, head.to_vec()),
            TrainingTable::new(self.lag, tail.to_vec()),
        )
    }

    /// Feature matrix (one window per row) and target vector, in table order.
    ///
    /// Fails when an example's window is not `lag` wide.
    pub fn to_xy(&self) -> Result<(Array2<f64>, Array1<f64>), ShapeError> {
        if self.examples.iter().any(|e| e.features.len() != self.lag) {
            return Err(ShapeError::from_kind(ErrorKind::IncompatibleShape));
        }
        let flat: Vec<f64> = self
            .examples
            .iter()
            .flat_map(|e| e.features.as_slice().iter().copied())
            .collect();
        let x = Array2::from_shape_vec((self.examples.len(), self.lag), flat)?;
        let y = self.examples.iter().map(|e| e.target).collect();
        Ok((x, y))
    }
}

// =============================================================================
// Metrics
// =============================================================================

/// Held-out error metrics for one fitted model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    /// Mean squared error.
    pub mse: f64,
    /// Coefficient of determination.
    pub r2: f64,
}

impl fmt::Display for ModelMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MSE={:.4}, R2={:.4}", self.mse, self.r2)
    }
}
