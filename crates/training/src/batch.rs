//! Batch training over a ticker catalogue.

use market_data::PriceSource;
use models::Regressor;
use tracing::{info, warn};
use types::Ticker;

use crate::{TrainerConfig, TrainingOutcome, train_ticker};

/// One catalogue entry: a human-readable name and its exchange symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickerSpec {
    /// Display name (e.g. "Reliance Industries").
    pub name: String,
    /// Symbol passed to the price source (e.g. "RELIANCE.NS").
    pub symbol: Ticker,
}

impl TickerSpec {
    pub fn new(name: impl Into<String>, symbol: impl Into<Ticker>) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
        }
    }

    /// Spec whose display name is the symbol itself.
    pub fn from_symbol(symbol: impl Into<Ticker>) -> Self {
        let symbol = symbol.into();
        Self {
            name: symbol.clone(),
            symbol,
        }
    }
}

/// A ticker that produced no model, and why.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedTicker {
    pub ticker: Ticker,
    pub reason: String,
}

/// Outcomes of a batch run, in catalogue order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    /// Tickers with a selected model.
    pub outcomes: Vec<TrainingOutcome>,
    /// Tickers that were fetched or trained unsuccessfully.
    pub skipped: Vec<SkippedTicker>,
}

impl BatchReport {
    /// True when no ticker produced a model.
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

/// Train every ticker in `catalogue`, one after another.
///
/// Fetch failures, empty histories and training errors skip the ticker and
/// the run continues.
pub fn train_all(
    catalogue: &[TickerSpec],
    source: &dyn PriceSource,
    candidates: &[Box<dyn Regressor>],
    config: &TrainerConfig,
) -> BatchReport {
    let mut report = BatchReport::default();

    for spec in catalogue {
        let ticker = spec.symbol.as_str();
        info!(ticker, name = %spec.name, "training models");

        let history = match source.fetch(ticker, &config.period, &config.interval) {
            Ok(history) => history,
            Err(e) => {
                warn!(ticker, error = %e, "could not download data, skipping");
                report.skipped.push(SkippedTicker {
                    ticker: spec.symbol.clone(),
                    reason: e.to_string(),
                });
                continue;
            }
        };

        match train_ticker(ticker, &history, candidates, config) {
            Ok(outcome) => {
                info!(
                    ticker,
                    model = %outcome.best.name,
                    mse = outcome.best.metrics.mse,
                    "best model selected"
                );
                report.outcomes.push(outcome);
            }
            Err(e) => {
                warn!(ticker, error = %e, "skipping ticker");
                report.skipped.push(SkippedTicker {
                    ticker: spec.symbol.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    info!(
        trained = report.outcomes.len(),
        skipped = report.skipped.len(),
        "training complete"
    );
    report
}
