//! Candidate training and model selection.
//!
//! # Architecture
//!
//! ```text
//! PriceSeries
//!   -> features::build           (lag windows + next-day targets)
//!   -> features::chronological_split (leading train / trailing eval)
//!   -> every candidate: fit -> predict eval -> MSE, R²   (parallel::map_slice)
//!   -> select_best               (min MSE, earliest candidate on ties)
//!   -> TrainingOutcome { best, report }
//! ```
//!
//! [`train_all`] drives this over a ticker catalogue, fetching each history
//! from a [`PriceSource`](market_data::PriceSource) and skipping tickers that
//! cannot be trained.

mod batch;
mod trainer;

pub use batch::{BatchReport, SkippedTicker, TickerSpec, train_all};
pub use trainer::{select_best, train_ticker};

use models::FittedModel;
use types::{LAG_DAYS, ModelMetrics, Ticker};

// =============================================================================
// Configuration
// =============================================================================

/// Knobs for one training run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainerConfig {
    /// Feature window width.
    pub lag: usize,
    /// Share of examples held out for evaluation, taken from the end.
    pub test_fraction: f64,
    /// History range requested from the price source.
    pub period: String,
    /// Bar interval requested from the price source.
    pub interval: String,
    /// Fit candidates one at a time even in a parallel build.
    pub force_sequential: bool,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            lag: LAG_DAYS,
            test_fraction: 0.2,
            period: "18mo".into(),
            interval: "1d".into(),
            force_sequential: false,
        }
    }
}

// =============================================================================
// Outcomes
// =============================================================================

/// A candidate that fitted and was scored on the evaluation split.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateResult {
    /// Candidate display name.
    pub name: String,
    /// Fitted predictor.
    pub model: FittedModel,
    /// Held-out metrics.
    pub metrics: ModelMetrics,
}

/// Per-candidate line of the training report.
#[derive(Debug, Clone, PartialEq)]
pub enum CandidateOutcome {
    Fitted { name: String, metrics: ModelMetrics },
    Failed { name: String, reason: String },
}

impl CandidateOutcome {
    /// Candidate display name.
    pub fn name(&self) -> &str {
        match self {
            CandidateOutcome::Fitted { name, .. } | CandidateOutcome::Failed { name, .. } => name,
        }
    }

    /// Held-out metrics, if the candidate fitted.
    pub fn metrics(&self) -> Option<ModelMetrics> {
        match self {
            CandidateOutcome::Fitted { metrics, .. } => Some(*metrics),
            CandidateOutcome::Failed { .. } => None,
        }
    }
}

/// Result of training one ticker.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingOutcome {
    pub ticker: Ticker,
    /// Winning candidate.
    pub best: CandidateResult,
    /// Every candidate in declared order, fitted or failed.
    pub report: Vec<CandidateOutcome>,
    /// Examples used for fitting.
    pub n_train: usize,
    /// Examples used for evaluation.
    pub n_test: usize,
}

// =============================================================================
// Errors
// =============================================================================

/// Reasons a ticker produces no model.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TrainingError {
    /// Too few examples to fit and evaluate.
    #[error("insufficient data for {ticker}: {examples} examples")]
    InsufficientData { ticker: Ticker, examples: usize },

    /// The feature table could not be laid out as a matrix.
    #[error("invalid feature table for {ticker}: {reason}")]
    InvalidFeatures { ticker: Ticker, reason: String },

    /// Every candidate failed.
    #[error("no viable model for {ticker}: all {candidates} candidates failed")]
    NoViableModel { ticker: Ticker, candidates: usize },
}
