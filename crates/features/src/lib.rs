//! Feature construction for next-day close prediction.
//!
//! Turns a [`PriceSeries`](types::PriceSeries) into a
//! [`TrainingTable`](types::TrainingTable) of lag windows and next-day targets,
//! and owns the window ordering convention shared by training and inference.
//!
//! # Ordering
//!
//! Every feature vector in this workspace is ordered oldest to newest:
//!
//! ```text
//! closes:   c[t-lag] c[t-lag+1] ... c[t-1]  │  c[t]
//!           └──────── features ───────────┘   target
//! ```
//!
//! [`lag_vector`] is the single place that builds such a vector from raw
//! prices. [`build`] uses it for every window, and the inference path uses it
//! for request payloads.

mod builder;
mod split;

pub use builder::{build, lag_vector};
pub use split::chronological_split;

/// Errors raised when raw prices cannot form a feature vector.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FeatureError {
    /// Wrong number of prices for the window width.
    #[error("expected exactly {expected} prices, got {got}")]
    WrongLength { expected: usize, got: usize },

    /// A price is NaN or infinite.
    #[error("price at position {index} is not a finite number")]
    NonFinite { index: usize },
}
