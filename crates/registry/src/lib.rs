//! Best-model registry and inference.
//!
//! The [`ModelRegistry`] maps each ticker to the model selected by training,
//! together with its display name and held-out metrics. It is written once by
//! a training run ([`save`]) and read once at service start
//! ([`ModelRegistry::load`]); after that it is immutable.
//!
//! # On-disk Layout
//!
//! ```text
//! model_performance.json          PerformanceRecord (all tickers)
//! models/GOOGL_best_model.json    ModelBlob for one ticker
//! models/NVDA_best_model.json
//! ...
//! ```
//!
//! # Usage
//!
//! ```ignore
//! let registry = Arc::new(ModelRegistry::load("model_performance.json")?);
//! let service = InferenceService::new(registry);
//! let prediction = service.predict("GOOGL", &last_seven_closes)?;
//! ```

mod inference;
mod record;
mod store;

use std::path::PathBuf;

pub use inference::{InferenceError, InferenceService, Prediction};
pub use record::{BestModelRecord, ModelBlob, PerformanceRecord, TickerRecord};
pub use store::{ModelRegistry, RegistryEntry, blob_filename, save};

/// Errors raised while reading or writing the registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// A file could not be read or written.
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A file is not valid JSON for its expected shape.
    #[error("{}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// A blob parsed but describes an inconsistent model.
    #[error("{}: invalid model: {reason}", path.display())]
    InvalidModel { path: PathBuf, reason: String },

    /// Two tickers map to the same blob file.
    #[error("{first} and {second} would both be saved to {}", path.display())]
    FilenameCollision {
        path: PathBuf,
        first: String,
        second: String,
    },

    /// A model's input width differs from the lag window width.
    #[error("{ticker}: model expects {got} inputs, expected {expected}")]
    ArityMismatch {
        ticker: String,
        expected: usize,
        got: usize,
    },
}
