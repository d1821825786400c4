//! Persisted record shapes.

use std::collections::BTreeMap;

use models::FittedModel;
use serde::{Deserialize, Serialize};
use types::{ModelMetrics, Ticker};

/// Summary of the winning candidate for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestModelRecord {
    /// Candidate display name.
    pub name: String,
    pub mse: f64,
    pub r2: f64,
    /// Path of the model blob, as written by training.
    pub filename: String,
}

/// Everything recorded for one ticker.
///
/// # JSON Format
///
/// ```json
/// {
///   "candidates": {
///     "Linear Regression": { "mse": 4.21, "r2": 0.93 },
///     "Decision Tree": { "mse": 9.87, "r2": 0.84 }
///   },
///   "best_model": {
///     "name": "Linear Regression",
///     "mse": 4.21,
///     "r2": 0.93,
///     "filename": "models/GOOGL_best_model.json"
///   }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickerRecord {
    /// Metrics of every candidate that fitted.
    #[serde(default)]
    pub candidates: BTreeMap<String, ModelMetrics>,
    /// Winner, if any candidate fitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_model: Option<BestModelRecord>,
}

/// The whole performance file: ticker -> record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PerformanceRecord {
    pub tickers: BTreeMap<Ticker, TickerRecord>,
}

impl PerformanceRecord {
    /// Record for one ticker.
    pub fn get(&self, ticker: &str) -> Option<&TickerRecord> {
        self.tickers.get(ticker)
    }

    /// Number of tickers recorded.
    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    /// True when no ticker is recorded.
    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }
}

/// One persisted model file.
///
/// # JSON Format
///
/// ```json
/// {
///   "model_name": "Linear Regression",
///   "n_features": 7,
///   "model": { "model_type": "linear", "n_features": 7, ... }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelBlob {
    /// Candidate display name.
    pub model_name: String,
    /// Input width the model was fitted on.
    pub n_features: usize,
    /// Fitted model, tagged by `model_type`.
    pub model: FittedModel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_named_best_model_is_unambiguous() {
        let json = r#"{
            "ODD": {
                "candidates": {
                    "best_model": { "mse": 1.0, "r2": 0.5 },
                    "Ridge Regression": { "mse": 2.0, "r2": 0.4 }
                },
                "best_model": {
                    "name": "best_model",
                    "mse": 1.0,
                    "r2": 0.5,
                    "filename": "models/ODD_best_model.json"
                }
            }
        }"#;
        let record: PerformanceRecord = serde_json::from_str(json).unwrap();
        let odd = record.get("ODD").unwrap();
        assert_eq!(odd.candidates.len(), 2);
        assert_eq!(odd.best_model.as_ref().unwrap().name, "best_model");
    }

    #[test]
    fn test_ticker_without_winner_omits_field() {
        let mut record = PerformanceRecord::default();
        record
            .tickers
            .insert("NONE".into(), TickerRecord::default());
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"NONE":{"candidates":{}}}"#);
    }
}
