//! Single-window next-day predictions.

use std::sync::Arc;

use features::FeatureError;
use models::Predictor;
use serde::Serialize;
use tracing::error;

use crate::ModelRegistry;

/// A prediction and the model that made it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub predicted_price: f64,
    pub model_name: String,
}

/// Reasons a prediction request fails.
///
/// Every variant except [`InferenceError::Internal`] is the caller's fault.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InferenceError {
    /// No model is registered for the ticker.
    #[error("No model loaded for ticker: {0}")]
    UnknownTicker(String),

    /// The request does not hold exactly one window of prices.
    #[error("Prediction requires exactly {expected} days of recent_data, got {got}.")]
    WrongLength { expected: usize, got: usize },

    /// A price is NaN or infinite.
    #[error("recent_data[{index}] is not a finite number.")]
    InvalidPrice { index: usize },

    /// The model could not produce a price. Details are logged, not returned.
    #[error("An internal server error occurred.")]
    Internal(String),
}

impl InferenceError {
    /// True for errors caused by the request rather than the server.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, InferenceError::Internal(_))
    }
}

impl From<FeatureError> for InferenceError {
    fn from(err: FeatureError) -> Self {
        match err {
            FeatureError::WrongLength { expected, got } => {
                InferenceError::WrongLength { expected, got }
            }
            FeatureError::NonFinite { index } => InferenceError::InvalidPrice { index },
        }
    }
}

/// Read-only prediction front over a shared registry.
#[derive(Debug, Clone)]
pub struct InferenceService {
    registry: Arc<ModelRegistry>,
}

impl InferenceService {
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self { registry }
    }

    /// The registry predictions are served from.
    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Predict the next close for `ticker` from its most recent closes,
    /// ordered oldest to newest.
    pub fn predict(&self, ticker: &str, recent_prices: &[f64]) -> Result<Prediction, InferenceError> {
        let entry = self
            .registry
            .get(ticker)
            .ok_or_else(|| InferenceError::UnknownTicker(ticker.to_string()))?;

        let window = features::lag_vector(recent_prices, entry.model.n_features())?;

        let predicted_price = entry.model.predict(window.as_slice()).map_err(|e| {
            error!(ticker, model = %entry.model_name, error = %e, "prediction failed");
            InferenceError::Internal(e.to_string())
        })?;

        Ok(Prediction {
            predicted_price,
            model_name: entry.model_name.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RegistryEntry;
    use models::{FittedModel, LinearModel};
    use types::{LAG_DAYS, ModelMetrics};

    /// Linear model that returns its newest input.
    fn newest_only() -> FittedModel {
        let mut coefficients = vec![0.0; LAG_DAYS];
        coefficients[LAG_DAYS - 1] = 1.0;
        FittedModel::Linear(LinearModel {
            n_features: LAG_DAYS,
            coefficients,
            intercept: 0.0,
        })
    }

    fn service() -> InferenceService {
        let entry = RegistryEntry {
            ticker: "GOOGL".into(),
            model_name: "Linear Regression".into(),
            metrics: ModelMetrics { mse: 1.0, r2: 0.9 },
            filename: "models/GOOGL_best_model.json".into(),
            model: newest_only(),
        };
        InferenceService::new(Arc::new(ModelRegistry::from_entries([entry])))
    }

    #[test]
    fn test_prediction_uses_newest_last_ordering() {
        let prices = [10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.5];
        let prediction = service().predict("GOOGL", &prices).unwrap();
        assert_eq!(prediction.predicted_price, 16.5);
        assert_eq!(prediction.model_name, "Linear Regression");
    }

    #[test]
    fn test_unknown_ticker() {
        let err = service().predict("AAPL", &[1.0; 7]).unwrap_err();
        assert_eq!(err, InferenceError::UnknownTicker("AAPL".into()));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_six_prices_cite_expected_seven() {
        let err = service().predict("GOOGL", &[1.0; 6]).unwrap_err();
        assert_eq!(err, InferenceError::WrongLength { expected: 7, got: 6 });
        assert!(err.to_string().contains("exactly 7"));
    }

    #[test]
    fn test_non_finite_price() {
        let mut prices = [1.0; 7];
        prices[3] = f64::NAN;
        let err = service().predict("GOOGL", &prices).unwrap_err();
        assert_eq!(err, InferenceError::InvalidPrice { index: 3 });
    }

    #[test]
    fn test_overflowing_prediction_is_internal() {
        let entry = RegistryEntry {
            ticker: "BIG".into(),
            model_name: "Linear Regression".into(),
            metrics: ModelMetrics { mse: 1.0, r2: 0.9 },
            filename: String::new(),
            model: FittedModel::Linear(LinearModel {
                n_features: LAG_DAYS,
                coefficients: vec![1.0; LAG_DAYS],
                intercept: 0.0,
            }),
        };
        let service = InferenceService::new(Arc::new(ModelRegistry::from_entries([entry])));
        let err = service.predict("BIG", &[f64::MAX; 7]).unwrap_err();
        assert!(matches!(err, InferenceError::Internal(_)));
        assert!(!err.is_client_error());
        assert_eq!(err.to_string(), "An internal server error occurred.");
    }
}
