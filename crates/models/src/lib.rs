//! Regression models for next-day close prediction.
//!
//! This crate provides:
//! - [`Regressor`]: an untrained candidate: `fit(X, y) -> FittedModel`
//! - [`Predictor`]: a fitted model: `predict(features) -> price`
//! - [`FittedModel`]: the serializable union of every fitted model kind
//! - Six candidates (linear, lasso, ridge, SVR, decision tree, gradient boosting)
//! - [`RegressionMetrics`] for held-out evaluation
//!
//! # Architecture
//!
//! ```text
//! Trainer -> candidate.fit(X_train: Array2, y_train: Array1) -> FittedModel
//!   -> FittedModel.predict_batch(X_test) -> RegressionMetrics
//!   -> best FittedModel serialized as a JSON blob
//! Server  -> FittedModel from JSON blob -> predict(lag window)
//! ```
//!
//! Features are always one lag window per row, oldest price first.

mod candidates;
mod gradient_boosting;
mod linalg;
mod linear;
mod metrics;
mod svr;
mod tree;

use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

pub use candidates::{CANDIDATE_NAMES, default_candidates};
pub use gradient_boosting::{GradientBoostedModel, GradientBoosting};
pub use linear::{LassoRegression, LinearModel, LinearRegression, RidgeRegression};
pub use metrics::{RegressionMetrics, mean_squared_error, r2_score};
pub use svr::{SupportVectorRegression, SvrModel};
pub use tree::{DecisionTreeRegressor, RegressionTree, TreeNode};

// =============================================================================
// Errors
// =============================================================================

/// Reasons a candidate cannot be fitted.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FitError {
    /// No training rows.
    #[error("training set is empty")]
    EmptyTrainingSet,

    /// Feature rows and targets disagree in count.
    #[error("{rows} feature rows but {targets} targets")]
    LengthMismatch { rows: usize, targets: usize },

    /// Zero-width feature rows.
    #[error("feature rows are empty")]
    NoFeatures,

    /// NaN or infinite value in the inputs.
    #[error("training data contains non-finite values")]
    NonFiniteInput,

    /// The fitted parameters are not finite.
    #[error("fit diverged: {0}")]
    Diverged(String),
}

/// Reasons a fitted model cannot produce a prediction.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PredictError {
    /// Input width differs from the width the model was fitted on.
    #[error("expected {expected} features, got {got}")]
    ShapeMismatch { expected: usize, got: usize },

    /// The model produced NaN or infinity.
    #[error("prediction is not finite")]
    NonFinite,
}

// =============================================================================
// Traits
// =============================================================================

/// An untrained regression candidate.
///
/// Implementors must be `Send + Sync` so candidates can be fitted in parallel.
/// `fit` takes `&self`: a candidate is a recipe, and every call returns a
/// fresh [`FittedModel`].
pub trait Regressor: Send + Sync {
    /// Display name, used as the registry model name.
    fn name(&self) -> &str;

    /// Fit on feature rows `x` (one lag window per row) and targets `y`.
    fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<FittedModel, FitError>;
}

/// A fitted model that maps one feature row to a price.
pub trait Predictor: Send + Sync {
    /// Number of features expected per row.
    fn n_features(&self) -> usize;

    /// Raw prediction for a row whose width is already checked.
    fn predict_unchecked(&self, features: ArrayView1<f64>) -> f64;

    /// Predict one row, checking width and finiteness.
    fn predict(&self, features: &[f64]) -> Result<f64, PredictError> {
        self.predict_row(ArrayView1::from(features))
    }

    /// Predict one row of a feature matrix, checking width and finiteness.
    fn predict_row(&self, features: ArrayView1<f64>) -> Result<f64, PredictError> {
        if features.len() != self.n_features() {
            return Err(PredictError::ShapeMismatch {
                expected: self.n_features(),
                got: features.len(),
            });
        }
        let value = self.predict_unchecked(features);
        if value.is_finite() {
            Ok(value)
        } else {
            Err(PredictError::NonFinite)
        }
    }

    /// Predict every row, failing on the first bad one.
    fn predict_batch(&self, x: &Array2<f64>) -> Result<Array1<f64>, PredictError> {
        x.rows().into_iter().map(|row| self.predict_row(row)).collect()
    }
}

// =============================================================================
// Fitted Model Union
// =============================================================================

/// Every fitted model kind, tagged by `model_type` when serialized.
///
/// # JSON Format
///
/// ```json
/// {
///   "model_type": "linear",
///   "n_features": 7,
///   "coefficients": [0.01, -0.02, 0.03, 0.0, 0.05, 0.1, 0.83],
///   "intercept": 0.42
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model_type", rename_all = "snake_case")]
pub enum FittedModel {
    /// Linear, ridge and lasso regression.
    Linear(LinearModel),
    /// Kernel support vector regression.
    Svr(SvrModel),
    /// Single regression tree.
    DecisionTree(RegressionTree),
    /// Boosted ensemble of regression trees.
    GradientBoosting(GradientBoostedModel),
}

impl FittedModel {
    /// Short kind label (`linear`, `svr`, `decision_tree`, `gradient_boosting`).
    pub fn kind(&self) -> &'static str {
        match self {
            FittedModel::Linear(_) => "linear",
            FittedModel::Svr(_) => "svr",
            FittedModel::DecisionTree(_) => "decision_tree",
            FittedModel::GradientBoosting(_) => "gradient_boosting",
        }
    }

    /// Parse and validate a model from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, String> {
        let model: FittedModel =
            serde_json::from_str(json).map_err(|e| format!("JSON parse error: {}", e))?;
        model.validate()?;
        Ok(model)
    }

    /// Serialize to pretty JSON.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Check internal consistency of a deserialized model.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            FittedModel::Linear(m) => m.validate(),
            FittedModel::Svr(m) => m.validate(),
            FittedModel::DecisionTree(m) => m.validate(),
            FittedModel::GradientBoosting(m) => m.validate(),
        }
    }

    fn as_predictor(&self) -> &dyn Predictor {
        match self {
            FittedModel::Linear(m) => m,
            FittedModel::Svr(m) => m,
            FittedModel::DecisionTree(m) => m,
            FittedModel::GradientBoosting(m) => m,
        }
    }
}

impl Predictor for FittedModel {
    fn n_features(&self) -> usize {
        self.as_predictor().n_features()
    }

    fn predict_unchecked(&self, features: ArrayView1<f64>) -> f64 {
        self.as_predictor().predict_unchecked(features)
    }
}

// =============================================================================
// Shared Validation
// =============================================================================

/// Validate a training set and return its feature width.
pub(crate) fn validate_training_set(x: &Array2<f64>, y: &Array1<f64>) -> Result<usize, FitError> {
    if x.nrows() == 0 {
        return Err(FitError::EmptyTrainingSet);
    }
    if x.nrows() != y.len() {
        return Err(FitError::LengthMismatch {
            rows: x.nrows(),
            targets: y.len(),
        });
    }
    if x.ncols() == 0 {
        return Err(FitError::NoFeatures);
    }
    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return Err(FitError::NonFiniteInput);
    }
    Ok(x.ncols())
}

/// Arithmetic mean; 0.0 for an empty slice.
#[inline]
pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::s;

    fn line_data() -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((20, 2), |(i, j)| (i as f64).powi(j as i32 + 1));
        let y = x.rows().into_iter().map(|r| 3.0 + 2.0 * r[0] - 0.5 * r[1]).collect();
        (x, y)
    }

    #[test]
    fn test_validate_training_set() {
        let (x, y) = line_data();
        assert_eq!(validate_training_set(&x, &y), Ok(2));
        assert_eq!(
            validate_training_set(&Array2::zeros((0, 2)), &Array1::zeros(0)),
            Err(FitError::EmptyTrainingSet)
        );
        assert_eq!(
            validate_training_set(&x, &y.slice(s![..5]).to_owned()),
            Err(FitError::LengthMismatch {
                rows: 20,
                targets: 5
            })
        );
        assert_eq!(
            validate_training_set(&Array2::zeros((3, 0)), &Array1::zeros(3)),
            Err(FitError::NoFeatures)
        );

        let mut nan = x.clone();
        nan[[0, 0]] = f64::NAN;
        assert_eq!(
            validate_training_set(&nan, &y),
            Err(FitError::NonFiniteInput)
        );
    }

    #[test]
    fn test_fitted_model_json_is_tagged() {
        let (x, y) = line_data();
        let model = LinearRegression::default().fit(&x, &y).unwrap();
        let json = model.to_json_string().unwrap();
        assert!(json.contains("\"model_type\": \"linear\""));

        let back = FittedModel::from_json_str(&json).unwrap();
        assert_eq!(back.kind(), "linear");
        assert_eq!(back.n_features(), 2);
        let row = [4.0, 16.0];
        assert_eq!(back.predict(&row).unwrap(), model.predict(&row).unwrap());
    }

    #[test]
    fn test_predict_checks_width() {
        let (x, y) = line_data();
        let model = LinearRegression::default().fit(&x, &y).unwrap();
        assert_eq!(
            model.predict(&[1.0]),
            Err(PredictError::ShapeMismatch {
                expected: 2,
                got: 1
            })
        );
    }

    #[test]
    fn test_predict_batch_matches_rows() {
        let (x, y) = line_data();
        let model = LinearRegression::default().fit(&x, &y).unwrap();
        let batch = model.predict_batch(&x).unwrap();
        assert_eq!(batch.len(), 20);
        for (row, pred) in x.rows().into_iter().zip(batch.iter()) {
            assert_eq!(model.predict_row(row).unwrap(), *pred);
        }

        let narrow = Array2::from_elem((2, 1), 1.0);
        assert!(model.predict_batch(&narrow).is_err());
        assert_eq!(model.predict(&[4.0, 16.0]).unwrap(), batch[4]);
    }

    #[test]
    fn test_unknown_model_type_rejected() {
        let json = r#"{"model_type": "random_forest", "n_features": 7}"#;
        let err = FittedModel::from_json_str(json).unwrap_err();
        assert!(err.contains("JSON parse error"));
    }

    #[test]
    fn test_invalid_blob_rejected() {
        let json = r#"{"model_type": "linear", "n_features": 3, "coefficients": [1.0], "intercept": 0.0}"#;
        let err = FittedModel::from_json_str(json).unwrap_err();
        assert!(err.contains("coefficients"));
    }
}
