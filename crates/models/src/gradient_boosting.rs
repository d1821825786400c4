//! Gradient boosted regression trees.
//!
//! Squared-error boosting: each round fits a depth-limited [`RegressionTree`]
//! to the current residuals and adds it scaled by the learning rate.
//!
//! # JSON Format
//!
//! ```json
//! {
//!   "model_type": "gradient_boosting",
//!   "n_features": 7,
//!   "base_score": 151.7,
//!   "learning_rate": 0.3,
//!   "trees": [
//!     { "n_features": 7, "nodes": [...] },
//!     ...
//!   ]
//! }
//! ```
//!
//! # Prediction
//!
//! 1. Start from `base_score` (mean training target)
//! 2. For each tree, traverse and accumulate `learning_rate * leaf_value`

use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::tree::TreeParams;
use crate::{FitError, FittedModel, Predictor, Regressor, RegressionTree, validate_training_set};

/// Fitted boosted ensemble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostedModel {
    /// Number of features expected.
    pub n_features: usize,
    /// Initial prediction before any tree.
    pub base_score: f64,
    /// Shrinkage applied to every tree.
    pub learning_rate: f64,
    /// Boosting stages in fit order.
    pub trees: Vec<RegressionTree>,
}

impl GradientBoostedModel {
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.learning_rate <= 0.0 || self.learning_rate > 1.0 {
            return Err(format!(
                "Invalid learning_rate: {} (should be 0 < lr <= 1)",
                self.learning_rate
            ));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            if tree.n_features != self.n_features {
                return Err(format!(
                    "Tree {} has {} features, expected {}",
                    i, tree.n_features, self.n_features
                ));
            }
            tree.validate().map_err(|e| format!("Tree {}: {}", i, e))?;
        }
        Ok(())
    }

    /// Number of boosting stages.
    pub fn n_estimators(&self) -> usize {
        self.trees.len()
    }
}

impl Predictor for GradientBoostedModel {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_unchecked(&self, features: ArrayView1<f64>) -> f64 {
        self.trees.iter().fold(self.base_score, |score, tree| {
            score + self.learning_rate * tree.predict_unchecked(features)
        })
    }
}

/// Gradient boosting candidate.
#[derive(Debug, Clone)]
pub struct GradientBoosting {
    name: String,
    n_estimators: usize,
    learning_rate: f64,
    max_depth: usize,
}

impl GradientBoosting {
    /// Boosting with custom round count, shrinkage and tree depth.
    pub fn with_params(n_estimators: usize, learning_rate: f64, max_depth: usize) -> Self {
        Self {
            n_estimators,
            learning_rate,
            max_depth,
            ..Self::default()
        }
    }
}

impl Default for GradientBoosting {
    fn default() -> Self {
        Self {
            name: "Gradient Boosting".into(),
            n_estimators: 100,
            learning_rate: 0.3,
            max_depth: 6,
        }
    }
}

impl Regressor for GradientBoosting {
    fn name(&self) -> &str {
        &self.name
    }

    fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<FittedModel, FitError> {
        let width = validate_training_set(x, y)?;
        let params = TreeParams {
            max_depth: Some(self.max_depth),
            min_samples_split: 2,
        };

        let base_score = y.mean().ok_or(FitError::EmptyTrainingSet)?;
        let mut predictions = Array1::from_elem(y.len(), base_score);
        let mut trees = Vec::with_capacity(self.n_estimators);

        for _ in 0..self.n_estimators {
            let residuals = y - &predictions;
            let tree = RegressionTree::grow(x, &residuals, &params);
            for (pred, row) in predictions.iter_mut().zip(x.rows()) {
                *pred += self.learning_rate * tree.predict_unchecked(row);
            }
            let single_leaf = tree.n_leaves() == 1;
            trees.push(tree);
            // Residuals are constant; further rounds only add the same leaf.
            if single_leaf {
                break;
            }
        }

        if predictions.iter().any(|p| !p.is_finite()) {
            return Err(FitError::Diverged("non-finite boosted predictions".into()));
        }

        Ok(FittedModel::GradientBoosting(GradientBoostedModel {
            n_features: width,
            base_score,
            learning_rate: self.learning_rate,
            trees,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mean_squared_error;

    fn sample_model_json() -> &'static str {
        r#"{
            "model_type": "gradient_boosting",
            "n_features": 1,
            "base_score": 100.0,
            "learning_rate": 0.5,
            "trees": [
                {
                    "n_features": 1,
                    "nodes": [
                        {"feature": 0, "threshold": 50.0, "left": 1, "right": 2, "value": null},
                        {"feature": -1, "threshold": 0.0, "left": -1, "right": -1, "value": -4.0},
                        {"feature": -1, "threshold": 0.0, "left": -1, "right": -1, "value": 6.0}
                    ]
                },
                {
                    "n_features": 1,
                    "nodes": [
                        {"feature": -1, "threshold": 0.0, "left": -1, "right": -1, "value": 2.0}
                    ]
                }
            ]
        }"#
    }

    #[test]
    fn test_load_and_predict() {
        let model = FittedModel::from_json_str(sample_model_json()).unwrap();
        assert_eq!(model.kind(), "gradient_boosting");
        // 100 + 0.5 * -4 + 0.5 * 2
        assert_eq!(model.predict(&[30.0]).unwrap(), 99.0);
        // 100 + 0.5 * 6 + 0.5 * 2
        assert_eq!(model.predict(&[70.0]).unwrap(), 104.0);
    }

    #[test]
    fn test_invalid_learning_rate() {
        let json = sample_model_json().replace("\"learning_rate\": 0.5", "\"learning_rate\": 1.5");
        let err = FittedModel::from_json_str(&json).unwrap_err();
        assert!(err.contains("learning_rate"));
    }

    fn column(n: usize) -> Array2<f64> {
        Array2::from_shape_fn((n, 1), |(i, _)| i as f64)
    }

    #[test]
    fn test_boosting_beats_base_score() {
        let x = Array2::from_shape_fn((60, 2), |(i, j)| if j == 0 { i as f64 } else { (i % 7) as f64 });
        let y: Array1<f64> = x.rows().into_iter().map(|r| (r[0] / 8.0).sin() * 10.0 + r[1]).collect();

        let model = GradientBoosting::default().fit(&x, &y).unwrap();
        let preds = model.predict_batch(&x).unwrap();
        let baseline = Array1::from_elem(y.len(), y.mean().unwrap());

        assert!(mean_squared_error(&y, &preds) < 0.1 * mean_squared_error(&y, &baseline));
    }

    #[test]
    fn test_constant_target_stops_early() {
        let model = GradientBoosting::default()
            .fit(&column(10), &Array1::from_elem(10, 3.0))
            .unwrap();
        match model {
            FittedModel::GradientBoosting(ref m) => {
                assert_eq!(m.n_estimators(), 1);
                assert_eq!(m.base_score, 3.0);
            }
            other => panic!("expected gradient boosting, got {}", other.kind()),
        }
        assert_eq!(model.predict(&[42.0]).unwrap(), 3.0);
    }

    #[test]
    fn test_round_count_capped() {
        let y = Array1::from_iter((0..20).map(|i| (i * i) as f64));
        match GradientBoosting::with_params(5, 0.1, 2).fit(&column(20), &y).unwrap() {
            FittedModel::GradientBoosting(m) => assert_eq!(m.n_estimators(), 5),
            other => panic!("expected gradient boosting, got {}", other.kind()),
        }
    }
}
