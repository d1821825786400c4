//! Linear regression models: ordinary least squares, ridge and lasso.
//!
//! All three fit `y = w·x + b` and differ only in the training objective, so
//! they share one fitted form, [`LinearModel`].
//!
//! # JSON Format
//!
//! ```json
//! {
//!   "model_type": "linear",
//!   "n_features": 7,
//!   "coefficients": [0.01, -0.02, 0.03, 0.0, 0.05, 0.1, 0.83],
//!   "intercept": 0.42
//! }
//! ```
//!
//! The intercept is always fitted by centering `X` and `y` first; penalties
//! apply to the coefficients only.

use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

use crate::linalg::{Centering, center, normal_equations, solve_normal_equations};
use crate::{FitError, FittedModel, Predictor, Regressor, validate_training_set};

/// Fitted linear model: `coefficients · x + intercept`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    /// Number of features expected.
    pub n_features: usize,
    /// One weight per feature, oldest lag first.
    pub coefficients: Vec<f64>,
    /// Bias term.
    pub intercept: f64,
}

impl LinearModel {
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.coefficients.len() != self.n_features {
            return Err(format!(
                "Linear model has {} coefficients, expected {}",
                self.coefficients.len(),
                self.n_features
            ));
        }
        Ok(())
    }

    fn from_centered(weights: Array1<f64>, c: &Centering) -> Result<Self, FitError> {
        let intercept = c.y_mean - weights.dot(&c.x_means);
        if !intercept.is_finite() || weights.iter().any(|w| !w.is_finite()) {
            return Err(FitError::Diverged("non-finite coefficients".into()));
        }
        Ok(Self {
            n_features: weights.len(),
            coefficients: weights.to_vec(),
            intercept,
        })
    }
}

impl Predictor for LinearModel {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_unchecked(&self, features: ArrayView1<f64>) -> f64 {
        ArrayView1::from(self.coefficients.as_slice()).dot(&features) + self.intercept
    }
}

// =============================================================================
// Ordinary Least Squares
// =============================================================================

/// Ordinary least squares via the normal equations.
///
/// Collinear features have no unique solution; the minimum-norm one is
/// returned, so a ramp or a flat stretch of prices still fits.
#[derive(Debug, Clone)]
pub struct LinearRegression {
    name: String,
}

impl Default for LinearRegression {
    fn default() -> Self {
        Self {
            name: "Linear Regression".into(),
        }
    }
}

impl Regressor for LinearRegression {
    fn name(&self) -> &str {
        &self.name
    }

    fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<FittedModel, FitError> {
        validate_training_set(x, y)?;
        let (xc, yc, c) = center(x, y)?;
        let (xtx, xty) = normal_equations(&xc, &yc);
        let weights = solve_normal_equations(&xtx, &xty);
        LinearModel::from_centered(weights, &c).map(FittedModel::Linear)
    }
}

// =============================================================================
// Ridge
// =============================================================================

/// L2-penalized least squares: `(XᵀX + αI) w = Xᵀy` on centered data.
#[derive(Debug, Clone)]
pub struct RidgeRegression {
    name: String,
    alpha: f64,
}

impl RidgeRegression {
    /// Ridge with a custom penalty strength.
    pub fn with_alpha(alpha: f64) -> Self {
        Self {
            alpha,
            ..Self::default()
        }
    }
}

impl Default for RidgeRegression {
    fn default() -> Self {
        Self {
            name: "Ridge Regression".into(),
            alpha: 1.0,
        }
    }
}

impl Regressor for RidgeRegression {
    fn name(&self) -> &str {
        &self.name
    }

    fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<FittedModel, FitError> {
        validate_training_set(x, y)?;
        let (xc, yc, c) = center(x, y)?;
        let (mut xtx, xty) = normal_equations(&xc, &yc);
        xtx.diag_mut().mapv_inplace(|d| d + self.alpha);
        let weights = solve_normal_equations(&xtx, &xty);
        LinearModel::from_centered(weights, &c).map(FittedModel::Linear)
    }
}

// =============================================================================
// Lasso
// =============================================================================

/// L1-penalized least squares by cyclic coordinate descent.
///
/// Minimizes `(1 / 2n) ||y - Xw||² + α ||w||₁` on centered data.
#[derive(Debug, Clone)]
pub struct LassoRegression {
    name: String,
    alpha: f64,
    max_iter: usize,
    tol: f64,
}

impl LassoRegression {
    /// Lasso with a custom penalty strength.
    pub fn with_alpha(alpha: f64) -> Self {
        Self {
            alpha,
            ..Self::default()
        }
    }
}

impl Default for LassoRegression {
    fn default() -> Self {
        Self {
            name: "Lasso Regression".into(),
            alpha: 1.0,
            max_iter: 1000,
            tol: 1e-4,
        }
    }
}

#[inline]
fn soft_threshold(value: f64, threshold: f64) -> f64 {
    if value > threshold {
        value - threshold
    } else if value < -threshold {
        value + threshold
    } else {
        0.0
    }
}

impl Regressor for LassoRegression {
    fn name(&self) -> &str {
        &self.name
    }

    fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<FittedModel, FitError> {
        let width = validate_training_set(x, y)?;
        let (xc, yc, c) = center(x, y)?;
        let n = xc.nrows() as f64;

        let col_sq = xc.map_axis(Axis(0), |col| col.dot(&col));
        let mut weights = Array1::<f64>::zeros(width);
        let mut residual = yc;
        let mut converged = false;

        for _ in 0..self.max_iter {
            let mut max_delta = 0.0_f64;
            let mut max_weight = 0.0_f64;

            for j in 0..width {
                if col_sq[j] == 0.0 {
                    continue;
                }
                let column = xc.column(j);
                let old = weights[j];
                let rho = column.dot(&residual) + old * col_sq[j];
                let new = soft_threshold(rho, n * self.alpha) / col_sq[j];
                let delta = new - old;
                if delta != 0.0 {
                    residual.scaled_add(-delta, &column);
                    weights[j] = new;
                }
                max_delta = max_delta.max(delta.abs());
                max_weight = max_weight.max(new.abs());
            }

            if max_weight == 0.0 || max_delta <= self.tol * max_weight {
                converged = true;
                break;
            }
        }

        if !converged {
            tracing::debug!(max_iter = self.max_iter, "lasso coordinate descent did not converge");
        }

        LinearModel::from_centered(weights, &c).map(FittedModel::Linear)
    }
}
