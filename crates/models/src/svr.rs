//! Epsilon support vector regression with an RBF kernel.
//!
//! Solves the dual
//!
//! ```text
//! min_β  ½ βᵀQβ - yᵀβ + ε‖β‖₁    subject to  -C ≤ βᵢ ≤ C
//! Q = K + 1,  K(a, b) = exp(-γ‖a - b‖²)
//! ```
//!
//! by cyclic coordinate descent. Adding 1 to the kernel folds the bias term
//! into the dual, so no equality constraint is needed and each coordinate
//! update has a closed form (soft threshold, then clip).
//!
//! # JSON Format
//!
//! ```json
//! {
//!   "model_type": "svr",
//!   "n_features": 7,
//!   "gamma": 0.0021,
//!   "support_vectors": [[...7 prices...], ...],
//!   "dual_coefs": [1.0, -0.37, ...]
//! }
//! ```

use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::{FitError, FittedModel, Predictor, Regressor, validate_training_set};

/// Fitted SVR: `Σ βᵢ (K(svᵢ, x) + 1)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SvrModel {
    /// Number of features expected.
    pub n_features: usize,
    /// RBF width.
    pub gamma: f64,
    /// Training rows with non-zero dual coefficient.
    pub support_vectors: Vec<Vec<f64>>,
    /// Dual coefficient per support vector.
    pub dual_coefs: Vec<f64>,
}

#[inline]
fn rbf(a: ArrayView1<f64>, b: ArrayView1<f64>, gamma: f64) -> f64 {
    let sq: f64 = a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum();
    (-gamma * sq).exp()
}

impl SvrModel {
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.support_vectors.len() != self.dual_coefs.len() {
            return Err(format!(
                "SVR has {} support vectors but {} coefficients",
                self.support_vectors.len(),
                self.dual_coefs.len()
            ));
        }
        if let Some(i) = self
            .support_vectors
            .iter()
            .position(|sv| sv.len() != self.n_features)
        {
            return Err(format!(
                "Support vector {} has {} features, expected {}",
                i,
                self.support_vectors[i].len(),
                self.n_features
            ));
        }
        if !(self.gamma.is_finite() && self.gamma > 0.0) {
            return Err(format!("SVR gamma must be positive, got {}", self.gamma));
        }
        Ok(())
    }
}

impl Predictor for SvrModel {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_unchecked(&self, features: ArrayView1<f64>) -> f64 {
        self.support_vectors
            .iter()
            .zip(&self.dual_coefs)
            .map(|(sv, beta)| beta * (rbf(ArrayView1::from(sv.as_slice()), features, self.gamma) + 1.0))
            .sum()
    }
}

/// Epsilon-SVR candidate with `gamma = 1 / (n_features · Var(X))`.
#[derive(Debug, Clone)]
pub struct SupportVectorRegression {
    name: String,
    c: f64,
    epsilon: f64,
    max_iter: usize,
    tol: f64,
}

impl SupportVectorRegression {
    /// SVR with custom box constraint and tube width.
    pub fn with_params(c: f64, epsilon: f64) -> Self {
        Self {
            c,
            epsilon,
            ..Self::default()
        }
    }

    /// Kernel width scaled to the overall feature variance.
    fn gamma(x: &Array2<f64>) -> f64 {
        let mean = x.mean().unwrap_or(0.0);
        let var = x.mapv(|v| (v - mean) * (v - mean)).mean().unwrap_or(0.0);
        if var > 0.0 {
            1.0 / (x.ncols() as f64 * var)
        } else {
            1.0
        }
    }
}

impl Default for SupportVectorRegression {
    fn default() -> Self {
        Self {
            name: "SVM Regression".into(),
            c: 1.0,
            epsilon: 0.1,
            max_iter: 1000,
            tol: 1e-3,
        }
    }
}

impl Regressor for SupportVectorRegression {
    fn name(&self) -> &str {
        &self.name
    }

    fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<FittedModel, FitError> {
        let width = validate_training_set(x, y)?;
        let n = x.nrows();
        let gamma = Self::gamma(x);

        let q = Array2::from_shape_fn((n, n), |(i, j)| rbf(x.row(i), x.row(j), gamma) + 1.0);

        let mut beta = Array1::<f64>::zeros(n);
        // Running value of Qβ.
        let mut q_beta = Array1::<f64>::zeros(n);

        for _ in 0..self.max_iter {
            let mut max_delta = 0.0_f64;
            for i in 0..n {
                let q_ii = q[[i, i]];
                let gradient = q_beta[i] - y[i];
                let unconstrained = soft_threshold(q_ii * beta[i] - gradient, self.epsilon) / q_ii;
                let updated = unconstrained.clamp(-self.c, self.c);
                let delta = updated - beta[i];
                if delta != 0.0 {
                    beta[i] = updated;
                    // Q is symmetric, so column i is row i.
                    q_beta.scaled_add(delta, &q.column(i));
                }
                max_delta = max_delta.max(delta.abs());
            }
            if max_delta < self.tol {
                break;
            }
        }

        if beta.iter().any(|b| !b.is_finite()) {
            return Err(FitError::Diverged("non-finite dual coefficients".into()));
        }

        let (support_vectors, dual_coefs) = x
            .rows()
            .into_iter()
            .zip(beta.iter())
            .filter(|(_, b)| b.abs() > 1e-12)
            .map(|(row, &b)| (row.to_vec(), b))
            .unzip();

        Ok(FittedModel::Svr(SvrModel {
            n_features: width,
            gamma,
            support_vectors,
            dual_coefs,
        }))
    }
}

#[inline]
fn soft_threshold(value: f64, threshold: f64) -> f64 {
    value.signum() * (value.abs() - threshold).max(0.0)
}
