//! Held-out evaluation metrics.

use ndarray::Array1;

/// Metrics for one candidate on the evaluation split.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegressionMetrics {
    /// Mean squared error.
    pub mse: f64,
    /// Coefficient of determination.
    pub r2: f64,
}

impl RegressionMetrics {
    /// Compute every metric for paired targets and predictions.
    pub fn calculate(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Self {
        Self {
            mse: mean_squared_error(y_true, y_pred),
            r2: r2_score(y_true, y_pred),
        }
    }
}

/// Mean squared error: (1/n) * Σ(y_true - y_pred)². NaN for empty input.
pub fn mean_squared_error(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let n = y_true.len() as f64;
    y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(&t, &p)| (t - p).powi(2))
        .sum::<f64>()
        / n
}

/// R² = 1 - SS_res / SS_tot, or 0.0 when the targets have no variance.
pub fn r2_score(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let y_mean = y_true.mean().unwrap_or(0.0);

    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(&t, &p)| (t - p).powi(2))
        .sum();
    let ss_tot: f64 = y_true.iter().map(|&t| (t - y_mean).powi(2)).sum();

    if ss_tot < 1e-10 {
        return 0.0;
    }

    1.0 - ss_res / ss_tot
}
