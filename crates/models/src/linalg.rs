//! Dense linear algebra for the closed-form linear models.
//!
//! Normal equations are solved by Cholesky decomposition. A rank-deficient
//! Gram matrix (collinear lag columns, a flat price stretch) falls back to the
//! minimum-norm least squares solution through a pseudoinverse built from a
//! Jacobi eigendecomposition.

use ndarray::{Array1, Array2, Axis};

use crate::FitError;

/// Pivots and eigenvalues below this fraction of the largest one count as zero.
const RELATIVE_TOLERANCE: f64 = 1e-12;

/// Upper bound on Jacobi sweeps; convergence is quadratic, so this is never
/// reached for lag-window sized matrices.
const MAX_JACOBI_SWEEPS: usize = 50;

/// Column means of `x` and the mean of `y`.
pub(crate) struct Centering {
    pub x_means: Array1<f64>,
    pub y_mean: f64,
}

/// Center every column of `x` and `y` on its mean.
pub(crate) fn center(
    x: &Array2<f64>,
    y: &Array1<f64>,
) -> Result<(Array2<f64>, Array1<f64>, Centering), FitError> {
    let x_means = x.mean_axis(Axis(0)).ok_or(FitError::EmptyTrainingSet)?;
    let y_mean = y.mean().ok_or(FitError::EmptyTrainingSet)?;

    let xc = x - &x_means;
    let yc = y - y_mean;

    Ok((xc, yc, Centering { x_means, y_mean }))
}

/// Gram matrix `XᵀX` and moment vector `Xᵀy`.
pub(crate) fn normal_equations(x: &Array2<f64>, y: &Array1<f64>) -> (Array2<f64>, Array1<f64>) {
    let xt = x.t();
    (xt.dot(x), xt.dot(y))
}

/// Solve the symmetric positive semi-definite system `a · w = b`.
///
/// Uses Cholesky when `a` is positive definite, otherwise the minimum-norm
/// solution `a⁺ b`.
pub(crate) fn solve_normal_equations(a: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    cholesky_solve(a, b).unwrap_or_else(|| {
        tracing::debug!(n = a.nrows(), "normal equations are rank deficient, using pseudoinverse");
        pseudoinverse_solve(a, b)
    })
}

/// Solve `a · w = b` with `a = L Lᵀ`; `None` when `a` is not positive definite.
fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    let tolerance = max_abs(a.diag().iter()) * RELATIVE_TOLERANCE;
    let mut l = Array2::<f64>::zeros((n, n));

    // Cholesky decomposition: A = L * L^T
    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l[[i, k]] * l[[j, k]];
            }

            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= tolerance {
                    return None;
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    // Solve L * z = b (forward substitution)
    let mut z = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut sum = 0.0;
        for j in 0..i {
            sum += l[[i, j]] * z[j];
        }
        z[i] = (b[i] - sum) / l[[i, i]];
    }

    // Solve L^T * w = z (backward substitution)
    let mut w = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = 0.0;
        for j in (i + 1)..n {
            sum += l[[j, i]] * w[j];
        }
        w[i] = (z[i] - sum) / l[[i, i]];
    }

    Some(w)
}

/// Minimum-norm solution of `a · w = b` for symmetric `a` (Moore-Penrose).
fn pseudoinverse_solve(a: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    let (eigenvalues, eigenvectors) = symmetric_eigen(a);
    let cutoff = max_abs(eigenvalues.iter()) * RELATIVE_TOLERANCE;

    let projected = eigenvectors.t().dot(b);
    let scaled: Array1<f64> = projected
        .iter()
        .zip(eigenvalues.iter())
        .map(|(&p, &lambda)| if lambda.abs() > cutoff { p / lambda } else { 0.0 })
        .collect();

    eigenvectors.dot(&scaled)
}

/// Eigenvalues and eigenvectors (as columns) of a symmetric matrix, by
/// cyclic Jacobi rotations.
fn symmetric_eigen(a: &Array2<f64>) -> (Array1<f64>, Array2<f64>) {
    let n = a.nrows();
    let mut m = a.clone();
    let mut v = Array2::<f64>::eye(n);

    for _ in 0..MAX_JACOBI_SWEEPS {
        let total: f64 = m.iter().map(|x| x * x).sum();
        let diagonal: f64 = m.diag().iter().map(|x| x * x).sum();
        if total - diagonal <= f64::EPSILON * f64::EPSILON * total {
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                let apq = m[[p, q]];
                if apq == 0.0 {
                    continue;
                }
                let theta = (m[[q, q]] - m[[p, p]]) / (2.0 * apq);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                // M <- M * J
                for k in 0..n {
                    let (mkp, mkq) = (m[[k, p]], m[[k, q]]);
                    m[[k, p]] = c * mkp - s * mkq;
                    m[[k, q]] = s * mkp + c * mkq;
                }
                // M <- Jᵀ * M
                for k in 0..n {
                    let (mpk, mqk) = (m[[p, k]], m[[q, k]]);
                    m[[p, k]] = c * mpk - s * mqk;
                    m[[q, k]] = s * mpk + c * mqk;
                }
                // V <- V * J
                for k in 0..n {
                    let (vkp, vkq) = (v[[k, p]], v[[k, q]]);
                    v[[k, p]] = c * vkp - s * vkq;
                    v[[k, q]] = s * vkp + c * vkq;
                }
            }
        }
    }

    (m.diag().to_owned(), v)
}

fn max_abs<'a>(values: impl Iterator<Item = &'a f64>) -> f64 {
    values.fold(0.0_f64, |acc, v| acc.max(v.abs()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn assert_close(a: &Array1<f64>, b: &Array1<f64>, tol: f64) {
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < tol, "{} vs {}", a, b);
        }
    }

    #[test]
    fn test_cholesky_two_by_two() {
        // 2a + b = 5, a + 3b = 10 -> a = 1, b = 3
        let a = array![[2.0, 1.0], [1.0, 3.0]];
        let w = cholesky_solve(&a, &array![5.0, 10.0]).unwrap();
        assert_close(&w, &array![1.0, 3.0], 1e-12);
    }

    #[test]
    fn test_cholesky_rejects_singular() {
        let a = array![[1.0, 2.0], [2.0, 4.0]];
        assert!(cholesky_solve(&a, &array![1.0, 2.0]).is_none());
        assert!(cholesky_solve(&Array2::zeros((3, 3)), &Array1::zeros(3)).is_none());
    }

    #[test]
    fn test_symmetric_eigen_reconstructs() {
        let a = array![[4.0, 1.0, 0.5], [1.0, 3.0, 0.2], [0.5, 0.2, 2.0]];
        let (values, vectors) = symmetric_eigen(&a);
        let rebuilt = vectors.dot(&Array2::from_diag(&values)).dot(&vectors.t());
        for (x, y) in rebuilt.iter().zip(a.iter()) {
            assert!((x - y).abs() < 1e-12);
        }
        let identity = vectors.t().dot(&vectors);
        for ((i, j), x) in identity.indexed_iter() {
            let expected = if i == j { 1.0 } else { 0.0 };
            assert!((x - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_pseudoinverse_gives_minimum_norm() {
        // Rank one: every w with w0 + 2 w1 = 1 solves it; the shortest is (0.2, 0.4).
        let a = array![[1.0, 2.0], [2.0, 4.0]];
        let w = pseudoinverse_solve(&a, &array![1.0, 2.0]);
        assert_close(&w, &array![0.2, 0.4], 1e-12);
    }

    #[test]
    fn test_pseudoinverse_of_zero_is_zero() {
        let w = pseudoinverse_solve(&Array2::zeros((2, 2)), &array![0.0, 0.0]);
        assert_eq!(w, array![0.0, 0.0]);
    }

    #[test]
    fn test_solve_normal_equations_matches_cholesky_when_definite() {
        let a = array![[2.0, 1.0], [1.0, 3.0]];
        let b = array![5.0, 10.0];
        assert_close(&solve_normal_equations(&a, &b), &pseudoinverse_solve(&a, &b), 1e-12);
    }

    #[test]
    fn test_center() {
        let x = array![[1.0, 10.0], [3.0, 30.0]];
        let y = array![2.0, 4.0];
        let (xc, yc, c) = center(&x, &y).unwrap();
        assert_eq!(c.x_means, array![2.0, 20.0]);
        assert_eq!(c.y_mean, 3.0);
        assert_eq!(xc, array![[-1.0, -10.0], [1.0, 10.0]]);
        assert_eq!(yc, array![-1.0, 1.0]);
    }

    #[test]
    fn test_normal_equations_symmetric() {
        let x = array![[1.0, 2.0], [3.0, 4.0]];
        let (xtx, xty) = normal_equations(&x, &array![1.0, 1.0]);
        assert_eq!(xtx, array![[10.0, 14.0], [14.0, 20.0]]);
        assert_eq!(xty, array![4.0, 6.0]);
    }
}
