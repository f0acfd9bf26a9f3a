//! L1-regularized least squares via cyclic coordinate descent.
//!
//! Objective (intercept unpenalized):
//!
//! ```text
//! minimize (1 / 2n) Σ (y_i - b - x_i^T w)^2 + α ‖w‖₁
//! ```
//!
//! We center `X` and `y`, solve for `w` on the centered data, then recover
//! `b = ȳ - x̄^T w`. Each coordinate step is a soft-threshold:
//!
//! ```text
//! w_j = S(ρ_j, α) / z_j,   ρ_j = (1/n) Σ x_ij (r_i + x_ij w_j),   z_j = (1/n) Σ x_ij²
//! ```

use nalgebra::{DMatrix, DVector};

/// Coordinate descent settings.
#[derive(Debug, Clone, Copy)]
pub struct LassoOptions {
    pub alpha: f64,
    pub max_iter: usize,
    /// Stop when the largest coefficient update is below `tol · max|w|`.
    pub tol: f64,
}

impl LassoOptions {
    pub fn with_alpha(alpha: f64) -> Self {
        Self {
            alpha,
            max_iter: 1_000,
            tol: 1e-4,
        }
    }
}

/// Fitted Lasso coefficients.
#[derive(Debug, Clone)]
pub struct LassoFit {
    pub coefficients: DVector<f64>,
    pub intercept: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Fit a Lasso model on `x` (n × p, no intercept column) and `y`.
///
/// Returns `None` when the inputs are empty, mismatched, or the solution is
/// not finite.
pub fn solve_lasso(x: &DMatrix<f64>, y: &DVector<f64>, opts: &LassoOptions) -> Option<LassoFit> {
    let (n, p) = x.shape();
    if n == 0 || n != y.len() || !(opts.alpha.is_finite() && opts.alpha >= 0.0) {
        return None;
    }
    let n_f = n as f64;

    let x_mean: Vec<f64> = (0..p).map(|j| x.column(j).sum() / n_f).collect();
    let y_mean = y.sum() / n_f;

    let xc = DMatrix::from_fn(n, p, |i, j| x[(i, j)] - x_mean[j]);
    let col_sq: Vec<f64> = (0..p).map(|j| xc.column(j).norm_squared() / n_f).collect();

    let mut w = DVector::<f64>::zeros(p);
    // Residual r = y_c - X_c w, starting from w = 0.
    let mut r = y.map(|v| v - y_mean);

    let mut iterations = 0;
    let mut converged = false;

    while iterations < opts.max_iter {
        iterations += 1;
        let mut max_delta: f64 = 0.0;
        let mut max_w: f64 = 0.0;

        for j in 0..p {
            let z = col_sq[j];
            let old = w[j];
            let new = if z > 0.0 {
                let col = xc.column(j);
                let rho = col.dot(&r) / n_f + z * old;
                soft_threshold(rho, opts.alpha) / z
            } else {
                0.0
            };

            let delta = new - old;
            if delta != 0.0 {
                r.axpy(-delta, &xc.column(j), 1.0);
                w[j] = new;
            }

            max_delta = max_delta.max(delta.abs());
            max_w = max_w.max(new.abs());
        }

        if max_w == 0.0 || max_delta <= opts.tol * max_w {
            converged = true;
            break;
        }
    }

    let intercept = y_mean - x_mean.iter().zip(w.iter()).map(|(m, c)| m * c).sum::<f64>();

    if !(intercept.is_finite() && w.iter().all(|v| v.is_finite())) {
        return None;
    }

    Some(LassoFit {
        coefficients: w,
        intercept,
        iterations,
        converged,
    })
}

fn soft_threshold(value: f64, alpha: f64) -> f64 {
    if value > alpha {
        value - alpha
    } else if value < -alpha {
        value + alpha
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::solve_least_squares;

    fn toy() -> (DMatrix<f64>, DVector<f64>) {
        // y = 1 + 2 a - 0.5 b with a little curvature so the fit is not exact.
        let rows: [[f64; 2]; 6] = [
            [-1.0, 0.5],
            [-0.5, -1.0],
            [0.0, 0.2],
            [0.5, 1.5],
            [1.0, -0.3],
            [1.5, 0.8],
        ];
        let x = DMatrix::from_fn(rows.len(), 2, |i, j| rows[i][j]);
        let y = DVector::from_fn(rows.len(), |i, _| {
            1.0 + 2.0 * rows[i][0] - 0.5 * rows[i][1] + 0.05 * rows[i][0] * rows[i][0]
        });
        (x, y)
    }

    #[test]
    fn zero_alpha_matches_ols() {
        let (x, y) = toy();
        let opts = LassoOptions {
            alpha: 0.0,
            max_iter: 10_000,
            tol: 1e-12,
        };
        let fit = solve_lasso(&x, &y, &opts).unwrap();

        let design = DMatrix::from_fn(x.nrows(), 3, |i, j| if j == 0 { 1.0 } else { x[(i, j - 1)] });
        let beta = solve_least_squares(&design, &y).unwrap();

        assert!((fit.intercept - beta[0]).abs() < 1e-6);
        assert!((fit.coefficients[0] - beta[1]).abs() < 1e-6);
        assert!((fit.coefficients[1] - beta[2]).abs() < 1e-6);
    }

    #[test]
    fn large_alpha_zeroes_coefficients() {
        let (x, y) = toy();
        let fit = solve_lasso(&x, &y, &LassoOptions::with_alpha(1e6)).unwrap();
        assert!(fit.converged);
        assert_eq!(fit.coefficients[0], 0.0);
        assert_eq!(fit.coefficients[1], 0.0);
        let y_mean = y.sum() / y.len() as f64;
        assert!((fit.intercept - y_mean).abs() < 1e-12);
    }

    #[test]
    fn penalty_shrinks_towards_zero() {
        let (x, y) = toy();
        let loose = solve_lasso(&x, &y, &LassoOptions::with_alpha(0.01)).unwrap();
        let tight = solve_lasso(&x, &y, &LassoOptions::with_alpha(0.5)).unwrap();
        let l1 = |f: &LassoFit| f.coefficients.iter().map(|c| c.abs()).sum::<f64>();
        assert!(l1(&tight) < l1(&loose));
    }

    #[test]
    fn soft_threshold_cases() {
        assert_eq!(soft_threshold(3.0, 1.0), 2.0);
        assert_eq!(soft_threshold(-3.0, 1.0), -2.0);
        assert_eq!(soft_threshold(0.5, 1.0), 0.0);
    }

    #[test]
    fn rejects_mismatched_inputs() {
        let x = DMatrix::<f64>::zeros(3, 2);
        let y = DVector::<f64>::zeros(2);
        assert!(solve_lasso(&x, &y, &LassoOptions::with_alpha(1.0)).is_none());
    }
}
