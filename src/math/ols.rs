//! Ordinary least squares solver.
//!
//! We solve small linear regression problems of the form:
//!
//! ```text
//! minimize Σ (y_i - x_i^T β)^2
//! ```
//!
//! where the first column of the design matrix is the constant 1 (intercept).
//!
//! Implementation choices:
//! - We use SVD to solve the least-squares problem robustly even when the
//!   design matrix is tall (more rows than columns).
//!   (Nalgebra's `QR::solve` is intended for square systems and will panic for
//!   non-square matrices.)
//! - Income and deductions are strongly correlated in generated data, so the
//!   design can be close to collinear; SVD degrades gracefully there.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Build a design matrix `[1, x_1, ..., x_p]` from feature rows.
pub fn design_with_intercept(rows: &[[f64; 2]]) -> DMatrix<f64> {
    DMatrix::from_fn(rows.len(), 3, |i, j| if j == 0 { 1.0 } else { rows[i][j - 1] })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn design_prepends_constant_column() {
        let x = design_with_intercept(&[[3.0, 4.0], [5.0, 6.0]]);
        assert_eq!(x.shape(), (2, 3));
        assert_eq!(x[(0, 0)], 1.0);
        assert_eq!(x[(1, 1)], 5.0);
        assert_eq!(x[(1, 2)], 6.0);
    }
}
