//! Linear tax regressor over scaled `(income, deductions)` features.
//!
//! Training solves either OLS (SVD on `[1, x₁, x₂]`) or Lasso (coordinate
//! descent). Prediction is the plain linear map and is never clamped: a
//! linear fit to a convex bracket function can go negative near zero income,
//! and deciding what to show for that is the caller's business.

use std::path::Path;

use chrono::Utc;
use nalgebra::{DMatrix, DVector};

use crate::domain::{ModelState, RegressorKind, ScalerState};
use crate::error::{Result, TaxError};
use crate::io::{StagedFile, read_json, stage_json};
use crate::math::{LassoOptions, design_with_intercept, fit_quality, solve_lasso, solve_least_squares};

#[derive(Debug, Clone, PartialEq)]
pub struct TaxRegressor {
    estimator: RegressorKind,
    state: Option<ModelState>,
}

impl TaxRegressor {
    pub fn new(estimator: RegressorKind) -> Self {
        Self { estimator, state: None }
    }

    pub fn from_state(state: ModelState) -> Self {
        Self {
            estimator: state.estimator,
            state: Some(state),
        }
    }

    pub fn state(&self) -> Option<&ModelState> {
        self.state.as_ref()
    }

    pub fn is_fitted(&self) -> bool {
        self.state.is_some()
    }

    /// Fit on scaled features and labels.
    ///
    /// Requires `features.len() == labels.len() > 0` and finite values.
    pub fn train(&mut self, features: &[[f64; 2]], labels: &[f64]) -> Result<&ModelState> {
        if features.is_empty() || features.len() != labels.len() {
            return Err(TaxError::InvalidTrainingData(format!(
                "need the same positive number of feature rows and labels (got {} and {})",
                features.len(),
                labels.len()
            )));
        }
        if features.iter().flatten().chain(labels).any(|v| !v.is_finite()) {
            return Err(TaxError::InvalidTrainingData(
                "features and labels must be finite".to_string(),
            ));
        }

        let y = DVector::from_column_slice(labels);
        let (coefficients, intercept) = match self.estimator {
            RegressorKind::Ols => {
                let x = design_with_intercept(features);
                let beta = solve_least_squares(&x, &y).ok_or_else(|| {
                    TaxError::InvalidTrainingData("least squares system is too ill-conditioned".to_string())
                })?;
                ([beta[1], beta[2]], beta[0])
            }
            RegressorKind::Lasso { alpha } => {
                if !(alpha.is_finite() && alpha >= 0.0) {
                    return Err(TaxError::InvalidConfig(format!(
                        "Lasso alpha must be finite and >= 0 (got {alpha})"
                    )));
                }
                let x = DMatrix::from_fn(features.len(), 2, |i, j| features[i][j]);
                let fit = solve_lasso(&x, &y, &LassoOptions::with_alpha(alpha)).ok_or_else(|| {
                    TaxError::InvalidTrainingData("coordinate descent produced non-finite coefficients".to_string())
                })?;
                if !fit.converged {
                    tracing::warn!(iterations = fit.iterations, "lasso did not converge; using last iterate");
                }
                ([fit.coefficients[0], fit.coefficients[1]], fit.intercept)
            }
        };

        let predicted: Vec<f64> = features
            .iter()
            .map(|x| linear(&coefficients, intercept, x))
            .collect();
        let quality = fit_quality(labels, &predicted);

        tracing::info!(
            estimator = %self.estimator.display_name(),
            n = quality.n,
            rmse = quality.rmse,
            r2 = quality.r2,
            "trained tax regressor"
        );

        let state = ModelState {
            estimator: self.estimator,
            coefficients,
            intercept,
            quality,
            trained_at: Utc::now(),
            scaler: None,
        };
        Ok(self.state.insert(state))
    }

    /// Record the scaler state the training features came from.
    pub fn bind_scaler(&mut self, scaler: ScalerState) -> Result<&ModelState> {
        let state = self.state.as_mut().ok_or(TaxError::ModelNotFitted)?;
        state.scaler = Some(scaler);
        Ok(state)
    }

    pub fn predict(&self, features: &[[f64; 2]]) -> Result<Vec<f64>> {
        let state = self.state.as_ref().ok_or(TaxError::ModelNotFitted)?;
        Ok(features
            .iter()
            .map(|x| linear(&state.coefficients, state.intercept, x))
            .collect())
    }

    pub fn predict_one(&self, features: [f64; 2]) -> Result<f64> {
        let state = self.state.as_ref().ok_or(TaxError::ModelNotFitted)?;
        Ok(linear(&state.coefficients, state.intercept, &features))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.stage(path)?.commit()
    }

    /// Write the state to a temp file next to `path`; see [`StagedFile`].
    pub fn stage(&self, path: &Path) -> Result<StagedFile> {
        let state = self.state.as_ref().ok_or(TaxError::ModelNotFitted)?;
        stage_json(path, state)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let state: ModelState = read_json(path)?;
        let finite = state.intercept.is_finite() && state.coefficients.iter().all(|c| c.is_finite());
        if !finite {
            return Err(TaxError::persistence(path, "model state holds non-finite coefficients"));
        }
        Ok(Self::from_state(state))
    }
}

impl Default for TaxRegressor {
    fn default() -> Self {
        Self::new(RegressorKind::default())
    }
}

fn linear(coefficients: &[f64; 2], intercept: f64, x: &[f64; 2]) -> f64 {
    intercept + coefficients[0] * x[0] + coefficients[1] * x[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exact_plane() -> (Vec<[f64; 2]>, Vec<f64>) {
        let features: Vec<[f64; 2]> = (0..20)
            .map(|i| {
                let a = i as f64 / 10.0 - 1.0;
                let b = ((i * 7) % 11) as f64 / 5.0 - 1.0;
                [a, b]
            })
            .collect();
        let labels = features.iter().map(|x| 500.0 + 40.0 * x[0] - 15.0 * x[1]).collect();
        (features, labels)
    }

    #[test]
    fn ols_recovers_exact_plane() {
        let (features, labels) = exact_plane();
        let mut model = TaxRegressor::new(RegressorKind::Ols);
        let state = model.train(&features, &labels).unwrap().clone();

        assert!((state.intercept - 500.0).abs() < 1e-8);
        assert!((state.coefficients[0] - 40.0).abs() < 1e-8);
        assert!((state.coefficients[1] + 15.0).abs() < 1e-8);
        assert!(state.quality.r2 > 0.999_999);

        let p = model.predict_one([0.5, 0.5]).unwrap();
        assert!((p - (500.0 + 20.0 - 7.5)).abs() < 1e-8);
    }

    #[test]
    fn lasso_with_small_alpha_is_close_to_ols() {
        let (features, labels) = exact_plane();
        let mut model = TaxRegressor::new(RegressorKind::Lasso { alpha: 0.01 });
        model.train(&features, &labels).unwrap();
        let p = model.predict(&features).unwrap();
        for (yhat, y) in p.iter().zip(&labels) {
            assert!((yhat - y).abs() < 1.0, "{yhat} vs {y}");
        }
    }

    #[test]
    fn training_input_validation() {
        let mut model = TaxRegressor::default();
        assert!(matches!(model.train(&[], &[]), Err(TaxError::InvalidTrainingData(_))));
        assert!(matches!(
            model.train(&[[1.0, 2.0]], &[1.0, 2.0]),
            Err(TaxError::InvalidTrainingData(_))
        ));
        assert!(matches!(
            model.train(&[[1.0, 2.0]], &[f64::INFINITY]),
            Err(TaxError::InvalidTrainingData(_))
        ));

        let mut bad_alpha = TaxRegressor::new(RegressorKind::Lasso { alpha: -1.0 });
        assert!(matches!(
            bad_alpha.train(&[[1.0, 2.0]], &[1.0]),
            Err(TaxError::InvalidConfig(_))
        ));
    }

    #[test]
    fn predict_before_train_fails() {
        let model = TaxRegressor::default();
        assert_eq!(model.predict(&[[0.0, 0.0]]), Err(TaxError::ModelNotFitted));
        assert_eq!(model.predict_one([0.0, 0.0]), Err(TaxError::ModelNotFitted));
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(model.save(&dir.path().join("m.json")), Err(TaxError::ModelNotFitted));

        let mut model = TaxRegressor::default();
        let scaler = ScalerState {
            mean: [0.0; 2],
            scale: [1.0; 2],
        };
        assert_eq!(model.bind_scaler(scaler).unwrap_err(), TaxError::ModelNotFitted);
    }

    #[test]
    fn output_is_not_clamped() {
        let state = ModelState {
            estimator: RegressorKind::Ols,
            coefficients: [1_000.0, 0.0],
            intercept: 10.0,
            quality: fit_quality(&[], &[]),
            trained_at: Utc::now(),
            scaler: None,
        };
        let model = TaxRegressor::from_state(state);
        assert_eq!(model.predict_one([-1.0, 0.0]).unwrap(), -990.0);
    }

    #[test]
    fn save_load_reproduces_predictions_bit_for_bit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tax_model.json");

        let (features, mut labels) = exact_plane();
        // Break exactness so the coefficients carry full-precision noise.
        labels.iter_mut().enumerate().for_each(|(i, y)| *y += (i as f64).sin() * 3.3);

        let mut model = TaxRegressor::default();
        model.train(&features, &labels).unwrap();
        model.save(&path).unwrap();

        let loaded = TaxRegressor::load(&path).unwrap();
        assert_eq!(loaded, model);

        let a = model.predict(&features).unwrap();
        let b = loaded.predict(&features).unwrap();
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.to_bits(), y.to_bits());
        }
    }
}
