//! Standard-score scaling for `(income, deductions)` feature pairs.

use std::path::Path;

use crate::domain::ScalerState;
use crate::error::{Result, TaxError};
use crate::io::{StagedFile, read_json, stage_json};
use crate::math::{mean, std_dev};

/// Holds fitted per-feature mean/scale statistics.
///
/// A feature with zero spread keeps `scale = 0` in its state and is passed
/// through as `value - mean` instead of being divided.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureScaler {
    state: Option<ScalerState>,
}

impl FeatureScaler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_state(state: ScalerState) -> Self {
        Self { state: Some(state) }
    }

    pub fn state(&self) -> Option<&ScalerState> {
        self.state.as_ref()
    }

    pub fn is_fitted(&self) -> bool {
        self.state.is_some()
    }

    /// Compute per-feature mean and population standard deviation.
    pub fn fit(&mut self, records: &[[f64; 2]]) -> Result<&ScalerState> {
        if records.is_empty() {
            return Err(TaxError::EmptyDataset);
        }
        if records.iter().flatten().any(|v| !v.is_finite()) {
            return Err(TaxError::InvalidTrainingData(
                "feature values must be finite".to_string(),
            ));
        }

        let mut state = ScalerState {
            mean: [0.0; 2],
            scale: [0.0; 2],
        };
        for f in 0..2 {
            let column: Vec<f64> = records.iter().map(|r| r[f]).collect();
            state.mean[f] = mean(&column).ok_or(TaxError::EmptyDataset)?;
            state.scale[f] = std_dev(&column).ok_or(TaxError::EmptyDataset)?;
        }

        tracing::debug!(mean = ?state.mean, scale = ?state.scale, "fitted feature scaler");
        Ok(self.state.insert(state))
    }

    pub fn transform(&self, records: &[[f64; 2]]) -> Result<Vec<[f64; 2]>> {
        let state = self.state.as_ref().ok_or(TaxError::ScalerNotFitted)?;
        Ok(records.iter().map(|r| scale_pair(state, *r)).collect())
    }

    pub fn transform_one(&self, income: f64, deductions: f64) -> Result<[f64; 2]> {
        let state = self.state.as_ref().ok_or(TaxError::ScalerNotFitted)?;
        Ok(scale_pair(state, [income, deductions]))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.stage(path)?.commit()
    }

    pub fn stage(&self, path: &Path) -> Result<StagedFile> {
        let state = self.state.as_ref().ok_or(TaxError::ScalerNotFitted)?;
        stage_json(path, state)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let state: ScalerState = read_json(path)?;
        let valid = state.mean.iter().chain(&state.scale).all(|v| v.is_finite())
            && state.scale.iter().all(|s| *s >= 0.0);
        if !valid {
            return Err(TaxError::persistence(path, "scaler state holds non-finite or negative values"));
        }
        Ok(Self::from_state(state))
    }
}

fn scale_pair(state: &ScalerState, raw: [f64; 2]) -> [f64; 2] {
    let mut out = [0.0; 2];
    for f in 0..2 {
        let centered = raw[f] - state.mean[f];
        out[f] = if state.scale[f] == 0.0 {
            centered
        } else {
            centered / state.scale[f]
        };
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standardizes_each_feature() {
        let mut scaler = FeatureScaler::new();
        let data = [[10.0, 1.0], [20.0, 3.0], [30.0, 5.0]];
        scaler.fit(&data).unwrap();

        let out = scaler.transform(&data).unwrap();
        let scale0 = (200.0_f64 / 3.0).sqrt();
        assert!((out[0][0] + 10.0 / scale0).abs() < 1e-12);
        assert!(out[1][0].abs() < 1e-12);
        assert!(out[1][1].abs() < 1e-12);

        let state = scaler.state().unwrap();
        assert_eq!(state.mean, [20.0, 3.0]);
    }

    #[test]
    fn zero_variance_features_pass_through_centered() {
        let mut scaler = FeatureScaler::new();
        scaler.fit(&[[50_000.0, 10_000.0], [50_000.0, 10_000.0]]).unwrap();
        assert_eq!(scaler.state().unwrap().scale, [0.0, 0.0]);

        let out = scaler.transform_one(60_000.0, 9_000.0).unwrap();
        assert_eq!(out, [10_000.0, -1_000.0]);
        assert_eq!(scaler.transform_one(50_000.0, 10_000.0).unwrap(), [0.0, 0.0]);
    }

    #[test]
    fn sequencing_errors() {
        let scaler = FeatureScaler::new();
        assert_eq!(scaler.transform(&[[1.0, 2.0]]), Err(TaxError::ScalerNotFitted));

        let mut scaler = FeatureScaler::new();
        assert_eq!(scaler.fit(&[]).unwrap_err(), TaxError::EmptyDataset);
        assert!(matches!(
            scaler.fit(&[[f64::NAN, 1.0]]),
            Err(TaxError::InvalidTrainingData(_))
        ));
    }

    #[test]
    fn save_load_reproduces_transform_bit_for_bit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scaler.json");

        let mut scaler = FeatureScaler::new();
        scaler
            .fit(&[[48_123.37, 9_811.1], [131_007.9, 21_000.01], [77_777.7, 3_333.3]])
            .unwrap();
        scaler.save(&path).unwrap();

        let loaded = FeatureScaler::load(&path).unwrap();
        assert_eq!(loaded, scaler);

        let probe = [[60_000.0, 12_000.0], [1.0, 0.0]];
        let a = scaler.transform(&probe).unwrap();
        let b = loaded.transform(&probe).unwrap();
        for (x, y) in a.iter().flatten().zip(b.iter().flatten()) {
            assert_eq!(x.to_bits(), y.to_bits());
        }
    }

    #[test]
    fn load_missing_file_is_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = FeatureScaler::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, TaxError::Persistence { .. }));
    }
}
