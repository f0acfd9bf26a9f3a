//! Core API consumed by presentation layers.
//!
//! `TaxService` owns the calculator and a prediction pipeline loaded once at
//! construction. The service itself never substitutes one estimate for the
//! other: `estimate` returns the calculated tax alongside an explicit
//! [`Prediction::Unavailable`] when the model cannot serve.

use crate::app::pipeline::{PredictionPipeline, TrainingReport, train_and_persist};
use crate::domain::{FilingStatus, TaxCase, TrainConfig};
use crate::error::{Result, TaxError};
use crate::settings::{ModelPaths, Settings};
use crate::tax::TaxCalculator;

/// Model side of an estimate.
#[derive(Debug, Clone, PartialEq)]
pub enum Prediction {
    Available(f64),
    Unavailable(String),
}

impl Prediction {
    pub fn value(&self) -> Option<f64> {
        match self {
            Prediction::Available(v) => Some(*v),
            Prediction::Unavailable(_) => None,
        }
    }
}

/// Calculated liability paired with the model's view of the same household.
#[derive(Debug, Clone, PartialEq)]
pub struct Estimate {
    pub case: TaxCase,
    pub calculated: f64,
    pub prediction: Prediction,
}

#[derive(Debug, Clone)]
pub struct TaxService {
    calculator: TaxCalculator,
    prediction: PredictionPipeline,
    paths: ModelPaths,
}

impl TaxService {
    /// Build a service, loading persisted model state from `paths` once.
    pub fn new(calculator: TaxCalculator, paths: ModelPaths) -> Self {
        let prediction = PredictionPipeline::load(&paths);
        Self {
            calculator,
            prediction,
            paths,
        }
    }

    /// Build from environment settings (bracket CSV + model directory).
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let calculator = TaxCalculator::new(settings.bracket_table()?);
        Ok(Self::new(calculator, settings.model_paths()))
    }

    pub fn prediction_pipeline(&self) -> &PredictionPipeline {
        &self.prediction
    }

    pub fn compute_tax(&self, income: f64, deductions: f64, filing_status: FilingStatus) -> Result<f64> {
        self.calculator.compute(income, deductions, filing_status)
    }

    pub fn predict_tax(&self, income: f64, deductions: f64) -> Result<f64> {
        self.prediction.predict_tax(income, deductions)
    }

    /// Both estimates for one household.
    pub fn estimate(&self, income: f64, deductions: f64, filing_status: FilingStatus) -> Result<Estimate> {
        let calculated = self.compute_tax(income, deductions, filing_status)?;
        let prediction = match self.predict_tax(income, deductions) {
            Ok(v) => Prediction::Available(v),
            Err(TaxError::ModelUnavailable(reason)) => Prediction::Unavailable(reason),
            Err(e) => return Err(e),
        };

        Ok(Estimate {
            case: TaxCase {
                income,
                deductions,
                filing_status,
                tax_liability: Some(calculated),
            },
            calculated,
            prediction,
        })
    }

    /// Train on `sample_count` synthetic rows and persist to this service's paths.
    ///
    /// The already-loaded prediction pipeline is left untouched; call
    /// [`TaxService::reload`] to pick up the new state.
    pub fn train_and_persist(&self, sample_count: usize, seed: u64) -> Result<TrainingReport> {
        train_and_persist(&self.calculator, &TrainConfig::synthetic(sample_count, seed), &self.paths)
    }

    /// Swap in freshly loaded state. Requires exclusive access.
    pub fn reload(&mut self) {
        self.prediction = PredictionPipeline::load(&self.paths);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predict_before_any_training_is_model_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let service = TaxService::new(TaxCalculator::default(), ModelPaths::in_dir(dir.path()));

        assert!(matches!(
            service.predict_tax(50_000.0, 12_000.0),
            Err(TaxError::ModelUnavailable(_))
        ));

        let estimate = service.estimate(50_000.0, 12_000.0, FilingStatus::Single).unwrap();
        assert!((estimate.calculated - 4_328.0).abs() < 1e-9);
        assert!(matches!(estimate.prediction, Prediction::Unavailable(_)));
        assert_eq!(estimate.prediction.value(), None);
    }

    #[test]
    fn train_then_reload_makes_predictions_available() {
        let dir = tempfile::tempdir().unwrap();
        let mut service = TaxService::new(TaxCalculator::default(), ModelPaths::in_dir(dir.path()));

        service.train_and_persist(1_000, 3).unwrap();
        assert!(!service.prediction_pipeline().is_available());

        service.reload();
        let estimate = service.estimate(80_000.0, 10_000.0, FilingStatus::Married).unwrap();
        assert!(estimate.prediction.value().is_some_and(f64::is_finite));
    }

    #[test]
    fn invalid_inputs_are_errors_not_fallbacks() {
        let dir = tempfile::tempdir().unwrap();
        let service = TaxService::new(TaxCalculator::default(), ModelPaths::in_dir(dir.path()));
        assert!(matches!(
            service.estimate(-5.0, 0.0, FilingStatus::Single),
            Err(TaxError::InvalidInput(_))
        ));
    }
}
