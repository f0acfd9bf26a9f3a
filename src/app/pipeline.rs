//! Shared training and prediction pipelines used by the service and the CLI.
//!
//! Training (offline, run once):
//! dataset -> holdout split -> scaler fit -> transform -> regressor train -> persist
//!
//! Prediction (online, per request):
//! load persisted state once -> transform -> predict
//!
//! The model state records the scaler state it was trained against, and both
//! files are staged before either is moved into place. A scaler/model pair
//! from different runs is served as unavailable.
//!
//! Training never retries: any stage failure aborts the run with the
//! underlying error. Prediction never fails at construction: if the state
//! cannot be loaded the pipeline is built in an "unavailable" state instead.

use crate::data::{generate_seeded, split_holdout};
use crate::domain::{FitQuality, ModelState, ScalerState, TaxCase, TrainConfig, TrainingSource};
use crate::error::{Result, TaxError};
use crate::io::{load_sample_dataset, write_sample_dataset};
use crate::math::{fit_quality, mean_abs_error};
use crate::models::{FeatureScaler, TaxRegressor};
use crate::settings::ModelPaths;
use crate::tax::TaxCalculator;

/// Out-of-sample error on the reserved rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoldoutMetrics {
    pub n: usize,
    pub rmse: f64,
    pub mae: f64,
}

/// Everything a training run produced.
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub rows_total: usize,
    pub rows_train: usize,
    pub row_errors: usize,
    pub scaler: ScalerState,
    pub model: ModelState,
    pub holdout: Option<HoldoutMetrics>,
    pub paths: ModelPaths,
}

impl TrainingReport {
    pub fn quality(&self) -> &FitQuality {
        &self.model.quality
    }
}

/// Run the full training pipeline and persist scaler + model state.
pub fn train_and_persist(
    calculator: &TaxCalculator,
    config: &TrainConfig,
    paths: &ModelPaths,
) -> Result<TrainingReport> {
    if !(config.holdout_fraction.is_finite() && (0.0..1.0).contains(&config.holdout_fraction)) {
        return Err(TaxError::InvalidConfig(format!(
            "Holdout fraction must be in [0, 1) (got {}).",
            config.holdout_fraction
        )));
    }

    // 1) Labeled rows.
    let (rows, row_errors) = load_training_rows(calculator, config)?;
    tracing::info!(rows = rows.len(), row_errors, "prepared training data");

    if let Some(path) = &config.export_dataset {
        write_sample_dataset(path, &rows)?;
        tracing::info!(path = %path.display(), "exported training dataset");
    }

    // 2) Holdout split.
    let rows_total = rows.len();
    let split = split_holdout(rows, config.holdout_fraction, config.holdout_seed);

    // 3) Scaler on raw (income, deductions).
    let raw: Vec<[f64; 2]> = split.train.iter().map(TaxCase::features).collect();
    let labels = labels_of(&split.train)?;

    let mut scaler = FeatureScaler::new();
    let scaler_state = *scaler.fit(&raw)?;
    let scaled = scaler.transform(&raw)?;

    // 4) Regressor on scaled features.
    let mut regressor = TaxRegressor::new(config.estimator);
    regressor.train(&scaled, &labels)?;
    let model_state = regressor.bind_scaler(scaler_state)?.clone();

    // 5) Holdout evaluation.
    let holdout = if split.holdout.is_empty() {
        None
    } else {
        let raw_holdout: Vec<[f64; 2]> = split.holdout.iter().map(TaxCase::features).collect();
        let observed = labels_of(&split.holdout)?;
        let predicted = regressor.predict(&scaler.transform(&raw_holdout)?)?;
        let metrics = HoldoutMetrics {
            n: observed.len(),
            rmse: fit_quality(&observed, &predicted).rmse,
            mae: mean_abs_error(&observed, &predicted),
        };
        tracing::info!(n = metrics.n, rmse = metrics.rmse, mae = metrics.mae, "holdout evaluation");
        Some(metrics)
    };

    // 6) Stage both states; nothing is replaced unless both writes succeed.
    let staged_scaler = scaler.stage(&paths.scaler)?;
    let staged_model = regressor.stage(&paths.model)?;
    tracing::debug!(
        scaler = %staged_scaler.target().display(),
        model = %staged_model.target().display(),
        "staged scaler and model"
    );
    staged_scaler.commit()?;
    staged_model.commit()?;
    tracing::info!(
        scaler = %paths.scaler.display(),
        model = %paths.model.display(),
        "persisted scaler and model"
    );

    Ok(TrainingReport {
        rows_total,
        rows_train: split.train.len(),
        row_errors,
        scaler: scaler_state,
        model: model_state,
        holdout,
        paths: paths.clone(),
    })
}

fn load_training_rows(calculator: &TaxCalculator, config: &TrainConfig) -> Result<(Vec<TaxCase>, usize)> {
    match &config.source {
        TrainingSource::Synthetic { sample_count, seed } => {
            let rows = generate_seeded(calculator, *sample_count, &config.ranges, *seed)?;
            Ok((rows, 0))
        }
        TrainingSource::Csv(path) => {
            let data = load_sample_dataset(path)?;
            for err in &data.row_errors {
                tracing::warn!(line = err.line, "skipped sample row: {}", err.message);
            }
            // Rows without a recorded liability are labeled by the calculator.
            let rows = data
                .rows
                .into_iter()
                .map(|row| match row.tax_liability {
                    Some(_) => Ok(row),
                    None => calculator.label(row),
                })
                .collect::<Result<Vec<_>>>()?;
            Ok((rows, data.row_errors.len()))
        }
    }
}

fn labels_of(rows: &[TaxCase]) -> Result<Vec<f64>> {
    rows.iter()
        .map(|r| {
            r.tax_liability.ok_or_else(|| {
                TaxError::InvalidTrainingData("training row is missing its tax liability".to_string())
            })
        })
        .collect()
}

/// Scaler and regressor loaded together for serving.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub scaler: FeatureScaler,
    pub regressor: TaxRegressor,
}

#[derive(Debug, Clone)]
enum Availability {
    Ready(LoadedModel),
    Unavailable(String),
}

/// Read-only prediction path over persisted state.
///
/// Built once per process; holds no interior mutability, so it can be shared
/// across threads by reference.
#[derive(Debug, Clone)]
pub struct PredictionPipeline {
    availability: Availability,
}

impl PredictionPipeline {
    /// Load scaler and model state. Never fails: load errors leave the
    /// pipeline unavailable, with the reason kept for reporting.
    pub fn load(paths: &ModelPaths) -> Self {
        let loaded = FeatureScaler::load(&paths.scaler)
            .and_then(|scaler| TaxRegressor::load(&paths.model).map(|regressor| LoadedModel { scaler, regressor }))
            .and_then(|model| {
                ensure_same_run(&model.scaler, &model.regressor)?;
                Ok(model)
            });

        match loaded {
            Ok(model) => {
                tracing::info!(model = %paths.model.display(), "loaded prediction model");
                Self {
                    availability: Availability::Ready(model),
                }
            }
            Err(TaxError::ModelUnavailable(reason)) => {
                tracing::warn!("prediction model unavailable: {reason}");
                Self::unavailable(reason)
            }
            Err(err) => {
                tracing::warn!("prediction model unavailable: {err}");
                Self::unavailable(err.to_string())
            }
        }
    }

    /// Build from in-memory components; both must already be fitted.
    pub fn from_parts(scaler: FeatureScaler, regressor: TaxRegressor) -> Result<Self> {
        if !scaler.is_fitted() {
            return Err(TaxError::ScalerNotFitted);
        }
        if !regressor.is_fitted() {
            return Err(TaxError::ModelNotFitted);
        }
        ensure_same_run(&scaler, &regressor)?;
        Ok(Self {
            availability: Availability::Ready(LoadedModel { scaler, regressor }),
        })
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            availability: Availability::Unavailable(reason.into()),
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self.availability, Availability::Ready(_))
    }

    pub fn unavailable_reason(&self) -> Option<&str> {
        match &self.availability {
            Availability::Ready(_) => None,
            Availability::Unavailable(reason) => Some(reason),
        }
    }

    pub fn model(&self) -> Option<&LoadedModel> {
        match &self.availability {
            Availability::Ready(model) => Some(model),
            Availability::Unavailable(_) => None,
        }
    }

    /// Predicted liability. The value is the raw linear output (may be negative).
    pub fn predict_tax(&self, income: f64, deductions: f64) -> Result<f64> {
        let model = match &self.availability {
            Availability::Ready(model) => model,
            Availability::Unavailable(reason) => return Err(TaxError::ModelUnavailable(reason.clone())),
        };
        for (name, value) in [("income", income), ("deductions", deductions)] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(TaxError::InvalidInput(format!(
                    "{name} must be a finite, non-negative amount (got {value})"
                )));
            }
        }

        let features = model.scaler.transform_one(income, deductions)?;
        model.regressor.predict_one(features)
    }
}

fn ensure_same_run(scaler: &FeatureScaler, regressor: &TaxRegressor) -> Result<()> {
    let bound = regressor.state().and_then(|s| s.scaler.as_ref());
    if bound.is_some() && bound == scaler.state() {
        Ok(())
    } else {
        Err(TaxError::ModelUnavailable(
            "scaler and model state come from different training runs".to_string(),
        ))
    }
}
