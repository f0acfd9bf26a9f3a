//! Command-line parsing for the tax-liability estimator.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! calculation/training code. Everything here converts into domain types.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::domain::{FilingStatus, RegressorKind, SampleRanges, TrainConfig, TrainingSource};
use crate::error::{Result, TaxError};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "taxsense", version, about = "Progressive tax calculator with a learned estimator")]
pub struct Cli {
    /// Directory holding persisted scaler/model state (overrides TAXSENSE_MODEL_DIR).
    #[arg(long, global = true, value_name = "DIR")]
    pub model_dir: Option<PathBuf>,

    /// Bracket table CSV (overrides TAXSENSE_BRACKETS).
    #[arg(long, global = true, value_name = "CSV")]
    pub brackets: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Train the regressor and persist scaler + model state.
    Train(TrainArgs),
    /// Exact bracket calculation only.
    Compute(HouseholdArgs),
    /// Model prediction only (fails if no trained model is available).
    Predict(PredictArgs),
    /// Bracket calculation and model prediction side by side.
    Estimate(HouseholdArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EstimatorArg {
    Ols,
    Lasso,
}

#[derive(Debug, Parser, Clone)]
pub struct TrainArgs {
    /// Number of synthetic households to generate.
    #[arg(short = 'n', long, default_value_t = 10_000)]
    pub samples: usize,

    /// Seed for synthetic generation.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Train from a CSV dataset instead of synthetic data.
    #[arg(long, value_name = "CSV")]
    pub data: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = EstimatorArg::Lasso)]
    pub estimator: EstimatorArg,

    /// L1 penalty strength (lasso only).
    #[arg(long, default_value_t = 1.0)]
    pub alpha: f64,

    /// Fraction of rows held out for evaluation (0 disables).
    #[arg(long, default_value_t = 0.2)]
    pub holdout: f64,

    /// Minimum synthetic income.
    #[arg(long, default_value_t = 20_000.0)]
    pub income_min: f64,

    /// Maximum synthetic income.
    #[arg(long, default_value_t = 500_000.0)]
    pub income_max: f64,

    /// Write the labeled training dataset to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct HouseholdArgs {
    #[arg(long)]
    pub income: f64,

    #[arg(long, default_value_t = 0.0)]
    pub deductions: f64,

    #[arg(short = 's', long, value_enum, default_value_t = FilingStatus::Single)]
    pub filing_status: FilingStatus,
}

#[derive(Debug, Parser, Clone)]
pub struct PredictArgs {
    #[arg(long)]
    pub income: f64,

    #[arg(long, default_value_t = 0.0)]
    pub deductions: f64,
}

impl TrainArgs {
    pub fn to_config(&self) -> Result<TrainConfig> {
        if !(0.0..1.0).contains(&self.holdout) {
            return Err(TaxError::InvalidConfig(format!(
                "--holdout must be in [0, 1), got {}",
                self.holdout
            )));
        }
        let estimator = match self.estimator {
            EstimatorArg::Ols => RegressorKind::Ols,
            EstimatorArg::Lasso => {
                if !(self.alpha.is_finite() && self.alpha >= 0.0) {
                    return Err(TaxError::InvalidConfig(format!(
                        "--alpha must be finite and >= 0, got {}",
                        self.alpha
                    )));
                }
                RegressorKind::Lasso { alpha: self.alpha }
            }
        };
        let source = match &self.data {
            Some(path) => TrainingSource::Csv(path.clone()),
            None => TrainingSource::Synthetic {
                sample_count: self.samples,
                seed: self.seed,
            },
        };

        Ok(TrainConfig {
            source,
            ranges: SampleRanges {
                income: (self.income_min, self.income_max),
                ..SampleRanges::default()
            },
            estimator,
            holdout_fraction: self.holdout,
            holdout_seed: 42,
            export_dataset: self.export.clone(),
        })
    }
}
