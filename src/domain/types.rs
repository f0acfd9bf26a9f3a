//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during training and prediction
//! - persisted to JSON (scaler/model state)
//! - read from and written to CSV datasets

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Filing status selecting which bracket schedule applies.
///
/// The set is closed: adding a status means adding brackets for it, because the
/// default tables and the CSV loader both require a schedule for every entry
/// in [`FilingStatus::ALL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum FilingStatus {
    Single,
    Married,
    #[value(name = "head_of_household", aliases = ["head-of-household", "hoh"])]
    HeadOfHousehold,
}

impl FilingStatus {
    pub const ALL: [FilingStatus; 3] = [
        FilingStatus::Single,
        FilingStatus::Married,
        FilingStatus::HeadOfHousehold,
    ];

    /// Key used in CSV sources and persisted files.
    pub fn as_str(self) -> &'static str {
        match self {
            FilingStatus::Single => "single",
            FilingStatus::Married => "married",
            FilingStatus::HeadOfHousehold => "head_of_household",
        }
    }

    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            FilingStatus::Single => "Single",
            FilingStatus::Married => "Married Filing Jointly",
            FilingStatus::HeadOfHousehold => "Head of Household",
        }
    }

    /// Parse a status key, case-insensitive, with `-` and spaces read as `_`.
    pub fn parse(raw: &str) -> Option<FilingStatus> {
        let key = raw
            .trim()
            .to_ascii_lowercase()
            .replace(['-', ' '], "_");
        match key.as_str() {
            "single" => Some(FilingStatus::Single),
            "married" | "married_filing_jointly" => Some(FilingStatus::Married),
            "head_of_household" | "hoh" => Some(FilingStatus::HeadOfHousehold),
            _ => None,
        }
    }
}

impl std::fmt::Display for FilingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One contiguous income band taxed at a single rate.
///
/// `upper` is `None` for the unbounded top bracket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bracket {
    pub lower: f64,
    pub upper: Option<f64>,
    pub rate: f64,
}

impl Bracket {
    pub fn new(lower: f64, upper: Option<f64>, rate: f64) -> Self {
        Self { lower, upper, rate }
    }

    /// Upper bound with the open top bracket mapped to `+inf`.
    pub fn upper_or_inf(&self) -> f64 {
        self.upper.unwrap_or(f64::INFINITY)
    }
}

/// A household tax query or labeled training record.
///
/// `tax_liability` is `None` until computed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaxCase {
    pub income: f64,
    pub deductions: f64,
    pub filing_status: FilingStatus,
    pub tax_liability: Option<f64>,
}

impl TaxCase {
    pub fn query(income: f64, deductions: f64, filing_status: FilingStatus) -> Self {
        Self {
            income,
            deductions,
            filing_status,
            tax_liability: None,
        }
    }

    /// Raw `(income, deductions)` feature pair.
    pub fn features(&self) -> [f64; 2] {
        [self.income, self.deductions]
    }
}

/// Fitted per-feature statistics, ordered `(income, deductions)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalerState {
    pub mean: [f64; 2],
    pub scale: [f64; 2],
}

/// Which estimator backs the regressor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RegressorKind {
    /// Ordinary least squares.
    Ols,
    /// L1-regularized least squares with fixed strength `alpha`.
    Lasso { alpha: f64 },
}

impl RegressorKind {
    pub fn display_name(&self) -> String {
        match self {
            RegressorKind::Ols => "OLS".to_string(),
            RegressorKind::Lasso { alpha } => format!("Lasso (alpha={alpha})"),
        }
    }
}

impl Default for RegressorKind {
    fn default() -> Self {
        RegressorKind::Lasso { alpha: 1.0 }
    }
}

/// In-sample fit diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitQuality {
    pub sse: f64,
    pub rmse: f64,
    pub r2: f64,
    pub n: usize,
}

/// Fitted linear map `y = intercept + coefficients · x`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelState {
    pub estimator: RegressorKind,
    pub coefficients: [f64; 2],
    pub intercept: f64,
    pub quality: FitQuality,
    pub trained_at: DateTime<Utc>,
    /// Scaler state the coefficients were fitted against. Serving refuses a
    /// model whose scaler file does not match it.
    #[serde(default)]
    pub scaler: Option<ScalerState>,
}

/// Where the training pipeline gets its labeled rows from.
#[derive(Debug, Clone, PartialEq)]
pub enum TrainingSource {
    Synthetic { sample_count: usize, seed: u64 },
    Csv(PathBuf),
}

/// Uniform sampling bounds for synthetic data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleRanges {
    pub income: (f64, f64),
    pub deduction_rate: (f64, f64),
}

impl Default for SampleRanges {
    fn default() -> Self {
        Self {
            income: (20_000.0, 500_000.0),
            deduction_rate: (0.05, 0.30),
        }
    }
}

/// A full training run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub source: TrainingSource,
    pub ranges: SampleRanges,
    pub estimator: RegressorKind,
    /// Share of rows held out for evaluation; `0.0` disables the split.
    pub holdout_fraction: f64,
    pub holdout_seed: u64,
    pub export_dataset: Option<PathBuf>,
}

impl TrainConfig {
    pub fn synthetic(sample_count: usize, seed: u64) -> Self {
        Self {
            source: TrainingSource::Synthetic { sample_count, seed },
            ranges: SampleRanges::default(),
            estimator: RegressorKind::default(),
            holdout_fraction: 0.2,
            holdout_seed: 42,
            export_dataset: None,
        }
    }
}
