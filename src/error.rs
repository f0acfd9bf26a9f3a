//! Error taxonomy for the tax engine, scaler, regressor and pipelines.
//!
//! Every failure is a distinct variant so callers pick their own fallback
//! policy. In particular the serving path matches on [`TaxError::Persistence`]
//! at load time and degrades to [`TaxError::ModelUnavailable`].

use std::path::{Path, PathBuf};

use crate::domain::FilingStatus;

pub type Result<T> = std::result::Result<T, TaxError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TaxError {
    #[error("No tax brackets defined for filing status `{0}`.")]
    UnknownFilingStatus(FilingStatus),

    #[error("Invalid bracket table: {0}")]
    InvalidBracketTable(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Cannot fit on an empty dataset.")]
    EmptyDataset,

    #[error("Invalid training data: {0}")]
    InvalidTrainingData(String),

    #[error("Feature scaler used before fit/load.")]
    ScalerNotFitted,

    #[error("Regression model used before train/load.")]
    ModelNotFitted,

    #[error("Persistence error for '{}': {message}", path.display())]
    Persistence { path: PathBuf, message: String },

    #[error("Data source error: {0}")]
    DataSource(String),

    #[error("Model prediction unavailable: {0}")]
    ModelUnavailable(String),
}

impl TaxError {
    pub fn persistence(path: &Path, message: impl Into<String>) -> Self {
        TaxError::Persistence {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    /// Process exit code for the binary.
    ///
    /// 2 = bad input/config, 3 = bad data, 4 = sequencing/internal, 5 = storage.
    pub fn exit_code(&self) -> u8 {
        match self {
            TaxError::UnknownFilingStatus(_)
            | TaxError::InvalidBracketTable(_)
            | TaxError::InvalidInput(_)
            | TaxError::InvalidConfig(_) => 2,
            TaxError::EmptyDataset | TaxError::InvalidTrainingData(_) | TaxError::DataSource(_) => 3,
            TaxError::ScalerNotFitted | TaxError::ModelNotFitted => 4,
            TaxError::Persistence { .. } | TaxError::ModelUnavailable(_) => 5,
        }
    }
}
