//! Deployment settings resolved from the environment.
//!
//! - `TAXSENSE_MODEL_DIR`: directory holding `scaler.json` and `tax_model.json`
//!   (default `models`)
//! - `TAXSENSE_BRACKETS`: optional bracket-table CSV; the built-in 2024 tables
//!   are used when unset
//!
//! A `.env` file in the working directory is honoured.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::io::load_bracket_table;
use crate::tax::BracketTable;

pub const MODEL_DIR_VAR: &str = "TAXSENSE_MODEL_DIR";
pub const BRACKETS_VAR: &str = "TAXSENSE_BRACKETS";

const SCALER_FILE: &str = "scaler.json";
const MODEL_FILE: &str = "tax_model.json";

/// Fixed locations of the persisted scaler and model state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPaths {
    pub scaler: PathBuf,
    pub model: PathBuf,
}

impl ModelPaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            scaler: dir.join(SCALER_FILE),
            model: dir.join(MODEL_FILE),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub model_dir: PathBuf,
    pub bracket_csv: Option<PathBuf>,
}

impl Settings {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            model_dir: non_empty(MODEL_DIR_VAR)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("models")),
            bracket_csv: non_empty(BRACKETS_VAR).map(PathBuf::from),
        }
    }

    pub fn model_paths(&self) -> ModelPaths {
        ModelPaths::in_dir(&self.model_dir)
    }

    /// Load the configured bracket table, or the 2024 defaults.
    pub fn bracket_table(&self) -> Result<BracketTable> {
        match &self.bracket_csv {
            Some(path) => load_bracket_table(path),
            None => Ok(BracketTable::default_2024()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn defaults_when_unset_or_blank() {
        let env: HashMap<&str, &str> = HashMap::from([(BRACKETS_VAR, "  ")]);
        let settings = Settings::from_lookup(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(settings.model_dir, PathBuf::from("models"));
        assert_eq!(settings.bracket_csv, None);
        assert_eq!(settings.model_paths().model, PathBuf::from("models/tax_model.json"));
    }

    #[test]
    fn reads_overrides() {
        let env: HashMap<&str, &str> =
            HashMap::from([(MODEL_DIR_VAR, "/srv/taxsense"), (BRACKETS_VAR, "brackets.csv")]);
        let settings = Settings::from_lookup(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(settings.model_paths().scaler, PathBuf::from("/srv/taxsense/scaler.json"));
        assert_eq!(settings.bracket_csv, Some(PathBuf::from("brackets.csv")));
    }
}
