//! Progressive bracket schedules keyed by filing status.
//!
//! A schedule is valid when:
//! - it is non-empty and starts at 0
//! - brackets are sorted and contiguous (`upper[i] == lower[i + 1]`)
//! - only the last bracket is unbounded
//! - every rate lies in `[0, 1]`
//!
//! Tables are validated once at construction and never mutated afterwards.

use std::collections::BTreeMap;

use crate::domain::{Bracket, FilingStatus};
use crate::error::{Result, TaxError};

/// Immutable per-status bracket schedules.
#[derive(Debug, Clone, PartialEq)]
pub struct BracketTable {
    schedules: BTreeMap<FilingStatus, Vec<Bracket>>,
}

impl BracketTable {
    /// Build a table from per-status schedules.
    ///
    /// Each schedule is sorted by lower bound and validated. Statuses may be
    /// absent; lookups for them fail with [`TaxError::UnknownFilingStatus`].
    /// Use [`BracketTable::ensure_covers`] when a status set is mandatory.
    pub fn new(schedules: BTreeMap<FilingStatus, Vec<Bracket>>) -> Result<Self> {
        let mut sorted = BTreeMap::new();
        for (status, mut brackets) in schedules {
            brackets.sort_by(|a, b| a.lower.total_cmp(&b.lower));
            validate_schedule(status, &brackets)?;
            sorted.insert(status, brackets);
        }
        Ok(Self { schedules: sorted })
    }

    /// 2024 federal schedules for every supported filing status.
    pub fn default_2024() -> Self {
        let schedules = FilingStatus::ALL
            .into_iter()
            .map(|status| (status, default_schedule(status)))
            .collect();
        Self { schedules }
    }

    /// Brackets for `status`, ascending by lower bound.
    pub fn brackets(&self, status: FilingStatus) -> Result<&[Bracket]> {
        self.schedules
            .get(&status)
            .map(Vec::as_slice)
            .ok_or(TaxError::UnknownFilingStatus(status))
    }

    /// Fail unless every status in `required` has a schedule.
    pub fn ensure_covers(&self, required: &[FilingStatus]) -> Result<()> {
        match required.iter().find(|s| !self.schedules.contains_key(s)) {
            Some(missing) => Err(TaxError::InvalidBracketTable(format!(
                "no brackets for filing status `{missing}`"
            ))),
            None => Ok(()),
        }
    }
}

fn validate_schedule(status: FilingStatus, brackets: &[Bracket]) -> Result<()> {
    let invalid = |msg: String| TaxError::InvalidBracketTable(format!("{status}: {msg}"));

    let Some(first) = brackets.first() else {
        return Err(invalid("schedule is empty".to_string()));
    };
    if first.lower != 0.0 {
        return Err(invalid(format!("first bracket starts at {} instead of 0", first.lower)));
    }

    for (i, b) in brackets.iter().enumerate() {
        if !(b.rate.is_finite() && (0.0..=1.0).contains(&b.rate)) {
            return Err(invalid(format!("rate {} outside [0, 1]", b.rate)));
        }
        if !b.lower.is_finite() {
            return Err(invalid(format!("non-finite lower bound in bracket {}", i + 1)));
        }
        let is_last = i + 1 == brackets.len();
        match (b.upper, is_last) {
            (None, true) => {}
            (None, false) => {
                return Err(invalid(format!("bracket {} is unbounded but not last", i + 1)));
            }
            (Some(_), true) => {
                return Err(invalid("top bracket must be unbounded".to_string()));
            }
            (Some(upper), false) => {
                if !(upper.is_finite() && upper > b.lower) {
                    return Err(invalid(format!(
                        "bracket {} has upper bound {upper} <= lower bound {}",
                        i + 1,
                        b.lower
                    )));
                }
                let next = brackets[i + 1].lower;
                if upper != next {
                    return Err(invalid(format!(
                        "brackets {} and {} are not contiguous ({upper} vs {next})",
                        i + 1,
                        i + 2
                    )));
                }
            }
        }
    }

    Ok(())
}

fn default_schedule(status: FilingStatus) -> Vec<Bracket> {
    const RATES: [f64; 7] = [0.10, 0.12, 0.22, 0.24, 0.32, 0.35, 0.37];
    let bounds: [f64; 6] = match status {
        FilingStatus::Single => [11_600.0, 47_150.0, 100_525.0, 191_950.0, 243_725.0, 609_350.0],
        FilingStatus::Married => [23_200.0, 94_300.0, 201_050.0, 383_900.0, 487_450.0, 731_200.0],
        FilingStatus::HeadOfHousehold => {
            [16_550.0, 63_100.0, 100_500.0, 191_950.0, 243_700.0, 609_350.0]
        }
    };

    let mut lower = 0.0;
    let mut out = Vec::with_capacity(RATES.len());
    for (i, rate) in RATES.into_iter().enumerate() {
        let upper = bounds.get(i).copied();
        out.push(Bracket::new(lower, upper, rate));
        lower = upper.unwrap_or(lower);
    }
    out
}
