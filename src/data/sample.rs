//! Synthetic training data labeled by the bracket calculator.
//!
//! Incomes, deduction rates and filing statuses are drawn uniformly; each
//! record is then labeled with [`TaxCalculator::compute`]. All randomness comes
//! from the caller's RNG so a seed fully determines the dataset.

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::domain::{FilingStatus, SampleRanges, TaxCase};
use crate::error::{Result, TaxError};
use crate::tax::TaxCalculator;

impl TaxCalculator {
    /// Draw `n` labeled cases.
    ///
    /// Deductions are `income × rate` with `rate ≤ 1`, so `deductions ≤ income`
    /// holds by construction.
    pub fn generate_synthetic_dataset<R: Rng + ?Sized>(
        &self,
        n: usize,
        ranges: &SampleRanges,
        rng: &mut R,
    ) -> Result<Vec<TaxCase>> {
        if n == 0 {
            return Err(TaxError::InvalidConfig("Sample count must be > 0.".to_string()));
        }
        validate_ranges(ranges)?;

        let (inc_lo, inc_hi) = ranges.income;
        let (rate_lo, rate_hi) = ranges.deduction_rate;

        let incomes: Vec<f64> = (0..n).map(|_| rng.gen_range(inc_lo..=inc_hi)).collect();
        let rates: Vec<f64> = (0..n).map(|_| rng.gen_range(rate_lo..=rate_hi)).collect();
        let statuses: Vec<FilingStatus> = (0..n)
            .map(|_| FilingStatus::ALL[rng.gen_range(0..FilingStatus::ALL.len())])
            .collect();

        incomes
            .into_iter()
            .zip(rates)
            .zip(statuses)
            .map(|((income, rate), status)| self.label(TaxCase::query(income, income * rate, status)))
            .collect()
    }
}

/// Generate a dataset from an explicit seed.
pub fn generate_seeded(
    calculator: &TaxCalculator,
    n: usize,
    ranges: &SampleRanges,
    seed: u64,
) -> Result<Vec<TaxCase>> {
    let mut rng = StdRng::seed_from_u64(seed);
    calculator.generate_synthetic_dataset(n, ranges, &mut rng)
}

fn validate_ranges(ranges: &SampleRanges) -> Result<()> {
    let (inc_lo, inc_hi) = ranges.income;
    if !(inc_lo.is_finite() && inc_hi.is_finite() && inc_lo >= 0.0 && inc_hi >= inc_lo) {
        return Err(TaxError::InvalidConfig(format!(
            "Invalid income range [{inc_lo}, {inc_hi}]."
        )));
    }

    let (rate_lo, rate_hi) = ranges.deduction_rate;
    if !(rate_lo.is_finite() && rate_hi.is_finite() && rate_lo >= 0.0 && rate_hi <= 1.0 && rate_hi >= rate_lo) {
        return Err(TaxError::InvalidConfig(format!(
            "Invalid deduction rate range [{rate_lo}, {rate_hi}] (must lie within [0, 1])."
        )));
    }

    Ok(())
}
