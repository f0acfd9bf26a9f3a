//! Deterministic progressive-bracket tax calculation.
//!
//! ```text
//! taxable = max(0, income - deductions)
//! tax     = Σ rate_i · (min(taxable, upper_i) - lower_i)   over brackets with taxable > lower_i
//! ```

use crate::domain::{FilingStatus, TaxCase};
use crate::error::{Result, TaxError};
use crate::tax::BracketTable;

/// Computes tax owed from a [`BracketTable`] it owns exclusively.
#[derive(Debug, Clone)]
pub struct TaxCalculator {
    table: BracketTable,
}

impl TaxCalculator {
    pub fn new(table: BracketTable) -> Self {
        Self { table }
    }

    /// Tax owed for one household.
    ///
    /// Deductions above income are tolerated (taxable income clamps at 0).
    pub fn compute(&self, income: f64, deductions: f64, filing_status: FilingStatus) -> Result<f64> {
        check_amount("income", income)?;
        check_amount("deductions", deductions)?;

        let brackets = self.table.brackets(filing_status)?;
        let taxable = (income - deductions).max(0.0);

        let mut total = 0.0;
        for bracket in brackets {
            if taxable <= bracket.lower {
                break;
            }
            let amount = taxable.min(bracket.upper_or_inf()) - bracket.lower;
            total += amount * bracket.rate;
        }

        Ok(total)
    }

    /// Fill in `tax_liability` for a query.
    pub fn label(&self, case: TaxCase) -> Result<TaxCase> {
        let tax = self.compute(case.income, case.deductions, case.filing_status)?;
        Ok(TaxCase {
            tax_liability: Some(tax),
            ..case
        })
    }
}

impl Default for TaxCalculator {
    fn default() -> Self {
        Self::new(BracketTable::default_2024())
    }
}

fn check_amount(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(TaxError::InvalidInput(format!(
            "{name} must be a finite, non-negative amount (got {value})"
        )))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use proptest::prelude::*;

    use super::*;
    use crate::domain::Bracket;

    #[test]
    fn single_filer_worked_example() {
        let calc = TaxCalculator::default();
        let tax = calc.compute(50_000.0, 12_000.0, FilingStatus::Single).unwrap();
        // 11600 * 0.10 + (38000 - 11600) * 0.12
        assert!((tax - 4_328.0).abs() < 1e-9, "got {tax}");
    }

    #[test]
    fn zero_taxable_income_is_zero_tax_for_every_status() {
        let calc = TaxCalculator::default();
        for status in FilingStatus::ALL {
            assert_eq!(calc.compute(50_000.0, 50_000.0, status).unwrap(), 0.0);
        }
    }

    #[test]
    fn deductions_above_income_clamp_to_zero() {
        let calc = TaxCalculator::default();
        assert_eq!(calc.compute(10_000.0, 25_000.0, FilingStatus::Married).unwrap(), 0.0);
    }

    #[test]
    fn top_bracket_applies_above_last_bound() {
        let calc = TaxCalculator::default();
        let at_bound = calc.compute(609_350.0, 0.0, FilingStatus::Single).unwrap();
        let above = calc.compute(709_350.0, 0.0, FilingStatus::Single).unwrap();
        assert!((above - at_bound - 37_000.0).abs() < 1e-6);
    }

    #[test]
    fn missing_status_is_an_error_not_zero() {
        let table = BracketTable::new(BTreeMap::from([(
            FilingStatus::Single,
            vec![Bracket::new(0.0, None, 0.1)],
        )]))
        .unwrap();
        let calc = TaxCalculator::new(table);
        assert_eq!(
            calc.compute(50_000.0, 0.0, FilingStatus::HeadOfHousehold),
            Err(TaxError::UnknownFilingStatus(FilingStatus::HeadOfHousehold))
        );
    }

    #[test]
    fn rejects_negative_and_nan_amounts() {
        let calc = TaxCalculator::default();
        assert!(matches!(
            calc.compute(-1.0, 0.0, FilingStatus::Single),
            Err(TaxError::InvalidInput(_))
        ));
        assert!(matches!(
            calc.compute(1.0, f64::NAN, FilingStatus::Single),
            Err(TaxError::InvalidInput(_))
        ));
    }

    #[test]
    fn label_fills_liability() {
        let calc = TaxCalculator::default();
        let case = calc
            .label(TaxCase::query(50_000.0, 12_000.0, FilingStatus::Single))
            .unwrap();
        assert!((case.tax_liability.unwrap() - 4_328.0).abs() < 1e-9);
    }

    fn any_status() -> impl Strategy<Value = FilingStatus> {
        prop::sample::select(FilingStatus::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn non_negative_and_monotone_in_income(
            status in any_status(),
            deductions in 0.0f64..200_000.0,
            extra in 0.0f64..1_000_000.0,
            step in 0.0f64..250_000.0,
        ) {
            let calc = TaxCalculator::default();
            let income = deductions + extra;
            let lo = calc.compute(income, deductions, status).unwrap();
            let hi = calc.compute(income + step, deductions, status).unwrap();
            prop_assert!(lo >= 0.0);
            prop_assert!(hi >= lo, "tax fell from {} to {}", lo, hi);
        }
    }
}
