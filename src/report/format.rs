//! Formatted terminal output for estimates and training runs.
//!
//! We keep formatting code in one place so the calculation and training code
//! stays free of presentation concerns.

use crate::app::pipeline::TrainingReport;
use crate::app::service::{Estimate, Prediction};

/// Format a dollar amount with thousands separators, e.g. `$4,328.00`.
pub fn format_money(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    let whole = (cents / 100).to_string();

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{sign}${grouped}.{:02}", cents % 100)
}

/// Side-by-side calculated vs predicted liability.
pub fn format_estimate(estimate: &Estimate) -> String {
    let case = &estimate.case;
    let mut out = String::new();

    out.push_str("=== taxsense - Tax Estimate ===\n");
    out.push_str(&format!(
        "Income: {} | Deductions: {} | Filing status: {}\n",
        format_money(case.income),
        format_money(case.deductions),
        case.filing_status.display_name()
    ));
    out.push_str(&format!(
        "Taxable income: {}\n\n",
        format_money((case.income - case.deductions).max(0.0))
    ));

    out.push_str(&format!("Bracket calculation: {:>14}\n", format_money(estimate.calculated)));
    match &estimate.prediction {
        Prediction::Available(p) => {
            out.push_str(&format!("Model prediction:    {:>14}\n", format_money(*p)));
            out.push_str(&format!(
                "Difference:          {:>14}\n",
                format_money(p - estimate.calculated)
            ));
        }
        Prediction::Unavailable(reason) => {
            out.push_str("Model prediction:    unavailable\n");
            out.push_str(&format!("  ({reason})\n"));
        }
    }

    out
}

/// Summary of a training run.
pub fn format_training_report(report: &TrainingReport) -> String {
    let q = report.quality();
    let mut out = String::new();

    out.push_str("=== taxsense - Training ===\n");
    out.push_str(&format!(
        "Rows: {} total | {} train",
        report.rows_total, report.rows_train
    ));
    if report.row_errors > 0 {
        out.push_str(&format!(" | {} skipped", report.row_errors));
    }
    out.push('\n');

    out.push_str(&format!("Estimator: {}\n", report.model.estimator.display_name()));
    out.push_str(&format!(
        "Coefficients (scaled): income={:.4}, deductions={:.4}, intercept={:.4}\n",
        report.model.coefficients[0], report.model.coefficients[1], report.model.intercept
    ));
    out.push_str(&format!(
        "Scaler: mean=[{:.2}, {:.2}] scale=[{:.2}, {:.2}]\n",
        report.scaler.mean[0], report.scaler.mean[1], report.scaler.scale[0], report.scaler.scale[1]
    ));
    out.push_str(&format!(
        "Fit: n={} rmse={} r2={:.4}\n",
        q.n,
        format_money(q.rmse),
        q.r2
    ));
    if let Some(h) = &report.holdout {
        out.push_str(&format!(
            "Holdout: n={} rmse={} mae={}\n",
            h.n,
            format_money(h.rmse),
            format_money(h.mae)
        ));
    }
    out.push_str(&format!(
        "Saved: {} , {}\n",
        report.paths.scaler.display(),
        report.paths.model.display()
    ));

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FilingStatus, TaxCase};

    #[test]
    fn money_grouping() {
        assert_eq!(format_money(4_328.0), "$4,328.00");
        assert_eq!(format_money(0.0), "$0.00");
        assert_eq!(format_money(1_234_567.891), "$1,234,567.89");
        assert_eq!(format_money(-990.5), "-$990.50");
        assert_eq!(format_money(999.999), "$1,000.00");
        assert_eq!(format_money(-0.001), "$0.00");
        assert_eq!(format_money(-0.02), "-$0.02");
    }

    #[test]
    fn estimate_mentions_unavailable_model() {
        let estimate = Estimate {
            case: TaxCase {
                income: 50_000.0,
                deductions: 12_000.0,
                filing_status: FilingStatus::Single,
                tax_liability: Some(4_328.0),
            },
            calculated: 4_328.0,
            prediction: Prediction::Unavailable("no model".to_string()),
        };
        let text = format_estimate(&estimate);
        assert!(text.contains("$4,328.00"), "{text}");
        assert!(text.contains("$38,000.00"), "{text}");
        assert!(text.contains("unavailable"), "{text}");
    }
}
