//! Sample dataset CSV read/write.
//!
//! Columns: `income, deductions, filing_status, tax_liability`.
//!
//! Reading is lenient, in the same spirit as a spreadsheet import:
//! - `income` and `deductions` columns are required; `filing_status` defaults
//!   to single and `tax_liability` may be absent
//! - empty income cells are filled with the column mean, empty deduction cells
//!   with the column median
//! - rows that fail to parse are reported as [`RowError`]s and skipped

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use csv::StringRecord;

use crate::domain::{FilingStatus, TaxCase};
use crate::error::{Result, TaxError};
use crate::io::{build_header_map, get_optional};
use crate::math::{mean, median};

/// A row-level error encountered while reading.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Parsed dataset plus a report of what happened to the raw rows.
#[derive(Debug, Clone)]
pub struct SampleDataset {
    pub rows: Vec<TaxCase>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub imputed_income: usize,
    pub imputed_deductions: usize,
}

#[derive(Debug)]
struct PartialRow {
    income: Option<f64>,
    deductions: Option<f64>,
    filing_status: FilingStatus,
    tax_liability: Option<f64>,
}

pub fn load_sample_dataset(path: &Path) -> Result<SampleDataset> {
    let file = File::open(path)
        .map_err(|e| TaxError::DataSource(format!("Failed to open sample CSV '{}': {e}", path.display())))?;
    read_sample_dataset(file)
}

pub fn read_sample_dataset<R: Read>(source: R) -> Result<SampleDataset> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader
        .headers()
        .map_err(|e| TaxError::DataSource(format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    for column in ["income", "deductions"] {
        if !header_map.contains_key(column) {
            return Err(TaxError::DataSource(format!("Missing required column: `{column}`")));
        }
    }

    let mut partial = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        rows_read += 1;

        let outcome = result
            .map_err(|e| format!("CSV parse error: {e}"))
            .and_then(|record| parse_row(&record, &header_map));
        match outcome {
            Ok(row) => partial.push(row),
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    if partial.is_empty() {
        return Err(TaxError::DataSource("No valid rows in sample data.".to_string()));
    }

    let incomes: Vec<f64> = partial.iter().filter_map(|r| r.income).collect();
    let deductions: Vec<f64> = partial.iter().filter_map(|r| r.deductions).collect();
    let income_fill = mean(&incomes);
    let deduction_fill = median(&deductions);

    let mut imputed_income = 0;
    let mut imputed_deductions = 0;
    let mut rows = Vec::with_capacity(partial.len());

    for row in partial {
        let income = match row.income {
            Some(v) => v,
            None => {
                imputed_income += 1;
                income_fill.ok_or_else(|| TaxError::DataSource("Every `income` value is missing.".to_string()))?
            }
        };
        let deductions = match row.deductions {
            Some(v) => v,
            None => {
                imputed_deductions += 1;
                deduction_fill
                    .ok_or_else(|| TaxError::DataSource("Every `deductions` value is missing.".to_string()))?
            }
        };
        rows.push(TaxCase {
            income,
            deductions,
            filing_status: row.filing_status,
            tax_liability: row.tax_liability,
        });
    }

    if imputed_income + imputed_deductions > 0 {
        tracing::debug!(imputed_income, imputed_deductions, "filled missing sample values");
    }

    Ok(SampleDataset {
        rows,
        row_errors,
        rows_read,
        imputed_income,
        imputed_deductions,
    })
}

fn parse_row(record: &StringRecord, header_map: &HashMap<String, usize>) -> std::result::Result<PartialRow, String> {
    let income = parse_opt_amount(get_optional(record, header_map, "income"), "income")?;
    let deductions = parse_opt_amount(get_optional(record, header_map, "deductions"), "deductions")?;
    let tax_liability = parse_opt_amount(get_optional(record, header_map, "tax_liability"), "tax_liability")?;

    let filing_status = match get_optional(record, header_map, "filing_status") {
        Some(raw) => FilingStatus::parse(raw).ok_or_else(|| format!("Unknown filing status '{raw}'."))?,
        None => FilingStatus::Single,
    };

    Ok(PartialRow {
        income,
        deductions,
        filing_status,
        tax_liability,
    })
}

fn parse_opt_amount(s: Option<&str>, name: &str) -> std::result::Result<Option<f64>, String> {
    let Some(s) = s else { return Ok(None) };
    let v = s
        .parse::<f64>()
        .map_err(|_| format!("Invalid `{name}` value '{s}'."))?;
    if v.is_finite() && v >= 0.0 {
        Ok(Some(v))
    } else {
        Err(format!("`{name}` must be finite and non-negative (got '{s}')."))
    }
}

/// Write a dataset CSV.
pub fn write_sample_dataset(path: &Path, rows: &[TaxCase]) -> Result<()> {
    let file = File::create(path)
        .map_err(|e| TaxError::DataSource(format!("Failed to create dataset CSV '{}': {e}", path.display())))?;
    write_sample_rows(file, rows)
}

pub fn write_sample_rows<W: Write>(sink: W, rows: &[TaxCase]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(sink);
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| TaxError::DataSource(format!("Failed to write dataset row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| TaxError::DataSource(format!("Failed to flush dataset CSV: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn imputes_missing_values_and_reports_bad_rows() {
        let csv = "income,deductions,filing_status,tax_liability
50000,12000,single,4328
,10000,married,
70000,,head-of-household,
90000,20000,Single,
abc,1,single,
30000,5000,widowed,
";
        let data = read_sample_dataset(csv.as_bytes()).unwrap();
        assert_eq!(data.rows_read, 6);
        assert_eq!(data.rows.len(), 4);
        assert_eq!(data.row_errors.len(), 2);
        assert_eq!(data.row_errors[0].line, 6);
        assert_eq!(data.row_errors[1].line, 7);

        // Mean of 50000, 70000, 90000.
        assert_eq!(data.rows[1].income, 70_000.0);
        assert_eq!(data.imputed_income, 1);
        // Median of 12000, 10000, 20000.
        assert_eq!(data.rows[2].deductions, 12_000.0);
        assert_eq!(data.rows[2].filing_status, FilingStatus::HeadOfHousehold);
        assert_eq!(data.imputed_deductions, 1);

        assert_eq!(data.rows[0].tax_liability, Some(4_328.0));
        assert_eq!(data.rows[3].tax_liability, None);
    }

    #[test]
    fn status_column_is_optional() {
        let data = read_sample_dataset("income,deductions\n1000,100\n".as_bytes()).unwrap();
        assert_eq!(data.rows[0].filing_status, FilingStatus::Single);
    }

    #[test]
    fn requires_income_and_deductions_columns() {
        let err = read_sample_dataset("income,filing_status\n1000,single\n".as_bytes()).unwrap_err();
        assert!(matches!(err, TaxError::DataSource(ref m) if m.contains("deductions")));
    }

    #[test]
    fn written_rows_read_back() {
        let rows = vec![
            TaxCase {
                income: 50_000.0,
                deductions: 12_000.0,
                filing_status: FilingStatus::HeadOfHousehold,
                tax_liability: Some(4_100.5),
            },
            TaxCase::query(20_000.0, 1_000.0, FilingStatus::Married),
        ];
        let mut buf = Vec::new();
        write_sample_rows(&mut buf, &rows).unwrap();

        let text = String::from_utf8(buf.clone()).unwrap();
        assert!(text.starts_with("income,deductions,filing_status,tax_liability"), "{text}");
        assert!(text.contains("head_of_household"));

        let back = read_sample_dataset(buf.as_slice()).unwrap();
        assert_eq!(back.rows, rows);
    }
}
