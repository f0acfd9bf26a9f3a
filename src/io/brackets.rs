//! CSV bracket-table loader.
//!
//! Expected columns (case-insensitive, any order):
//!
//! ```text
//! filing_status,bracket_start,bracket_end,tax_rate
//! single,0,11600,0.10
//! single,11600,,0.12
//! ```
//!
//! An empty `bracket_end` (or `inf` / `infinity`) marks the unbounded top
//! bracket. Unlike the sample loader this one is strict: any bad row, any
//! missing column, or any filing status without rows aborts the load.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use crate::domain::{Bracket, FilingStatus};
use crate::error::{Result, TaxError};
use crate::io::{build_header_map, get_optional, get_required};
use crate::tax::BracketTable;

const REQUIRED_COLUMNS: [&str; 4] = ["filing_status", "bracket_start", "bracket_end", "tax_rate"];

/// Load a bracket table from a CSV file, requiring every supported status.
pub fn load_bracket_table(path: &Path) -> Result<BracketTable> {
    let file = File::open(path).map_err(|e| {
        TaxError::InvalidBracketTable(format!("Failed to open bracket CSV '{}': {e}", path.display()))
    })?;
    let table = read_bracket_table(file, &FilingStatus::ALL)?;
    tracing::info!(path = %path.display(), "loaded bracket table");
    Ok(table)
}

/// Parse a bracket table from any CSV reader and check `required` statuses.
pub fn read_bracket_table<R: Read>(source: R, required: &[FilingStatus]) -> Result<BracketTable> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader
        .headers()
        .map_err(|e| TaxError::InvalidBracketTable(format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    for column in REQUIRED_COLUMNS {
        if !header_map.contains_key(column) {
            return Err(TaxError::InvalidBracketTable(format!(
                "Missing required column: `{column}`"
            )));
        }
    }

    let mut schedules: BTreeMap<FilingStatus, Vec<Bracket>> = BTreeMap::new();
    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        let record = result
            .map_err(|e| TaxError::InvalidBracketTable(format!("line {line}: CSV parse error: {e}")))?;
        let (status, bracket) = parse_row(&record, &header_map)
            .map_err(|e| TaxError::InvalidBracketTable(format!("line {line}: {e}")))?;
        schedules.entry(status).or_default().push(bracket);
    }

    let table = BracketTable::new(schedules)?;
    table.ensure_covers(required)?;
    Ok(table)
}

fn parse_row(record: &StringRecord, header_map: &HashMap<String, usize>) -> std::result::Result<(FilingStatus, Bracket), String> {
    let raw_status = get_required(record, header_map, "filing_status")?;
    let status = FilingStatus::parse(raw_status)
        .ok_or_else(|| format!("Unknown filing status '{raw_status}'."))?;

    let lower = parse_amount(get_required(record, header_map, "bracket_start")?, "bracket_start")?;
    let upper = match get_optional(record, header_map, "bracket_end") {
        None => None,
        Some(s) if is_infinity(s) => None,
        Some(s) => Some(parse_amount(s, "bracket_end")?),
    };
    let rate = parse_amount(get_required(record, header_map, "tax_rate")?, "tax_rate")?;

    Ok((status, Bracket::new(lower, upper, rate)))
}

fn is_infinity(s: &str) -> bool {
    matches!(s.to_ascii_lowercase().as_str(), "inf" | "+inf" | "infinity" | "+infinity")
}

fn parse_amount(s: &str, name: &str) -> std::result::Result<f64, String> {
    let v = s
        .replace(',', "")
        .parse::<f64>()
        .map_err(|_| format!("Invalid `{name}` value '{s}'."))?;
    if v.is_finite() {
        Ok(v)
    } else {
        Err(format!("Non-finite `{name}` value '{s}'."))
    }
}
