//! Column totals: sum one numeric column in two CSV exports and compare.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::ReconError;
use crate::model::MatchResult;
use crate::money::parse_amount;

/// Sum `column` over every data row of `csv_data`. Blank cells count as zero.
pub fn column_total(file: &str, csv_data: &str, column: &str) -> Result<Decimal, ReconError> {
    let csv_data = csv_data.trim_start_matches('\u{feff}');
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_data.as_bytes());

    let idx = reader
        .headers()
        .map_err(|e| ReconError::Io(format!("'{file}': {e}")))?
        .iter()
        .position(|h| h.trim() == column)
        .ok_or_else(|| ReconError::CsvColumn { file: file.into(), column: column.into() })?;

    let mut total = Decimal::ZERO;
    for record in reader.records() {
        let record = record.map_err(|e| ReconError::Io(format!("'{file}': {e}")))?;
        let raw = record.get(idx).unwrap_or("").trim();
        if raw.is_empty() {
            continue;
        }
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        total = parse_amount(raw)
            .and_then(|value| total.checked_add(value))
            .ok_or_else(|| ReconError::AmountParse {
                file: file.into(),
                line,
                value: raw.into(),
            })?;
    }
    Ok(total)
}

#[derive(Debug, Clone, Serialize)]
pub struct ColumnTotals {
    pub column: String,
    pub left_file: String,
    pub right_file: String,
    pub left_total: Decimal,
    pub right_total: Decimal,
    pub result: MatchResult,
}

impl ColumnTotals {
    pub fn compare(
        column: &str,
        (left_file, left_data): (&str, &str),
        (right_file, right_data): (&str, &str),
    ) -> Result<Self, ReconError> {
        let left_total = column_total(left_file, left_data, column)?;
        let right_total = column_total(right_file, right_data, column)?;
        Ok(Self {
            column: column.into(),
            left_file: left_file.into(),
            right_file: right_file.into(),
            left_total,
            right_total,
            result: MatchResult::classify(left_total, right_total),
        })
    }

    pub fn render_report(&self) -> String {
        let verdict = match self.result {
            MatchResult::Match => "MATCH",
            MatchResult::Mismatch => "DO NOT MATCH",
        };
        format!(
            "CSV File Checker Report\n\
             ------------------------\n\
             Column Compared: {}\n\
             \n\
             File 1 Total ({}): {}\n\
             File 2 Total ({}): {}\n\
             \n\
             Result: {verdict}\n",
            self.column, self.left_file, self.left_total, self.right_file, self.right_total,
        )
    }
}
