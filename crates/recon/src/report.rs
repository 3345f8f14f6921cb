//! Report formatter: reconciliation results → display rows, text table, CSV, JSON.

use std::io::Write;

use chrono::NaiveDate;
use indexmap::IndexMap;
use rust_decimal::Decimal;

use crate::error::ReconError;
use crate::model::{GrandTotalRow, ReconReport, ReconciliationRow};
use crate::money::{format_currency, parse_amount};

pub const COL_DATE: &str = "Date";
pub const COL_SERIAL_RANGE: &str = "Serial Range";
pub const COL_ZREAD_FILE: &str = "Z-Read File";
pub const COL_TRANS_COUNT: &str = "Trans Count";
pub const COL_ZREAD_AMOUNT: &str = "Z-Read Amount";
pub const COL_EJOURNAL_FILES: &str = "E-Journal File(s)";
pub const COL_SI_COUNT: &str = "SI Count";
pub const COL_MISSING_SI: &str = "Missing SI #";
pub const COL_EJOURNAL_TOTAL: &str = "E-Journal Total";
pub const COL_COUNT_CHECK: &str = "Count Check";
pub const COL_RESULT: &str = "Result";

/// Column order of every rendered form.
pub const COLUMNS: [&str; 11] = [
    COL_DATE,
    COL_SERIAL_RANGE,
    COL_ZREAD_FILE,
    COL_TRANS_COUNT,
    COL_ZREAD_AMOUNT,
    COL_EJOURNAL_FILES,
    COL_SI_COUNT,
    COL_MISSING_SI,
    COL_EJOURNAL_TOTAL,
    COL_COUNT_CHECK,
    COL_RESULT,
];

pub const GRAND_TOTAL_LABEL: &str = "GRAND TOTAL";
const NO_FILES: &str = "None";
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Column name → display string, in [`COLUMNS`] order.
pub type DisplayRow = IndexMap<&'static str, String>;

pub fn format_date(date: NaiveDate) -> String {
    date.format("%m/%d/%Y").to_string()
}

/// Reverse of the currency formatting used in display rows.
pub fn parse_display_amount(s: &str) -> Option<Decimal> {
    parse_amount(s)
}

fn count_check(matches: bool) -> String {
    if matches { "OK" } else { "MISMATCH" }.to_string()
}

pub fn display_row(row: &ReconciliationRow, currency_symbol: &str) -> DisplayRow {
    let files = if row.ejournal_files.is_empty() {
        NO_FILES.to_string()
    } else {
        row.ejournal_files.join(", ")
    };

    let mut out = DisplayRow::new();
    out.insert(
        COL_DATE,
        format!("{} - {}", format_date(row.report_start), format_date(row.report_end)),
    );
    out.insert(COL_SERIAL_RANGE, format!("{} - {}", row.beginning_serial, row.ending_serial));
    out.insert(COL_ZREAD_FILE, row.zread_file.clone());
    out.insert(COL_TRANS_COUNT, row.zread_count.to_string());
    out.insert(COL_ZREAD_AMOUNT, format_currency(row.zread_total, currency_symbol));
    out.insert(COL_EJOURNAL_FILES, files);
    out.insert(COL_SI_COUNT, row.ejournal_count.to_string());
    out.insert(COL_MISSING_SI, row.missing_serials().to_string());
    out.insert(COL_EJOURNAL_TOTAL, format_currency(row.ejournal_total, currency_symbol));
    out.insert(COL_COUNT_CHECK, count_check(row.count_matches()));
    out.insert(COL_RESULT, row.result.to_string());
    out
}

pub fn display_grand_total(total: &GrandTotalRow, currency_symbol: &str) -> DisplayRow {
    let mut out = DisplayRow::new();
    out.insert(COL_DATE, GRAND_TOTAL_LABEL.to_string());
    out.insert(COL_SERIAL_RANGE, String::new());
    out.insert(COL_ZREAD_FILE, String::new());
    out.insert(COL_TRANS_COUNT, total.zread_count.to_string());
    out.insert(COL_ZREAD_AMOUNT, format_currency(total.zread_total, currency_symbol));
    out.insert(COL_EJOURNAL_FILES, String::new());
    out.insert(COL_SI_COUNT, total.ejournal_count.to_string());
    out.insert(
        COL_MISSING_SI,
        total.ejournal_count.saturating_sub(total.serials_found).to_string(),
    );
    out.insert(COL_EJOURNAL_TOTAL, format_currency(total.ejournal_total, currency_symbol));
    out.insert(COL_COUNT_CHECK, count_check(total.count_matches()));
    out.insert(COL_RESULT, total.result.to_string());
    out
}

/// Every row followed by the grand total row.
pub fn display_rows(report: &ReconReport, currency_symbol: &str) -> Vec<DisplayRow> {
    report
        .rows
        .iter()
        .map(|r| display_row(r, currency_symbol))
        .chain(std::iter::once(display_grand_total(&report.grand_total, currency_symbol)))
        .collect()
}

fn cell<'a>(row: &'a DisplayRow, column: &str) -> &'a str {
    row.get(column).map(String::as_str).unwrap_or("")
}

fn pad_line(cells: &[&str], widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(c, w)| format!("{c}{}", " ".repeat(w.saturating_sub(c.chars().count()))))
        .collect();
    padded.join("  ").trim_end().to_string()
}

/// Fixed-width plain-text table with a header rule.
pub fn render_table(rows: &[DisplayRow]) -> String {
    let mut widths: Vec<usize> = COLUMNS.iter().map(|c| c.chars().count()).collect();
    for row in rows {
        for (i, col) in COLUMNS.iter().enumerate() {
            widths[i] = widths[i].max(cell(row, col).chars().count());
        }
    }

    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let rule: Vec<&str> = rule.iter().map(String::as_str).collect();

    let mut out = pad_line(&COLUMNS, &widths);
    out.push('\n');
    out.push_str(&pad_line(&rule, &widths));
    out.push('\n');
    for row in rows {
        let cells: Vec<&str> = COLUMNS.iter().map(|c| cell(row, c)).collect();
        out.push_str(&pad_line(&cells, &widths));
        out.push('\n');
    }
    out
}

/// CSV with a UTF-8 byte-order mark, header always written.
pub fn write_csv<W: Write>(rows: &[DisplayRow], mut writer: W) -> Result<(), ReconError> {
    writer
        .write_all(UTF8_BOM)
        .map_err(|e| ReconError::Io(format!("CSV write error: {e}")))?;

    let mut csv_writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    csv_writer
        .write_record(COLUMNS)
        .map_err(|e| ReconError::Io(format!("CSV write error: {e}")))?;
    for row in rows {
        let record = COLUMNS.iter().map(|c| cell(row, c));
        csv_writer
            .write_record(record)
            .map_err(|e| ReconError::Io(format!("CSV write error: {e}")))?;
    }
    csv_writer
        .flush()
        .map_err(|e| ReconError::Io(format!("CSV write error: {e}")))?;
    Ok(())
}

pub fn to_csv_bytes(rows: &[DisplayRow]) -> Result<Vec<u8>, ReconError> {
    let mut buf = Vec::new();
    write_csv(rows, &mut buf)?;
    Ok(buf)
}

pub fn to_json(report: &ReconReport) -> Result<String, ReconError> {
    serde_json::to_string_pretty(report)
        .map_err(|e| ReconError::Io(format!("JSON serialization error: {e}")))
}
