use std::collections::BTreeSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::CorrelationMode;
use crate::error::{FailureReason, ParseFailure, ReconError};
use crate::money::within_tolerance;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Raw text of one report, tagged with where it came from.
#[derive(Debug, Clone)]
pub struct Document {
    pub source: String,
    pub text: String,
}

impl Document {
    pub fn new(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self { source: source.into(), text: text.into() }
    }
}

/// Inclusive calendar-date window supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct DateFilter {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateFilter {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ReconError> {
        let filter = Self { start, end };
        filter.validate()?;
        Ok(filter)
    }

    /// Accepts every date.
    pub fn unbounded() -> Self {
        Self { start: NaiveDate::MIN, end: NaiveDate::MAX }
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.start > self.end {
            return Err(ReconError::ConfigValidation(format!(
                "filter start {} is after filter end {}",
                self.start, self.end
            )));
        }
        Ok(())
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// True when `[start, end]` shares at least one day with the filter.
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        end >= self.start && start <= self.end
    }
}

/// Pre-loaded documents for one run.
#[derive(Debug, Clone)]
pub struct ReconInput {
    pub zreads: Vec<Document>,
    pub ejournals: Vec<Document>,
    pub filter: DateFilter,
}

// ---------------------------------------------------------------------------
// Parsed records
// ---------------------------------------------------------------------------

/// One register closing summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZReadRecord {
    pub source_file: String,
    pub report_start: NaiveDate,
    pub report_end: NaiveDate,
    pub net_sales: Decimal,
    pub beginning_serial: u64,
    pub ending_serial: u64,
    /// `ending_serial - beginning_serial + 1`, always >= 1.
    pub transaction_count: u64,
}

impl ZReadRecord {
    /// Rejects inverted windows and serial spans that cover no invoice.
    pub fn new(
        source_file: impl Into<String>,
        report_start: NaiveDate,
        report_end: NaiveDate,
        net_sales: Decimal,
        beginning_serial: u64,
        ending_serial: u64,
    ) -> Result<Self, ParseFailure> {
        let source_file = source_file.into();
        if report_end < report_start {
            return Err(ParseFailure::new(source_file, FailureReason::InvertedWindow));
        }
        if ending_serial < beginning_serial {
            return Err(ParseFailure::new(
                source_file,
                FailureReason::NonPositiveCount { beginning: beginning_serial, ending: ending_serial },
            ));
        }
        // 0..=u64::MAX spans one more invoice than u64 can count.
        let Some(transaction_count) = (ending_serial - beginning_serial).checked_add(1) else {
            return Err(ParseFailure::new(
                source_file,
                FailureReason::InvalidSerial { value: format!("{beginning_serial}-{ending_serial}") },
            ));
        };
        Ok(Self {
            source_file,
            report_start,
            report_end,
            net_sales,
            beginning_serial,
            ending_serial,
            transaction_count,
        })
    }

    pub fn covers_serial(&self, serial: u64) -> bool {
        self.beginning_serial <= serial && serial <= self.ending_serial
    }

    pub fn serial_overlaps(&self, other: &ZReadRecord) -> bool {
        self.beginning_serial <= other.ending_serial && other.beginning_serial <= self.ending_serial
    }
}

/// One journal document, summed over its qualifying sales invoices.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EJournalRecord {
    pub source_file: String,
    pub issue_date: NaiveDate,
    pub total_amount: Decimal,
    pub serial_numbers: BTreeSet<u64>,
    /// Qualifying receipts, including any whose serial could not be read.
    pub transaction_count: usize,
}

impl EJournalRecord {
    /// Journals without qualifying receipts carry no totals.
    pub fn is_empty(&self) -> bool {
        self.transaction_count == 0
    }

    pub fn has_serials(&self) -> bool {
        !self.serial_numbers.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchResult {
    Match,
    Mismatch,
}

impl MatchResult {
    /// MATCH iff the totals differ by strictly less than 0.01.
    pub fn classify(left: Decimal, right: Decimal) -> Self {
        if within_tolerance(left, right) {
            Self::Match
        } else {
            Self::Mismatch
        }
    }
}

impl std::fmt::Display for MatchResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Match => write!(f, "MATCH"),
            Self::Mismatch => write!(f, "MISMATCH"),
        }
    }
}

/// One Z-Read compared against the journals it claims.
#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationRow {
    pub zread_file: String,
    pub report_start: NaiveDate,
    pub report_end: NaiveDate,
    pub beginning_serial: u64,
    pub ending_serial: u64,
    pub zread_total: Decimal,
    pub zread_count: u64,
    pub ejournal_files: Vec<String>,
    pub ejournal_total: Decimal,
    pub ejournal_count: usize,
    /// Distinct serials read from the matched journals.
    pub serials_found: usize,
    pub result: MatchResult,
}

impl ReconciliationRow {
    pub fn count_matches(&self) -> bool {
        self.zread_count == self.ejournal_count as u64
    }

    /// Receipts counted without a readable serial.
    pub fn missing_serials(&self) -> usize {
        self.ejournal_count.saturating_sub(self.serials_found)
    }
}

/// Totals across every row of a run, classified on their own.
#[derive(Debug, Clone, Serialize)]
pub struct GrandTotalRow {
    pub zread_total: Decimal,
    pub zread_count: u64,
    pub ejournal_total: Decimal,
    pub ejournal_count: usize,
    pub serials_found: usize,
    pub result: MatchResult,
}

impl GrandTotalRow {
    /// Sums the rows' decimal totals (never their display strings).
    /// Sums saturate instead of overflowing.
    pub fn from_rows(rows: &[ReconciliationRow]) -> Self {
        let mut total = Self {
            zread_total: Decimal::ZERO,
            zread_count: 0,
            ejournal_total: Decimal::ZERO,
            ejournal_count: 0,
            serials_found: 0,
            result: MatchResult::Match,
        };
        for r in rows {
            total.zread_total = total.zread_total.saturating_add(r.zread_total);
            total.zread_count = total.zread_count.saturating_add(r.zread_count);
            total.ejournal_total = total.ejournal_total.saturating_add(r.ejournal_total);
            total.ejournal_count = total.ejournal_count.saturating_add(r.ejournal_count);
            total.serials_found = total.serials_found.saturating_add(r.serials_found);
        }
        total.result = MatchResult::classify(total.zread_total, total.ejournal_total);
        total
    }

    pub fn count_matches(&self) -> bool {
        self.zread_count == self.ejournal_count as u64
    }
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ReconSummary {
    pub zread_files: usize,
    pub matched: usize,
    pub mismatched: usize,
    pub count_mismatches: usize,
    pub skipped: usize,
    pub empty_journals: usize,
    pub unmatched_journals: usize,
}

impl ReconSummary {
    pub fn all_matched(&self) -> bool {
        self.mismatched == 0
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub config_name: String,
    /// Mode actually used (never `auto`).
    pub mode: CorrelationMode,
    pub filter: DateFilter,
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconReport {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    pub rows: Vec<ReconciliationRow>,
    pub grand_total: GrandTotalRow,
    /// Documents that did not yield a record.
    pub skipped: Vec<ParseFailure>,
    /// Journals parsed fine but without a qualifying sales invoice.
    pub empty_journals: Vec<String>,
    /// Journals with sales that no Z-Read window claimed.
    pub unmatched_journals: Vec<String>,
}
