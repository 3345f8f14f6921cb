//! Document parser: raw Z-Read / E-Journal text → structured records.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use regex::{Captures, Regex};
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::{FailureReason, ParseFailure};
use crate::model::{EJournalRecord, ZReadRecord};
use crate::money::parse_amount;
use crate::patterns::{PatternRegistry, ZReadRules};

/// Applies one validated [`PatternRegistry`] to every document of a run.
#[derive(Debug, Clone, Default)]
pub struct DocumentParser {
    registry: PatternRegistry,
}

impl DocumentParser {
    pub fn new(registry: PatternRegistry) -> Self {
        Self { registry }
    }

    /// All four labelled elements must be present; anything less is a
    /// failure, never a partial record.
    pub fn parse_zread(&self, source: &str, text: &str) -> Result<ZReadRecord, ParseFailure> {
        let rules = &self.registry.zread;
        let fail = |reason| ParseFailure::new(source, reason);

        let range = rules
            .date_range
            .captures(text)
            .ok_or_else(|| fail(FailureReason::MissingField { field: "date range" }))?;
        let report_start = parse_date(&range[1], ZReadRules::DATE_FORMAT).map_err(fail)?;
        let report_end = parse_date(&range[2], ZReadRules::DATE_FORMAT).map_err(fail)?;

        let net_sales_token = first_group(&rules.net_sales, text)
            .ok_or_else(|| fail(FailureReason::MissingField { field: "net sales" }))?;
        let net_sales = amount(net_sales_token).map_err(fail)?;

        let beginning = first_group(&rules.beginning_si, text)
            .ok_or_else(|| fail(FailureReason::MissingField { field: "beginning SI" }))?;
        let ending = first_group(&rules.ending_si, text)
            .ok_or_else(|| fail(FailureReason::MissingField { field: "ending SI" }))?;

        let record = ZReadRecord::new(
            source,
            report_start,
            report_end,
            net_sales,
            serial(beginning).map_err(fail)?,
            serial(ending).map_err(fail)?,
        )?;

        debug!(
            file = source,
            start = %record.report_start,
            end = %record.report_end,
            net_sales = %record.net_sales,
            count = record.transaction_count,
            "parsed z-read"
        );
        Ok(record)
    }

    /// Qualifying receipts are sales invoices that are not reprints. A
    /// journal with none of them parses to an empty record (zero total, no
    /// serials); a journal with no date, or with qualifying receipts but no
    /// amount anywhere, is a failure.
    pub fn parse_ejournal(&self, source: &str, text: &str) -> Result<EJournalRecord, ParseFailure> {
        let fail = |reason| ParseFailure::new(source, reason);

        let format = self
            .registry
            .select(text)
            .ok_or_else(|| fail(FailureReason::NoMatchingFormat))?;

        // One date governs the whole document.
        let date_token = format.first_date_token(text).ok_or_else(|| fail(FailureReason::NoDate))?;
        let issue_date = parse_date(date_token, format.date_pattern.chrono_format()).map_err(fail)?;

        let qualifying: Vec<_> = format
            .split_receipts(text)
            .into_iter()
            .filter(|span| self.registry.is_qualifying(format, span))
            .collect();

        let mut total_amount = Decimal::ZERO;
        let mut amounts_found = 0usize;
        let mut serial_numbers = BTreeSet::new();

        for span in &qualifying {
            for token in format.amount_tokens(span) {
                total_amount = add_amount(total_amount, token).map_err(fail)?;
                amounts_found += 1;
            }
            if let Some(si) = self.registry.serial_number(span) {
                serial_numbers.insert(si);
            }
        }

        if !qualifying.is_empty() && amounts_found == 0 {
            return Err(fail(FailureReason::NoAmount));
        }

        let record = EJournalRecord {
            source_file: source.to_string(),
            issue_date,
            total_amount,
            serial_numbers,
            transaction_count: qualifying.len(),
        };

        debug!(
            file = source,
            format = %format.header_keyword,
            date = %record.issue_date,
            total = %record.total_amount,
            receipts = record.transaction_count,
            serials = record.serial_numbers.len(),
            "parsed e-journal"
        );
        Ok(record)
    }
}

fn first_group<'t>(re: &Regex, text: &'t str) -> Option<&'t str> {
    re.captures(text)
        .and_then(|c: Captures<'t>| c.get(1))
        .map(|m| m.as_str())
}

fn parse_date(token: &str, format: &str) -> Result<NaiveDate, FailureReason> {
    NaiveDate::parse_from_str(token.trim(), format)
        .map_err(|_| FailureReason::InvalidDate { value: token.to_string() })
}

fn amount(token: &str) -> Result<Decimal, FailureReason> {
    parse_amount(token).ok_or_else(|| FailureReason::InvalidAmount { value: token.to_string() })
}

/// A running total that would leave the decimal range rejects the token
/// that pushed it over.
fn add_amount(total: Decimal, token: &str) -> Result<Decimal, FailureReason> {
    total
        .checked_add(amount(token)?)
        .ok_or_else(|| FailureReason::InvalidAmount { value: token.to_string() })
}

fn serial(token: &str) -> Result<u64, FailureReason> {
    token
        .parse()
        .map_err(|_| FailureReason::InvalidSerial { value: token.to_string() })
}
