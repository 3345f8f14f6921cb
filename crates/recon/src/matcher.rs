use rust_decimal::Decimal;
use tracing::debug;

use crate::aggregate::JournalIndex;
use crate::config::{CorrelationMode, OverlapPolicy};
use crate::error::ReconError;
use crate::model::{DateFilter, MatchResult, ReconciliationRow, ZReadRecord};

/// Build one row per Z-Read, in Z-Read discovery order.
///
/// Date-range mode always counts a journal for every window that covers its
/// date. Serial-range mode follows `overlap` when windows compete.
pub fn reconcile(
    zreads: &[ZReadRecord],
    index: &JournalIndex,
    overlap: OverlapPolicy,
) -> Result<Vec<ReconciliationRow>, ReconError> {
    let serial_mode = index.mode() == CorrelationMode::SerialRange;

    if serial_mode && overlap == OverlapPolicy::Reject {
        check_serial_overlaps(zreads)?;
    }

    let journals = index.journals();
    let mut claimed = vec![false; journals.len()];
    let mut rows = Vec::with_capacity(zreads.len());

    for z in zreads {
        let mut ids = index.candidates(z);
        if serial_mode && overlap == OverlapPolicy::FirstMatch {
            ids.retain(|&i| !claimed[i]);
        }
        for &i in &ids {
            claimed[i] = true;
        }

        let matched: Vec<_> = ids.iter().map(|&i| &journals[i]).collect();
        let ejournal_total = matched
            .iter()
            .fold(Decimal::ZERO, |acc, j| acc.saturating_add(j.total_amount));
        let ejournal_count = matched
            .iter()
            .fold(0usize, |acc, j| acc.saturating_add(j.transaction_count));
        let serials_found = matched
            .iter()
            .fold(0usize, |acc, j| acc.saturating_add(j.serial_numbers.len()));
        let result = MatchResult::classify(z.net_sales, ejournal_total);

        debug!(
            file = %z.source_file,
            journals = matched.len(),
            zread_total = %z.net_sales,
            ejournal_total = %ejournal_total,
            %result,
            "reconciled z-read"
        );

        rows.push(ReconciliationRow {
            zread_file: z.source_file.clone(),
            report_start: z.report_start,
            report_end: z.report_end,
            beginning_serial: z.beginning_serial,
            ending_serial: z.ending_serial,
            zread_total: z.net_sales,
            zread_count: z.transaction_count,
            ejournal_files: matched.iter().map(|j| j.source_file.clone()).collect(),
            ejournal_total,
            ejournal_count,
            serials_found,
            result,
        });
    }

    Ok(rows)
}

/// Journals with sales inside `filter` that no Z-Read window selects, in
/// discovery order.
///
/// Under every overlap policy a journal that is some Z-Read's candidate ends
/// up on a row, so these are exactly the sales missing from the report.
pub fn unmatched_journals(
    zreads: &[ZReadRecord],
    index: &JournalIndex,
    filter: DateFilter,
) -> Vec<String> {
    let journals = index.journals();
    let mut selected = vec![false; journals.len()];
    for z in zreads {
        for i in index.candidates(z) {
            selected[i] = true;
        }
    }
    journals
        .iter()
        .zip(selected)
        .filter(|(j, hit)| !hit && filter.contains(j.issue_date))
        .map(|(j, _)| j.source_file.clone())
        .collect()
}

/// Reject any two Z-Reads whose serial ranges share an invoice.
fn check_serial_overlaps(zreads: &[ZReadRecord]) -> Result<(), ReconError> {
    let mut sorted: Vec<&ZReadRecord> = zreads.iter().collect();
    sorted.sort_by_key(|z| (z.beginning_serial, z.ending_serial));

    for pair in sorted.windows(2) {
        if pair[0].serial_overlaps(pair[1]) {
            return Err(ReconError::OverlappingSerialRanges {
                first: describe(pair[0]),
                second: describe(pair[1]),
            });
        }
    }
    Ok(())
}

fn describe(z: &ZReadRecord) -> String {
    format!("{} ({}-{})", z.source_file, z.beginning_serial, z.ending_serial)
}
