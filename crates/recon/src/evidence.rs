use crate::error::ParseFailure;
use crate::model::{MatchResult, ReconSummary, ReconciliationRow};

/// Compute summary statistics from reconciled rows.
pub fn compute_summary(
    rows: &[ReconciliationRow],
    skipped: &[ParseFailure],
    empty_journals: &[String],
    unmatched_journals: &[String],
) -> ReconSummary {
    let matched = rows.iter().filter(|r| r.result == MatchResult::Match).count();

    ReconSummary {
        zread_files: rows.len(),
        matched,
        mismatched: rows.len() - matched,
        count_mismatches: rows.iter().filter(|r| !r.count_matches()).count(),
        skipped: skipped.len(),
        empty_journals: empty_journals.len(),
        unmatched_journals: unmatched_journals.len(),
    }
}
