use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::debug;

use crate::config::CorrelationMode;
use crate::model::{DateFilter, EJournalRecord, ZReadRecord};

/// Journals keyed for one correlation mode. Positions (`usize`) are the
/// journal's index in discovery order and stay stable for the whole run.
#[derive(Debug)]
pub enum JournalIndex {
    /// Journals grouped by issue date (one date may hold several files).
    ByDate {
        journals: Vec<EJournalRecord>,
        by_date: BTreeMap<NaiveDate, Vec<usize>>,
    },
    /// Journals tested one by one against each serial range.
    BySerial { journals: Vec<EJournalRecord> },
}

impl JournalIndex {
    pub fn mode(&self) -> CorrelationMode {
        match self {
            Self::ByDate { .. } => CorrelationMode::DateRange,
            Self::BySerial { .. } => CorrelationMode::SerialRange,
        }
    }

    pub fn journals(&self) -> &[EJournalRecord] {
        match self {
            Self::ByDate { journals, .. } | Self::BySerial { journals } => journals,
        }
    }

    /// Journals a Z-Read window claims, as positions in discovery order
    /// (date mode: ordered by date, then discovery).
    pub fn candidates(&self, zread: &ZReadRecord) -> Vec<usize> {
        match self {
            Self::ByDate { by_date, .. } => by_date
                .range(zread.report_start..=zread.report_end)
                .flat_map(|(_, ids)| ids.iter().copied())
                .collect(),
            Self::BySerial { journals } => journals
                .iter()
                .enumerate()
                .filter(|(_, j)| j.serial_numbers.iter().any(|si| zread.covers_serial(*si)))
                .map(|(i, _)| i)
                .collect(),
        }
    }
}

/// Applies the caller's date filter and builds the journal index.
#[derive(Debug, Clone, Copy)]
pub struct Aggregator {
    filter: DateFilter,
    mode: CorrelationMode,
}

impl Aggregator {
    pub fn new(filter: DateFilter, mode: CorrelationMode) -> Self {
        Self { filter, mode }
    }

    /// Keep Z-Reads whose window overlaps the filter, in discovery order.
    pub fn retain_zreads(&self, zreads: Vec<ZReadRecord>) -> Vec<ZReadRecord> {
        zreads
            .into_iter()
            .filter(|z| {
                let keep = self.filter.overlaps(z.report_start, z.report_end);
                if !keep {
                    debug!(file = %z.source_file, "z-read outside filter");
                }
                keep
            })
            .collect()
    }

    /// `auto` picks serial ranges as soon as one journal carries a serial.
    pub fn resolve_mode(&self, journals: &[EJournalRecord]) -> CorrelationMode {
        match self.mode {
            CorrelationMode::Auto if journals.iter().any(EJournalRecord::has_serials) => {
                CorrelationMode::SerialRange
            }
            CorrelationMode::Auto => CorrelationMode::DateRange,
            fixed => fixed,
        }
    }

    /// Index non-empty journals. The issue-date filter only applies when
    /// dates decide membership.
    pub fn index(&self, journals: Vec<EJournalRecord>) -> JournalIndex {
        let journals: Vec<_> = journals.into_iter().filter(|j| !j.is_empty()).collect();

        match self.resolve_mode(&journals) {
            CorrelationMode::SerialRange => JournalIndex::BySerial { journals },
            _ => {
                let journals: Vec<_> = journals
                    .into_iter()
                    .filter(|j| self.filter.contains(j.issue_date))
                    .collect();
                let mut by_date: BTreeMap<NaiveDate, Vec<usize>> = BTreeMap::new();
                for (i, j) in journals.iter().enumerate() {
                    by_date.entry(j.issue_date).or_default().push(i);
                }
                JournalIndex::ByDate { journals, by_date }
            }
        }
    }
}
