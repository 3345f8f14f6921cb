use tracing::{info, warn};

use crate::aggregate::Aggregator;
use crate::config::{CorrelationConfig, ReconConfig};
use crate::error::{ParseFailure, ReconError};
use crate::evidence::compute_summary;
use crate::matcher::{reconcile, unmatched_journals};
use crate::model::{Document, GrandTotalRow, ReconInput, ReconMeta, ReconReport};
use crate::parse::DocumentParser;

/// Config resolved once: compiled patterns plus correlation settings.
#[derive(Debug, Clone)]
pub struct Reconciler {
    name: String,
    parser: DocumentParser,
    correlation: CorrelationConfig,
}

impl Reconciler {
    /// Fails on any configuration problem, before a document is looked at.
    pub fn new(config: &ReconConfig) -> Result<Self, ReconError> {
        config.validate()?;
        Ok(Self {
            name: config.name.clone(),
            parser: DocumentParser::new(config.registry()?),
            correlation: config.correlation.clone(),
        })
    }

    /// Parse every document, match, and classify. A document that fails to
    /// parse is listed in `skipped`; it never stops the batch.
    pub fn run(&self, input: &ReconInput) -> Result<ReconReport, ReconError> {
        input.filter.validate()?;

        let mut skipped: Vec<ParseFailure> = Vec::new();

        let zreads = collect(&input.zreads, &mut skipped, |d| {
            self.parser.parse_zread(&d.source, &d.text)
        });
        let journals = collect(&input.ejournals, &mut skipped, |d| {
            self.parser.parse_ejournal(&d.source, &d.text)
        });

        let empty_journals: Vec<String> = journals
            .iter()
            .filter(|j| j.is_empty())
            .map(|j| j.source_file.clone())
            .collect();

        let aggregator = Aggregator::new(input.filter, self.correlation.mode);
        let zreads = aggregator.retain_zreads(zreads);
        let index = aggregator.index(journals);

        let rows = reconcile(&zreads, &index, self.correlation.overlap)?;
        let unmatched_journals = unmatched_journals(&zreads, &index, input.filter);
        for file in &unmatched_journals {
            warn!(file = %file, "journal not claimed by any z-read");
        }
        let grand_total = GrandTotalRow::from_rows(&rows);
        let summary = compute_summary(&rows, &skipped, &empty_journals, &unmatched_journals);

        info!(
            mode = %index.mode(),
            zreads = summary.zread_files,
            matched = summary.matched,
            mismatched = summary.mismatched,
            skipped = summary.skipped,
            unmatched = summary.unmatched_journals,
            "reconciliation finished"
        );

        Ok(ReconReport {
            meta: ReconMeta {
                config_name: self.name.clone(),
                mode: index.mode(),
                filter: input.filter,
                engine_version: env!("CARGO_PKG_VERSION").to_string(),
                run_at: chrono::Utc::now().to_rfc3339(),
            },
            summary,
            rows,
            grand_total,
            skipped,
            empty_journals,
            unmatched_journals,
        })
    }
}

/// Run reconciliation per config. Returns rows, grand total and summary.
pub fn run(config: &ReconConfig, input: &ReconInput) -> Result<ReconReport, ReconError> {
    Reconciler::new(config)?.run(input)
}

fn collect<T>(
    documents: &[Document],
    skipped: &mut Vec<ParseFailure>,
    parse: impl Fn(&Document) -> Result<T, ParseFailure>,
) -> Vec<T> {
    let mut records = Vec::with_capacity(documents.len());
    for doc in documents {
        match parse(doc) {
            Ok(record) => records.push(record),
            Err(failure) => {
                warn!(file = %failure.source, reason = %failure.reason, "skipping document");
                skipped.push(failure);
            }
        }
    }
    records
}
