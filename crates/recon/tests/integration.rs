use std::path::PathBuf;

use rust_decimal::Decimal;
use zcheck_recon::config::{CorrelationMode, OverlapPolicy};
use zcheck_recon::error::FailureReason;
use zcheck_recon::model::MatchResult;
use zcheck_recon::report::{self, COL_EJOURNAL_FILES, COL_MISSING_SI, COL_RESULT, COL_SI_COUNT};
use zcheck_recon::source::load_documents;
use zcheck_recon::{run, DateFilter, Document, ReconConfig, ReconError, ReconInput, ReconReport};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn d(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn day(s: &str) -> chrono::NaiveDate {
    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn load(journal_dir: &str, filter: DateFilter) -> ReconInput {
    let dir = fixtures_dir();
    ReconInput {
        zreads: load_documents("z-read", &dir.join("zread"), "txt").unwrap(),
        ejournals: load_documents("e-journal", &dir.join(journal_dir), "txt").unwrap(),
        filter,
    }
}

fn load_and_run(config: &ReconConfig, journal_dir: &str) -> ReconReport {
    run(config, &load(journal_dir, DateFilter::unbounded())).unwrap()
}

// -------------------------------------------------------------------------
// Folder runs
// -------------------------------------------------------------------------

#[test]
fn auto_mode_picks_serial_ranges() {
    let report = load_and_run(&ReconConfig::default(), "ejournal");

    assert_eq!(report.meta.mode, CorrelationMode::SerialRange);
    assert_eq!(report.rows.len(), 3);
    assert_eq!(report.summary.zread_files, 3);
    assert_eq!(report.summary.matched, 1);
    assert_eq!(report.summary.mismatched, 2);

    // Non-report text in the Z-Read folder is skipped, not fatal.
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].source, "notes.txt");
    assert_eq!(report.skipped[0].reason, FailureReason::MissingField { field: "date range" });
}

#[test]
fn count_mismatch_with_amount_match() {
    let report = load_and_run(&ReconConfig::default(), "ejournal");
    let row = &report.rows[0];

    assert_eq!(row.zread_file, "zread_0101.txt");
    assert_eq!(row.zread_count, 5);
    assert_eq!(row.ejournal_count, 2);
    assert_eq!(row.ejournal_total, d("1000.00"));
    assert!(!row.count_matches());
    assert_eq!(row.result, MatchResult::Match);

    let shown = report::display_row(row, "₱");
    assert_eq!(shown[COL_SI_COUNT], "2");
    assert_eq!(shown[COL_MISSING_SI], "0");
}

#[test]
fn one_centavo_apart_is_a_mismatch() {
    let report = load_and_run(&ReconConfig::default(), "ejournal");
    let row = &report.rows[1];

    assert_eq!(row.zread_total, d("250.75"));
    assert_eq!(row.ejournal_total, d("250.74"));
    assert_eq!(row.result, MatchResult::Mismatch);
    assert!(row.count_matches());
}

#[test]
fn uncovered_window_reads_none() {
    let report = load_and_run(&ReconConfig::default(), "ejournal");
    let row = &report.rows[2];

    assert!(row.ejournal_files.is_empty());
    assert_eq!(row.ejournal_total, Decimal::ZERO);
    assert_eq!(row.result, MatchResult::Mismatch);

    let shown = report::display_row(row, "₱");
    assert_eq!(shown[COL_EJOURNAL_FILES], "None");
    assert_eq!(shown[COL_RESULT], "MISMATCH");
}

#[test]
fn date_mode_gives_the_same_pairing() {
    let config = ReconConfig::from_toml("[correlation]\nmode = \"date_range\"\n").unwrap();
    let report = load_and_run(&config, "ejournal");

    assert_eq!(report.meta.mode, CorrelationMode::DateRange);
    let files: Vec<_> = report.rows.iter().map(|r| r.ejournal_files.clone()).collect();
    assert_eq!(
        files,
        vec![vec!["ej_0101.txt".to_string()], vec!["ej_0102.txt".to_string()], vec![]]
    );
}

#[test]
fn filter_keeps_overlapping_windows_only() {
    let filter = DateFilter::new(day("2024-01-02"), day("2024-01-02")).unwrap();
    let report = run(&ReconConfig::default(), &load("ejournal", filter)).unwrap();

    assert_eq!(report.rows.len(), 1);
    assert_eq!(report.rows[0].zread_file, "zread_0102.txt");
    assert_eq!(report.meta.filter, filter);
}

#[test]
fn grand_total_sums_rows() {
    let report = load_and_run(&ReconConfig::default(), "ejournal");
    let total = &report.grand_total;

    assert_eq!(total.zread_total, d("1330.75"));
    assert_eq!(total.ejournal_total, d("1250.74"));
    assert_eq!(total.zread_count, 8);
    assert_eq!(total.ejournal_count, 4);
    assert_eq!(total.result, MatchResult::Mismatch);

    let rows = report::display_rows(&report, "₱");
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[3][report::COL_DATE], report::GRAND_TOTAL_LABEL);
}

// -------------------------------------------------------------------------
// Pattern variants
// -------------------------------------------------------------------------

#[test]
fn asterisk_variant_is_selected_per_document() {
    let toml = std::fs::read_to_string(fixtures_dir().join("asterisk.recon.toml")).unwrap();
    let config = ReconConfig::from_toml(&toml).unwrap();
    let report = load_and_run(&config, "asterisk");

    let row = &report.rows[0];
    assert_eq!(row.ejournal_files, vec!["ej_0101.txt"]);
    assert_eq!(row.ejournal_total, d("1000.00"));
    assert_eq!(row.ejournal_count, 1);
    assert_eq!(row.result, MatchResult::Match);
    assert!(report.skipped.iter().all(|f| f.source == "notes.txt"));
}

#[test]
fn unknown_type_pattern_halts_before_parsing() {
    let toml = r#"
[[patterns]]
header_keyword = "TRIUMPH"
header_style = "labeled_header"
date_pattern = "long_date"
type_pattern = "slash_type"
"#;
    let err = ReconConfig::from_toml(toml).unwrap_err();
    assert!(err.is_configuration());
    assert_eq!(err.to_string(), "unknown type_pattern key 'slash_type'");
}

// -------------------------------------------------------------------------
// Serial range overlap
// -------------------------------------------------------------------------

fn overlap_input() -> ReconInput {
    let zread = |range: &str, net: &str, b: u64, e: u64| {
        format!("Date Range: {range} - {range}\nNET SALES {net}\nBEGINNING SI {b}\nENDING SI {e}\n")
    };
    let journal = |long: &str, si: u64, amount: &str| {
        format!("{long}\nTRIUMPH\nReceipt Type: SALES INVOICE\nSI #: {si}\n₱{amount}\nTotal Amount Due:\n")
    };
    ReconInput {
        zreads: vec![
            Document::new("z1.txt", zread("01/01/2024", "30.00", 100, 104)),
            Document::new("z2.txt", zread("01/02/2024", "20.00", 104, 110)),
        ],
        ejournals: vec![
            Document::new("a.txt", journal("January 01, 2024", 101, "10.00")),
            Document::new("b.txt", journal("January 02, 2024", 104, "20.00")),
        ],
        filter: DateFilter::unbounded(),
    }
}

fn overlap_config(policy: OverlapPolicy) -> ReconConfig {
    let mut config = ReconConfig::default();
    config.correlation.overlap = policy;
    config
}

#[test]
fn overlap_first_match() {
    let report = run(&overlap_config(OverlapPolicy::FirstMatch), &overlap_input()).unwrap();
    assert_eq!(report.rows[0].ejournal_files, vec!["a.txt", "b.txt"]);
    assert!(report.rows[1].ejournal_files.is_empty());
}

#[test]
fn overlap_double_count() {
    let report = run(&overlap_config(OverlapPolicy::DoubleCount), &overlap_input()).unwrap();
    assert_eq!(report.rows[0].ejournal_files, vec!["a.txt", "b.txt"]);
    assert_eq!(report.rows[1].ejournal_files, vec!["b.txt"]);
    assert_eq!(report.rows[1].result, MatchResult::Match);
}

#[test]
fn overlap_reject() {
    let err = run(&overlap_config(OverlapPolicy::Reject), &overlap_input()).unwrap_err();
    assert!(matches!(err, ReconError::OverlappingSerialRanges { .. }));
    assert!(!err.is_configuration());
}

// -------------------------------------------------------------------------
// Outputs
// -------------------------------------------------------------------------

#[test]
fn csv_and_json_outputs() {
    let report = load_and_run(&ReconConfig::default(), "ejournal");
    let rows = report::display_rows(&report, "₱");

    let out = tempfile::tempdir().unwrap();
    let path = out.path().join("report.csv");
    report::write_csv(&rows, std::fs::File::create(&path).unwrap()).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"\xEF\xBB\xBF"));
    let text = String::from_utf8(bytes[3..].to_vec()).unwrap();
    assert_eq!(text.lines().count(), 5);
    assert!(text.lines().last().unwrap().starts_with("GRAND TOTAL,"));

    let json: serde_json::Value = serde_json::from_str(&report::to_json(&report).unwrap()).unwrap();
    assert_eq!(json["meta"]["mode"], "serial_range");
    assert_eq!(json["rows"][0]["result"], "MATCH");
    assert_eq!(json["rows"][0]["ejournal_total"], "1000.00");
    assert_eq!(json["skipped"][0]["reason"]["kind"], "missing_field");
}

#[test]
fn missing_folder_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_documents("z-read", &dir.path().join("absent"), "txt").unwrap_err();
    assert!(matches!(err, ReconError::MissingSource { .. }));
}
