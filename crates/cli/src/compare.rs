//! `zcheck compare-csv`: column totals of two CSV exports.

use std::path::{Path, PathBuf};

use zcheck_recon::model::MatchResult;
use zcheck_recon::totals::ColumnTotals;

use crate::exit_codes::{EXIT_MISMATCH, EXIT_MISSING_SOURCE};
use crate::CliError;

fn read_input(path: &Path) -> Result<String, CliError> {
    if !path.is_file() {
        return Err(CliError::new(EXIT_MISSING_SOURCE, format!("file not found: {}", path.display())));
    }
    let bytes = std::fs::read(path)
        .map_err(|e| CliError::runtime(format!("cannot read {}: {e}", path.display())))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

pub fn cmd_compare_csv(
    left: PathBuf,
    right: PathBuf,
    column: &str,
    report_path: Option<PathBuf>,
    json_output: bool,
) -> Result<(), CliError> {
    let left_data = read_input(&left)?;
    let right_data = read_input(&right)?;
    let (left_name, right_name) = (display_name(&left), display_name(&right));

    let totals = ColumnTotals::compare(
        column,
        (left_name.as_str(), left_data.as_str()),
        (right_name.as_str(), right_data.as_str()),
    )?;
    let text = totals.render_report();

    if let Some(ref path) = report_path {
        std::fs::write(path, &text)
            .map_err(|e| CliError::runtime(format!("cannot write report: {e}")))?;
        eprintln!("wrote {}", path.display());
    }

    if json_output {
        let json_str = serde_json::to_string_pretty(&totals)
            .map_err(|e| CliError::runtime(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    } else {
        print!("{text}");
    }

    if totals.result == MatchResult::Mismatch {
        return Err(CliError::new(EXIT_MISMATCH, "column totals do not match"));
    }
    Ok(())
}
