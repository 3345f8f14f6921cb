//! `zcheck recon`: folder-driven Z-Read vs E-Journal reconciliation.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::Subcommand;
use zcheck_recon::config::CorrelationMode;
use zcheck_recon::patterns::{self, AmountPosition, DatePattern, HeaderStyle, PatternKey, TypePattern};
use zcheck_recon::report;
use zcheck_recon::source::load_documents;
use zcheck_recon::{DateFilter, ReconConfig, ReconInput, ReconReport, Reconciler};

use crate::exit_codes::EXIT_MISMATCH;
use crate::CliError;

#[derive(Subcommand)]
pub enum ReconCommands {
    /// Reconcile a Z-Read folder against an E-Journal folder
    #[command(after_help = "\
Examples:
  zcheck recon run --zread-dir zread/ --ejournal-dir ejournal/
  zcheck recon run --config branch.toml --from 2024-01-01 --to 2024-01-31
  zcheck recon run --config branch.toml --csv report.csv --output report.json
  zcheck recon run --zread-dir zread/ --ejournal-dir ejournal/ --json")]
    Run {
        /// Path to a .toml config file (built-in receipt format when omitted)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Folder of Z-Read report files (overrides sources.zread_dir)
        #[arg(long)]
        zread_dir: Option<PathBuf>,

        /// Folder of E-Journal files (overrides sources.ejournal_dir)
        #[arg(long)]
        ejournal_dir: Option<PathBuf>,

        /// First day to include (YYYY-MM-DD or MM/DD/YYYY)
        #[arg(long, value_parser = parse_date_arg)]
        from: Option<NaiveDate>,

        /// Last day to include (YYYY-MM-DD or MM/DD/YYYY)
        #[arg(long, value_parser = parse_date_arg)]
        to: Option<NaiveDate>,

        /// Correlation mode: auto, date_range or serial_range
        #[arg(long, value_parser = parse_mode_arg)]
        mode: Option<CorrelationMode>,

        /// Write the report as CSV (UTF-8 with BOM)
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Output JSON to stdout instead of the table
        #[arg(long)]
        json: bool,

        /// Write JSON output to file
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Validate a config file without reading any report
    #[command(after_help = "\
Examples:
  zcheck recon validate branch.toml")]
    Validate {
        /// Path to the .toml config file
        config: PathBuf,
    },

    /// List the pattern keys a config may use
    Patterns,
}

pub fn cmd_recon(cmd: ReconCommands) -> Result<(), CliError> {
    match cmd {
        ReconCommands::Run { config, zread_dir, ejournal_dir, from, to, mode, csv, json, output } => {
            let overrides = RunOverrides { zread_dir, ejournal_dir, from, to, mode, csv, output };
            cmd_recon_run(config, overrides, json)
        }
        ReconCommands::Validate { config } => cmd_recon_validate(config),
        ReconCommands::Patterns => cmd_recon_patterns(),
    }
}

fn parse_date_arg(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%m/%d/%Y"))
        .map_err(|_| format!("invalid date '{s}' (expected YYYY-MM-DD or MM/DD/YYYY)"))
}

fn parse_mode_arg(s: &str) -> Result<CorrelationMode, String> {
    match s.replace('-', "_").as_str() {
        "auto" => Ok(CorrelationMode::Auto),
        "date_range" => Ok(CorrelationMode::DateRange),
        "serial_range" => Ok(CorrelationMode::SerialRange),
        _ => Err(format!("unknown mode '{s}' (expected auto, date_range or serial_range)")),
    }
}

/// Command-line values that win over the config file.
struct RunOverrides {
    zread_dir: Option<PathBuf>,
    ejournal_dir: Option<PathBuf>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    mode: Option<CorrelationMode>,
    csv: Option<PathBuf>,
    output: Option<PathBuf>,
}

/// Read and parse a config file. Relative paths inside it are resolved
/// against the file's directory.
fn load_config(path: &Path) -> Result<ReconConfig, CliError> {
    let config_str = std::fs::read_to_string(path)
        .map_err(|e| CliError::usage(format!("cannot read config {}: {e}", path.display())))?;
    let mut config = ReconConfig::from_toml(&config_str)?;

    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let resolve = |p: Option<PathBuf>| p.map(|p| if p.is_relative() { base_dir.join(p) } else { p });
    config.sources.zread_dir = resolve(config.sources.zread_dir.take());
    config.sources.ejournal_dir = resolve(config.sources.ejournal_dir.take());
    config.output.csv = resolve(config.output.csv.take());
    config.output.json = resolve(config.output.json.take());
    Ok(config)
}

fn apply_overrides(config: &mut ReconConfig, o: RunOverrides) -> Result<(), CliError> {
    if o.zread_dir.is_some() {
        config.sources.zread_dir = o.zread_dir;
    }
    if o.ejournal_dir.is_some() {
        config.sources.ejournal_dir = o.ejournal_dir;
    }
    if let Some(mode) = o.mode {
        config.correlation.mode = mode;
    }
    if o.csv.is_some() {
        config.output.csv = o.csv;
    }
    if o.output.is_some() {
        config.output.json = o.output;
    }

    if o.from.is_some() || o.to.is_some() {
        let base = config.filter.unwrap_or_else(DateFilter::unbounded);
        let filter = DateFilter::new(o.from.unwrap_or(base.start), o.to.unwrap_or(base.end))
            .map_err(|e| CliError::usage(e.to_string()))?;
        config.filter = Some(filter);
    }
    Ok(())
}

fn cmd_recon_run(
    config_path: Option<PathBuf>,
    overrides: RunOverrides,
    json_output: bool,
) -> Result<(), CliError> {
    let mut config = match config_path {
        Some(ref path) => load_config(path)?,
        None => ReconConfig::default(),
    };
    apply_overrides(&mut config, overrides)?;

    // Patterns are resolved before any folder is read.
    let reconciler = Reconciler::new(&config)?;

    let zread_dir = config.sources.zread_dir.clone().ok_or_else(|| {
        CliError::usage("no Z-Read folder given").with_hint("pass --zread-dir or set sources.zread_dir")
    })?;
    let ejournal_dir = config.sources.ejournal_dir.clone().ok_or_else(|| {
        CliError::usage("no E-Journal folder given")
            .with_hint("pass --ejournal-dir or set sources.ejournal_dir")
    })?;

    let extension = &config.sources.extension;
    let input = ReconInput {
        zreads: load_documents("Z-Read", &zread_dir, extension)?,
        ejournals: load_documents("E-Journal", &ejournal_dir, extension)?,
        filter: config.filter.unwrap_or_else(DateFilter::unbounded),
    };

    let result = reconciler.run(&input)?;
    let symbol = &config.output.currency_symbol;
    let rows = report::display_rows(&result, symbol);

    if let Some(ref path) = config.output.csv {
        let file = std::fs::File::create(path)
            .map_err(|e| CliError::runtime(format!("cannot write {}: {e}", path.display())))?;
        report::write_csv(&rows, file)?;
        eprintln!("wrote {}", path.display());
    }

    if json_output || config.output.json.is_some() {
        let json_str = report::to_json(&result)?;
        if let Some(ref path) = config.output.json {
            std::fs::write(path, &json_str)
                .map_err(|e| CliError::runtime(format!("cannot write output: {e}")))?;
            eprintln!("wrote {}", path.display());
        }
        if json_output {
            println!("{json_str}");
        }
    }

    if !json_output {
        print!("{}", report::render_table(&rows));
    }

    print_summary(&result);

    if !result.summary.all_matched() {
        return Err(CliError::new(EXIT_MISMATCH, "mismatches found"));
    }
    Ok(())
}

/// Human summary to stderr.
fn print_summary(result: &ReconReport) {
    let s = &result.summary;
    eprintln!(
        "{} ({}): {} Z-Read reports, {} match, {} mismatch, {} count mismatches",
        result.meta.config_name, result.meta.mode, s.zread_files, s.matched, s.mismatched, s.count_mismatches,
    );
    for failure in &result.skipped {
        eprintln!("skipped {failure}");
    }
    if !result.empty_journals.is_empty() {
        eprintln!("no sales invoices in: {}", result.empty_journals.join(", "));
    }
    if !result.unmatched_journals.is_empty() {
        eprintln!("not claimed by any Z-Read: {}", result.unmatched_journals.join(", "));
    }
}

fn cmd_recon_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    let registry = config.registry()?;

    eprintln!(
        "valid: \"{}\" ({} receipt format(s), mode {}, overlap {})",
        config.name,
        registry.formats().len(),
        config.correlation.mode,
        config.correlation.overlap,
    );
    Ok(())
}

fn axis<T: PatternKey>() -> String {
    format!("{}: {}", T::AXIS, patterns::keys::<T>().join(", "))
}

fn cmd_recon_patterns() -> Result<(), CliError> {
    println!("{}", axis::<HeaderStyle>());
    println!("{}", axis::<DatePattern>());
    println!("{}", axis::<TypePattern>());
    println!("{}", axis::<AmountPosition>());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn no_overrides() -> RunOverrides {
        RunOverrides {
            zread_dir: None,
            ejournal_dir: None,
            from: None,
            to: None,
            mode: None,
            csv: None,
            output: None,
        }
    }

    #[test]
    fn date_arg_formats() {
        assert_eq!(parse_date_arg("2024-01-31").unwrap(), day(2024, 1, 31));
        assert_eq!(parse_date_arg("01/31/2024").unwrap(), day(2024, 1, 31));
        assert!(parse_date_arg("31/01/2024").is_err());
    }

    #[test]
    fn mode_arg_accepts_dashes() {
        assert_eq!(parse_mode_arg("serial-range").unwrap(), CorrelationMode::SerialRange);
        assert_eq!(parse_mode_arg("date_range").unwrap(), CorrelationMode::DateRange);
        assert!(parse_mode_arg("weekly").is_err());
    }

    #[test]
    fn flags_win_over_config() {
        let mut config = ReconConfig::from_toml(
            "[sources]\nzread_dir = \"z\"\n[filter]\nstart = \"2024-01-01\"\nend = \"2024-01-31\"\n",
        )
        .unwrap();
        let overrides = RunOverrides {
            zread_dir: Some(PathBuf::from("other")),
            to: Some(day(2024, 1, 15)),
            mode: Some(CorrelationMode::DateRange),
            ..no_overrides()
        };
        apply_overrides(&mut config, overrides).unwrap();

        assert_eq!(config.sources.zread_dir, Some(PathBuf::from("other")));
        assert_eq!(config.correlation.mode, CorrelationMode::DateRange);
        let filter = config.filter.unwrap();
        assert_eq!(filter.start, day(2024, 1, 1));
        assert_eq!(filter.end, day(2024, 1, 15));
    }

    #[test]
    fn inverted_flags_rejected() {
        let mut config = ReconConfig::default();
        let overrides = RunOverrides {
            from: Some(day(2024, 2, 1)),
            to: Some(day(2024, 1, 1)),
            ..no_overrides()
        };
        let err = apply_overrides(&mut config, overrides).unwrap_err();
        assert_eq!(err.code, crate::exit_codes::EXIT_USAGE);
    }

    #[test]
    fn config_paths_resolve_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("branch.toml");
        std::fs::write(&path, "[sources]\nzread_dir = \"zread\"\nejournal_dir = \"/abs/ej\"\n").unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.sources.zread_dir, Some(dir.path().join("zread")));
        assert_eq!(config.sources.ejournal_dir, Some(PathBuf::from("/abs/ej")));
    }
}
