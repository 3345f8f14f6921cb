// zcheck CLI - Z-Read vs E-Journal reconciliation

mod compare;
mod exit_codes;
mod recon;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use zcheck_recon::ReconError;

use exit_codes::{exit_code_for, EXIT_RUNTIME, EXIT_SUCCESS, EXIT_USAGE};
use recon::ReconCommands;

#[derive(Parser)]
#[command(name = "zcheck")]
#[command(about = "Reconcile register Z-Read reports against E-Journal exports")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Z-Read vs E-Journal reconciliation
    Recon {
        #[command(subcommand)]
        command: ReconCommands,
    },

    /// Compare the total of one column across two CSV files
    #[command(after_help = "\
Examples:
  zcheck compare-csv pos.csv accounting.csv
  zcheck compare-csv pos.csv accounting.csv --column net_sales --report check.txt
  zcheck compare-csv pos.csv accounting.csv --json")]
    CompareCsv {
        /// First CSV file
        left: PathBuf,

        /// Second CSV file
        right: PathBuf,

        /// Column to sum in both files
        #[arg(long, default_value = "total")]
        column: String,

        /// Write the text report to this file
        #[arg(long)]
        report: Option<PathBuf>,

        /// Output JSON to stdout instead of the text report
        #[arg(long)]
        json: bool,
    },
}

/// Logs go to stderr; `RUST_LOG` overrides the default level.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "zcheck=warn".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    let result = match cli.command {
        Commands::Recon { command } => recon::cmd_recon(command),
        Commands::CompareCsv { left, right, column, report, json } => {
            compare::cmd_compare_csv(left, right, &column, report, json)
        }
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn runtime(msg: impl Into<String>) -> Self {
        Self::new(EXIT_RUNTIME, msg)
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<ReconError> for CliError {
    fn from(err: ReconError) -> Self {
        let hint = match &err {
            ReconError::UnknownPatternKey { .. } => {
                Some("run `zcheck recon patterns` to list the known keys".to_string())
            }
            ReconError::MissingSource { .. } => {
                Some("check --zread-dir / --ejournal-dir or the [sources] config section".to_string())
            }
            ReconError::OverlappingSerialRanges { .. } => {
                Some("set correlation.overlap to \"first_match\" or \"double_count\"".to_string())
            }
            _ => None,
        };
        Self { code: exit_code_for(&err), message: err.to_string(), hint }
    }
}
