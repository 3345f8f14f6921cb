//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Meaning                                               |
//! |------|-------------------------------------------------------|
//! | 0    | Success; every row (or both column totals) MATCH      |
//! | 1    | At least one MISMATCH                                 |
//! | 2    | Usage error (bad arguments, unparsable date flag)     |
//! | 3    | Invalid configuration (parse, validation, pattern key)|
//! | 4    | A source folder or input file does not exist          |
//! | 5    | Runtime error (IO, overlapping serial ranges, CSV)    |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into [`exit_code_for`] or the relevant command

use zcheck_recon::ReconError;

/// Success - all compared totals agree.
pub const EXIT_SUCCESS: u8 = 0;

/// Mismatches found. Like `diff(1)`, exit 1 means "totals differ."
pub const EXIT_MISMATCH: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// Config could not be parsed, failed validation, or names an unknown
/// pattern key.
pub const EXIT_INVALID_CONFIG: u8 = 3;

/// Z-Read or E-Journal folder (or a compared CSV file) not found.
pub const EXIT_MISSING_SOURCE: u8 = 4;

/// Anything else that stopped the run.
pub const EXIT_RUNTIME: u8 = 5;

/// Map an engine error to its exit code.
pub fn exit_code_for(err: &ReconError) -> u8 {
    match err {
        e if e.is_configuration() => EXIT_INVALID_CONFIG,
        ReconError::MissingSource { .. } => EXIT_MISSING_SOURCE,
        _ => EXIT_RUNTIME,
    }
}
