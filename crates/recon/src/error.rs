use std::fmt;
use std::path::PathBuf;

/// Fatal errors. Any of these stops the run before (or instead of) producing rows.
#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (empty keyword, inverted filter, etc.).
    ConfigValidation(String),
    /// A configured pattern key does not name any built-in rule.
    UnknownPatternKey { axis: &'static str, key: String },
    /// A required input folder is absent.
    MissingSource { role: String, path: PathBuf },
    /// Two Z-Read serial ranges claim the same invoice under the `reject` policy.
    OverlappingSerialRanges { first: String, second: String },
    /// Missing column in a CSV being totalled.
    CsvColumn { file: String, column: String },
    /// Amount parse error in a CSV being totalled.
    AmountParse { file: String, line: u64, value: String },
    /// IO error (file read, etc.).
    Io(String),
}

impl ReconError {
    /// True for the errors that mean "the configuration is wrong", as opposed
    /// to missing data or IO trouble.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::ConfigParse(_) | Self::ConfigValidation(_) | Self::UnknownPatternKey { .. }
        )
    }
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::UnknownPatternKey { axis, key } => {
                write!(f, "unknown {axis} key '{key}'")
            }
            Self::MissingSource { role, path } => {
                write!(f, "{role} folder not found: {}", path.display())
            }
            Self::OverlappingSerialRanges { first, second } => {
                write!(f, "serial ranges overlap: {first} and {second}")
            }
            Self::CsvColumn { file, column } => {
                write!(f, "'{file}': missing column '{column}'")
            }
            Self::AmountParse { file, line, value } => {
                write!(f, "'{file}', line {line}: cannot parse amount '{value}'")
            }
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}

/// Why a single document could not be turned into a record.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// A labelled Z-Read element was not found.
    MissingField { field: &'static str },
    /// A date token matched the layout but is not a calendar date.
    InvalidDate { value: String },
    /// An amount token matched the layout but did not convert.
    InvalidAmount { value: String },
    /// A serial number does not fit in 64 bits.
    InvalidSerial { value: String },
    /// Z-Read window ends before it starts.
    InvertedWindow,
    /// `ending - beginning + 1` is zero or negative.
    NonPositiveCount { beginning: u64, ending: u64 },
    /// No date token anywhere in the journal.
    NoDate,
    /// Qualifying receipts exist but none carries an amount.
    NoAmount,
    /// No configured header marker occurs in the journal.
    NoMatchingFormat,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField { field } => write!(f, "missing {field}"),
            Self::InvalidDate { value } => write!(f, "invalid date '{value}'"),
            Self::InvalidAmount { value } => write!(f, "invalid amount '{value}'"),
            Self::InvalidSerial { value } => write!(f, "invalid serial '{value}'"),
            Self::InvertedWindow => write!(f, "date range ends before it starts"),
            Self::NonPositiveCount { beginning, ending } => {
                write!(f, "ending SI {ending} precedes beginning SI {beginning}")
            }
            Self::NoDate => write!(f, "no date found"),
            Self::NoAmount => write!(f, "no Total Amount Due found on sales invoices"),
            Self::NoMatchingFormat => write!(f, "no known receipt header found"),
        }
    }
}

/// Per-document, recoverable. The document is dropped and listed in the report.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ParseFailure {
    pub source: String,
    pub reason: FailureReason,
}

impl ParseFailure {
    pub fn new(source: impl Into<String>, reason: FailureReason) -> Self {
        Self { source: source.into(), reason }
    }
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.source, self.reason)
    }
}

impl std::error::Error for ParseFailure {}
