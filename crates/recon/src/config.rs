use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ReconError;
use crate::model::DateFilter;
use crate::patterns::PatternRegistry;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Run configuration. Every section is optional; an empty document means
/// built-in defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReconConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub filter: Option<DateFilter>,
    /// Receipt printer formats, in priority order. Empty = built-in format.
    #[serde(default)]
    pub patterns: Vec<FormatSpec>,
    #[serde(default)]
    pub correlation: CorrelationConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

fn default_name() -> String {
    "Z-Read vs E-Journal".into()
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            sources: SourcesConfig::default(),
            filter: None,
            patterns: Vec::new(),
            correlation: CorrelationConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourcesConfig {
    #[serde(default)]
    pub zread_dir: Option<PathBuf>,
    #[serde(default)]
    pub ejournal_dir: Option<PathBuf>,
    /// File extension (without dot) of report files; matched case-insensitively.
    #[serde(default = "default_extension")]
    pub extension: String,
}

fn default_extension() -> String {
    "txt".into()
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            zread_dir: None,
            ejournal_dir: None,
            extension: default_extension(),
        }
    }
}

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

/// One receipt printer format as written in configuration. Keys are resolved
/// against the pattern registry; all but `amount_position` are required.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FormatSpec {
    pub header_keyword: String,
    pub header_style: String,
    pub date_pattern: String,
    pub type_pattern: String,
    #[serde(default)]
    pub amount_position: Option<String>,
}

// ---------------------------------------------------------------------------
// Correlation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CorrelationConfig {
    #[serde(default)]
    pub mode: CorrelationMode,
    #[serde(default)]
    pub overlap: OverlapPolicy,
}

/// How Z-Read windows pick up E-Journal records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationMode {
    /// Serial ranges when any journal carries serials, dates otherwise.
    #[default]
    Auto,
    DateRange,
    SerialRange,
}

impl std::fmt::Display for CorrelationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::DateRange => write!(f, "date_range"),
            Self::SerialRange => write!(f, "serial_range"),
        }
    }
}

/// What to do when two Z-Read serial ranges both claim a journal.
/// Only consulted in serial-range mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapPolicy {
    /// The first Z-Read (in discovery order) keeps the journal.
    #[default]
    FirstMatch,
    /// Every claiming Z-Read counts the journal.
    DoubleCount,
    /// Overlapping Z-Read ranges abort the run.
    Reject,
}

impl std::fmt::Display for OverlapPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FirstMatch => write!(f, "first_match"),
            Self::DoubleCount => write!(f, "double_count"),
            Self::Reject => write!(f, "reject"),
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
    #[serde(default)]
    pub csv: Option<PathBuf>,
    #[serde(default)]
    pub json: Option<PathBuf>,
}

fn default_currency_symbol() -> String {
    "₱".into()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            currency_symbol: default_currency_symbol(),
            csv: None,
            json: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if let Some(filter) = &self.filter {
            filter.validate()?;
        }

        if self.output.currency_symbol.trim().is_empty() {
            return Err(ReconError::ConfigValidation("currency_symbol must not be empty".into()));
        }

        if self.sources.extension.trim().trim_start_matches('.').is_empty() {
            return Err(ReconError::ConfigValidation("extension must not be empty".into()));
        }

        // Resolve every pattern key now so a typo stops the run before any
        // document is read.
        self.registry()?;
        Ok(())
    }

    /// Compile the pattern registry this config describes.
    pub fn registry(&self) -> Result<PatternRegistry, ReconError> {
        if self.patterns.is_empty() {
            Ok(PatternRegistry::builtin())
        } else {
            PatternRegistry::from_specs(&self.patterns)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
