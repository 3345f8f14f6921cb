//! Pattern registry: the closed set of textual rules used to pull records
//! out of Z-Read and E-Journal text.
//!
//! Each receipt printer format is described by one [`ReceiptFormat`]: a
//! header keyword plus one named strategy per axis (header style, date
//! pattern, type pattern, amount position). Strategies are selected by key
//! from configuration; an unknown key is a hard error.

use regex::Regex;
use serde::Serialize;

use crate::config::FormatSpec;
use crate::error::ReconError;

pub const DEFAULT_HEADER_KEYWORD: &str = "TRIUMPH";
pub const SALES_INVOICE_LABEL: &str = "SALES INVOICE";
pub const REPRINT_MARKER: &str = "re-print";
pub const AMOUNT_ANCHOR: &str = "Total Amount Due";
pub const SERIAL_LABEL: &str = "SI #";

// Amount with thousands separators and exactly two fraction digits.
const AMOUNT: &str = r"(\d[\d,]*\.\d{2})";

// ---------------------------------------------------------------------------
// Strategy axes
// ---------------------------------------------------------------------------

/// A closed set of named strategies selectable by configuration key.
pub trait PatternKey: Sized + Copy + 'static {
    /// Axis name used in error messages and listings.
    const AXIS: &'static str;
    const ALL: &'static [Self];

    fn key(self) -> &'static str;
}

/// Resolve a configuration key on one axis. No fallback.
pub fn lookup<T: PatternKey>(key: &str) -> Result<T, ReconError> {
    T::ALL
        .iter()
        .copied()
        .find(|v| v.key() == key.trim())
        .ok_or_else(|| ReconError::UnknownPatternKey { axis: T::AXIS, key: key.to_string() })
}

/// All keys on one axis, in declaration order.
pub fn keys<T: PatternKey>() -> Vec<&'static str> {
    T::ALL.iter().map(|v| v.key()).collect()
}

/// How a receipt's first line marks the start of a new receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderStyle {
    /// `TRIUMPH ...` at the start of a line.
    LabeledHeader,
    /// `*** TRIUMPH ***` on its own line.
    AsteriskHeader,
}

impl PatternKey for HeaderStyle {
    const AXIS: &'static str = "header_style";
    const ALL: &'static [Self] = &[Self::LabeledHeader, Self::AsteriskHeader];

    fn key(self) -> &'static str {
        match self {
            Self::LabeledHeader => "labeled_header",
            Self::AsteriskHeader => "asterisk_header",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DatePattern {
    /// `January 05, 2024`
    LongDate,
    /// `01/05/2024 13:45:10`
    NumericDateTime,
}

impl PatternKey for DatePattern {
    const AXIS: &'static str = "date_pattern";
    const ALL: &'static [Self] = &[Self::LongDate, Self::NumericDateTime];

    fn key(self) -> &'static str {
        match self {
            Self::LongDate => "long_date",
            Self::NumericDateTime => "numeric_date_time",
        }
    }
}

impl DatePattern {
    fn regex(self) -> &'static str {
        match self {
            Self::LongDate => concat!(
                r"\b((?:January|February|March|April|May|June|July|August|September|",
                r"October|November|December) \d{1,2}, \d{4})\b"
            ),
            Self::NumericDateTime => r"\b(\d{2}/\d{2}/\d{4})[ \t]+\d{1,2}:\d{2}(?::\d{2})?",
        }
    }

    /// chrono format string for the captured date text.
    pub fn chrono_format(self) -> &'static str {
        match self {
            Self::LongDate => "%B %d, %Y",
            Self::NumericDateTime => "%m/%d/%Y",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TypePattern {
    /// `Receipt Type: SALES INVOICE`
    ColonType,
    /// `*** SALES INVOICE ***`
    AsteriskType,
}

impl PatternKey for TypePattern {
    const AXIS: &'static str = "type_pattern";
    const ALL: &'static [Self] = &[Self::ColonType, Self::AsteriskType];

    fn key(self) -> &'static str {
        match self {
            Self::ColonType => "colon_type",
            Self::AsteriskType => "asterisk_type",
        }
    }
}

impl TypePattern {
    fn regex(self) -> &'static str {
        match self {
            Self::ColonType => r"(?i)Receipt[ \t]*Type[ \t]*:[ \t]*([^\r\n]+)",
            Self::AsteriskType => r"(?m)^[ \t]*\*+[ \t]*([^*\r\n]+?)[ \t]*\*+[ \t]*\r?$",
        }
    }
}

/// Where the receipt total sits relative to the `Total Amount Due` anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountPosition {
    /// `₱1,000.00` then `Total Amount Due:` (same line or the line above).
    Preceding,
    /// `Total Amount Due: ₱1,000.00`
    Following,
}

impl PatternKey for AmountPosition {
    const AXIS: &'static str = "amount_position";
    const ALL: &'static [Self] = &[Self::Preceding, Self::Following];

    fn key(self) -> &'static str {
        match self {
            Self::Preceding => "preceding",
            Self::Following => "following",
        }
    }
}

impl AmountPosition {
    fn regex(self) -> String {
        let anchor = regex::escape(AMOUNT_ANCHOR);
        match self {
            Self::Preceding => format!(r"{AMOUNT}[ \t]*(?:\r?\n[ \t]*)?{anchor}"),
            Self::Following => format!(r"{anchor}[ \t]*:?[ \t]*[^\d\s]{{0,3}}[ \t]*{AMOUNT}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Compiled formats
// ---------------------------------------------------------------------------

/// One source printer format with its rules compiled.
#[derive(Debug, Clone)]
pub struct ReceiptFormat {
    pub header_keyword: String,
    pub header_style: HeaderStyle,
    pub date_pattern: DatePattern,
    pub type_pattern: TypePattern,
    pub amount_position: AmountPosition,
    anchor_re: Regex,
    date_re: Regex,
    type_re: Regex,
    amount_re: Regex,
}

impl ReceiptFormat {
    pub fn new(
        header_keyword: &str,
        header_style: HeaderStyle,
        date_pattern: DatePattern,
        type_pattern: TypePattern,
        amount_position: AmountPosition,
    ) -> Result<Self, ReconError> {
        let keyword = header_keyword.trim();
        if keyword.is_empty() {
            return Err(ReconError::ConfigValidation("header_keyword must not be empty".into()));
        }
        let escaped = regex::escape(keyword);
        let anchor = match header_style {
            HeaderStyle::LabeledHeader => format!(r"(?m)^[ \t]*{escaped}"),
            HeaderStyle::AsteriskHeader => {
                format!(r"(?m)^[ \t]*\*+[ \t]*{escaped}[^*\r\n]*\*+")
            }
        };

        Ok(Self {
            header_keyword: keyword.to_string(),
            header_style,
            date_pattern,
            type_pattern,
            amount_position,
            anchor_re: compile(&anchor)?,
            date_re: compile(date_pattern.regex())?,
            type_re: compile(type_pattern.regex())?,
            amount_re: compile(&amount_position.regex())?,
        })
    }

    /// Resolve a configured format. Every key must name a built-in rule.
    pub fn from_spec(spec: &FormatSpec) -> Result<Self, ReconError> {
        let amount_position = match spec.amount_position.as_deref() {
            Some(key) => lookup(key)?,
            None => AmountPosition::Preceding,
        };
        Self::new(
            &spec.header_keyword,
            lookup(&spec.header_style)?,
            lookup(&spec.date_pattern)?,
            lookup(&spec.type_pattern)?,
            amount_position,
        )
    }

    /// Built-in format of the original merchant.
    pub fn builtin() -> Self {
        Self::new(
            DEFAULT_HEADER_KEYWORD,
            HeaderStyle::LabeledHeader,
            DatePattern::LongDate,
            TypePattern::ColonType,
            AmountPosition::Preceding,
        )
        .expect("built-in receipt format compiles")
    }

    /// True when this format's header marker occurs in `text`.
    pub fn recognizes(&self, text: &str) -> bool {
        self.anchor_re.is_match(text)
    }

    /// Split `text` into receipt spans. Each span starts with its header
    /// marker and runs to the next marker or end of text. Anything before the
    /// first marker is not a receipt.
    pub fn split_receipts<'t>(&self, text: &'t str) -> Vec<ReceiptSpan<'t>> {
        let anchors: Vec<_> = self.anchor_re.find_iter(text).collect();
        anchors
            .iter()
            .enumerate()
            .map(|(i, m)| {
                let end = anchors.get(i + 1).map(|next| next.start()).unwrap_or(text.len());
                ReceiptSpan {
                    text: &text[m.start()..end],
                    body_offset: m.end() - m.start(),
                }
            })
            .collect()
    }

    /// First date token in `text`, as matched (not yet parsed).
    pub fn first_date_token<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.date_re
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
    }

    /// Receipt-type label of a span, looked up after the header marker.
    pub fn receipt_type<'t>(&self, span: &ReceiptSpan<'t>) -> Option<&'t str> {
        self.type_re
            .captures(span.body())
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim())
    }

    /// Every `Total Amount Due` amount in a span, as printed.
    pub fn amount_tokens<'t>(&self, span: &ReceiptSpan<'t>) -> Vec<&'t str> {
        self.amount_re
            .captures_iter(span.text)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str())
            .collect()
    }
}

/// One candidate receipt inside a journal document.
#[derive(Debug, Clone, Copy)]
pub struct ReceiptSpan<'t> {
    /// Full span, header marker included.
    pub text: &'t str,
    body_offset: usize,
}

impl<'t> ReceiptSpan<'t> {
    /// Span text after the header marker.
    pub fn body(&self) -> &'t str {
        &self.text[self.body_offset..]
    }
}

fn compile(pattern: &str) -> Result<Regex, ReconError> {
    Regex::new(pattern).map_err(|e| ReconError::ConfigValidation(format!("bad pattern: {e}")))
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Fixed Z-Read layout rules.
#[derive(Debug, Clone)]
pub struct ZReadRules {
    pub date_range: Regex,
    pub net_sales: Regex,
    pub beginning_si: Regex,
    pub ending_si: Regex,
}

impl ZReadRules {
    fn new() -> Result<Self, ReconError> {
        Ok(Self {
            date_range: compile(r"Date Range:\s*(\d{2}/\d{2}/\d{4})\s*-\s*(\d{2}/\d{2}/\d{4})")?,
            net_sales: compile(&format!(r"NET SALES[ \t]*:?[ \t]*[^\d\s]{{0,3}}[ \t]*{AMOUNT}"))?,
            beginning_si: compile(r"BEGINNING SI[ \t]*#?[ \t]*:?[ \t]*(\d+)")?,
            ending_si: compile(r"ENDING SI[ \t]*#?[ \t]*:?[ \t]*(\d+)")?,
        })
    }

    /// Z-Read dates are always `MM/DD/YYYY`.
    pub const DATE_FORMAT: &'static str = "%m/%d/%Y";
}

/// All rules the parser needs, validated once and shared by every document.
#[derive(Debug, Clone)]
pub struct PatternRegistry {
    formats: Vec<ReceiptFormat>,
    serial_re: Regex,
    pub zread: ZReadRules,
}

impl PatternRegistry {
    /// Build from an ordered list of formats. Earlier formats win when a
    /// document carries more than one header marker.
    pub fn new(formats: Vec<ReceiptFormat>) -> Result<Self, ReconError> {
        if formats.is_empty() {
            return Err(ReconError::ConfigValidation("at least one receipt format is required".into()));
        }
        let serial = format!(r"{}[ \t]*:?[ \t]*(\d+)", regex::escape(SERIAL_LABEL));
        Ok(Self {
            formats,
            serial_re: compile(&serial)?,
            zread: ZReadRules::new()?,
        })
    }

    pub fn from_specs(specs: &[FormatSpec]) -> Result<Self, ReconError> {
        let formats = specs
            .iter()
            .map(ReceiptFormat::from_spec)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(formats)
    }

    pub fn builtin() -> Self {
        Self::new(vec![ReceiptFormat::builtin()]).expect("built-in registry compiles")
    }

    pub fn formats(&self) -> &[ReceiptFormat] {
        &self.formats
    }

    /// Pick the format whose header marker occurs in `text`.
    pub fn select(&self, text: &str) -> Option<&ReceiptFormat> {
        self.formats.iter().find(|f| f.recognizes(text))
    }

    /// `SI #: 123` → 123. First serial in the span.
    pub fn serial_number(&self, span: &ReceiptSpan<'_>) -> Option<u64> {
        self.serial_re
            .captures(span.text)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }

    /// Sales invoice that is not a reprint.
    pub fn is_qualifying(&self, format: &ReceiptFormat, span: &ReceiptSpan<'_>) -> bool {
        let is_sales = format
            .receipt_type(span)
            .is_some_and(|label| label.eq_ignore_ascii_case(SALES_INVOICE_LABEL));
        is_sales && !span.text.to_lowercase().contains(REPRINT_MARKER)
    }
}

impl Default for PatternRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(style: &str, date: &str, ty: &str) -> FormatSpec {
        FormatSpec {
            header_keyword: "TRIUMPH".into(),
            header_style: style.into(),
            date_pattern: date.into(),
            type_pattern: ty.into(),
            amount_position: None,
        }
    }

    #[test]
    fn lookup_known_keys() {
        assert_eq!(lookup::<HeaderStyle>("asterisk_header").unwrap(), HeaderStyle::AsteriskHeader);
        assert_eq!(lookup::<DatePattern>("numeric_date_time").unwrap(), DatePattern::NumericDateTime);
        assert_eq!(lookup::<TypePattern>("colon_type").unwrap(), TypePattern::ColonType);
        assert_eq!(lookup::<AmountPosition>("following").unwrap(), AmountPosition::Following);
    }

    #[test]
    fn lookup_unknown_key_is_hard_error() {
        let err = lookup::<TypePattern>("dash_type").unwrap_err();
        match err {
            ReconError::UnknownPatternKey { axis, key } => {
                assert_eq!(axis, "type_pattern");
                assert_eq!(key, "dash_type");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn from_spec_rejects_any_bad_axis() {
        assert!(ReceiptFormat::from_spec(&spec("labeled_header", "long_date", "colon_type")).is_ok());
        assert!(ReceiptFormat::from_spec(&spec("boxed_header", "long_date", "colon_type")).is_err());
        assert!(ReceiptFormat::from_spec(&spec("labeled_header", "iso_date", "colon_type")).is_err());
        let mut s = spec("labeled_header", "long_date", "colon_type");
        s.amount_position = Some("below".into());
        assert!(ReceiptFormat::from_spec(&s).is_err());
    }

    #[test]
    fn keys_are_listed_in_order() {
        assert_eq!(keys::<HeaderStyle>(), vec!["labeled_header", "asterisk_header"]);
        assert_eq!(keys::<DatePattern>(), vec!["long_date", "numeric_date_time"]);
    }

    #[test]
    fn labeled_split_keeps_marker_and_drops_preamble() {
        let f = ReceiptFormat::builtin();
        let text = "E-JOURNAL EXPORT\nTRIUMPH CAFE\nSI #: 1\n  TRIUMPH CAFE\nSI #: 2\n";
        let spans = f.split_receipts(text);
        assert_eq!(spans.len(), 2);
        assert!(spans[0].text.starts_with("TRIUMPH CAFE"));
        assert!(spans[0].text.contains("SI #: 1"));
        assert!(!spans[0].text.contains("SI #: 2"));
        assert!(spans[1].text.trim_start().starts_with("TRIUMPH"));
    }

    #[test]
    fn asterisk_split_and_type() {
        let f = ReceiptFormat::from_spec(&spec("asterisk_header", "numeric_date_time", "asterisk_type"))
            .unwrap();
        let text = "*** TRIUMPH ***\n*** SALES INVOICE ***\nSI 5\n**** TRIUMPH ****\n** VOID **\n";
        let spans = f.split_receipts(text);
        assert_eq!(spans.len(), 2);
        assert_eq!(f.receipt_type(&spans[0]), Some("SALES INVOICE"));
        assert_eq!(f.receipt_type(&spans[1]), Some("VOID"));
    }

    #[test]
    fn labeled_header_ignores_mid_line_keyword() {
        let f = ReceiptFormat::builtin();
        let spans = f.split_receipts("TRIUMPH\nThank you for visiting TRIUMPH\n");
        assert_eq!(spans.len(), 1);
    }

    #[test]
    fn date_tokens() {
        let f = ReceiptFormat::builtin();
        assert_eq!(
            f.first_date_token("x\nMarch 03, 2024 10:00\nApril 01, 2024"),
            Some("March 03, 2024")
        );
        let g = ReceiptFormat::from_spec(&spec("labeled_header", "numeric_date_time", "colon_type"))
            .unwrap();
        assert_eq!(g.first_date_token("Printed 03/04/2024 09:15:00"), Some("03/04/2024"));
        assert_eq!(g.first_date_token("Printed 03/04/2024"), None);
    }

    #[test]
    fn amount_positions() {
        let pre = ReceiptFormat::builtin();
        let text = "TRIUMPH\n₱1,250.00\nTotal Amount Due:\n";
        let spans = pre.split_receipts(text);
        assert_eq!(pre.amount_tokens(&spans[0]), vec!["1,250.00"]);

        let mut s = spec("labeled_header", "long_date", "colon_type");
        s.amount_position = Some("following".into());
        let post = ReceiptFormat::from_spec(&s).unwrap();
        let text = "TRIUMPH\nTotal Amount Due: ₱99.50\n";
        let spans = post.split_receipts(text);
        assert_eq!(post.amount_tokens(&spans[0]), vec!["99.50"]);
    }

    #[test]
    fn qualifying_excludes_reprints_and_other_types() {
        let reg = PatternRegistry::builtin();
        let f = &reg.formats()[0];
        let text = "TRIUMPH\nReceipt Type: SALES INVOICE\n\
                    TRIUMPH\nReceipt Type: SALES INVOICE\n** RE-PRINT **\n\
                    TRIUMPH\nReceipt Type: VOID\n";
        let spans = f.split_receipts(text);
        let kept: Vec<bool> = spans.iter().map(|s| reg.is_qualifying(f, s)).collect();
        assert_eq!(kept, vec![true, false, false]);
    }

    #[test]
    fn serial_label_with_optional_colon() {
        let reg = PatternRegistry::builtin();
        let f = &reg.formats()[0];
        let spans = f.split_receipts("TRIUMPH\nSI #: 00123\nTRIUMPH\nSI # 77\nTRIUMPH\nno serial\n");
        let serials: Vec<_> = spans.iter().map(|s| reg.serial_number(s)).collect();
        assert_eq!(serials, vec![Some(123), Some(77), None]);
    }

    #[test]
    fn select_by_header_marker() {
        let a = ReceiptFormat::builtin();
        let b = ReceiptFormat::new(
            "BLUE MART",
            HeaderStyle::AsteriskHeader,
            DatePattern::NumericDateTime,
            TypePattern::AsteriskType,
            AmountPosition::Following,
        )
        .unwrap();
        let reg = PatternRegistry::new(vec![a, b]).unwrap();
        assert_eq!(reg.select("*** BLUE MART ***\n").unwrap().header_keyword, "BLUE MART");
        assert_eq!(reg.select("TRIUMPH\n").unwrap().header_keyword, "TRIUMPH");
        assert!(reg.select("nothing here").is_none());
    }

    #[test]
    fn empty_registry_rejected() {
        assert!(PatternRegistry::new(vec![]).is_err());
        assert!(ReceiptFormat::new(
            "  ",
            HeaderStyle::LabeledHeader,
            DatePattern::LongDate,
            TypePattern::ColonType,
            AmountPosition::Preceding,
        )
        .is_err());
    }
}
