//! Amount parsing, formatting and the match tolerance.

use rust_decimal::{Decimal, RoundingStrategy};

/// Two totals tie when they differ by strictly less than one centavo.
pub const TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// `|a - b| < 0.01`. Exactly 0.01 apart is a mismatch, and so is a
/// difference too large to represent.
pub fn within_tolerance(a: Decimal, b: Decimal) -> bool {
    a.checked_sub(b).is_some_and(|diff| diff.abs() < TOLERANCE)
}

/// Parse a printed amount like `1,234.56`, `₱1,234.56` or `-₱12.00`.
///
/// Thousands separators and any non-numeric prefix (currency symbol) are
/// stripped before conversion.
pub fn parse_amount(s: &str) -> Option<Decimal> {
    let s = s.trim();
    let negative = s.starts_with('-') || (s.starts_with('(') && s.ends_with(')'));
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if cleaned.is_empty() || cleaned.starts_with('.') || cleaned.matches('.').count() > 1 {
        return None;
    }
    let value: Decimal = cleaned.parse().ok()?;
    Some(if negative { -value } else { value })
}

/// Format `1234.5` as `₱1,234.50` (sign before the symbol).
pub fn format_currency(value: Decimal, symbol: &str) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    let digits = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));
    format!("{sign}{symbol}{}.{frac_part}", group_thousands(int_part))
}

fn group_thousands(int_part: &str) -> String {
    let len = int_part.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn tolerance_survives_extreme_totals() {
        assert!(!within_tolerance(Decimal::MAX, Decimal::MIN));
        assert!(within_tolerance(Decimal::MAX, Decimal::MAX));
    }

    #[test]
    fn parse_strips_separators_and_symbol() {
        assert_eq!(parse_amount("1,234.56"), Some(d("1234.56")));
        assert_eq!(parse_amount("₱12,345,678.90"), Some(d("12345678.90")));
        assert_eq!(parse_amount("-₱12.00"), Some(d("-12.00")));
        assert_eq!(parse_amount("(₱5.25)"), Some(d("-5.25")));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("₱"), None);
        assert_eq!(parse_amount("1.2.3"), None);
    }

    #[test]
    fn format_groups_thousands() {
        assert_eq!(format_currency(d("0"), "₱"), "₱0.00");
        assert_eq!(format_currency(d("999.5"), "₱"), "₱999.50");
        assert_eq!(format_currency(d("1000"), "₱"), "₱1,000.00");
        assert_eq!(format_currency(d("1234567.891"), "$"), "$1,234,567.89");
        assert_eq!(format_currency(d("-1500.005"), "₱"), "-₱1,500.01");
    }

    #[test]
    fn negative_zero_has_no_sign() {
        assert_eq!(format_currency(d("-0.001"), "₱"), "₱0.00");
    }

    #[test]
    fn tolerance_is_strict() {
        assert!(within_tolerance(d("100.00"), d("100.009")));
        assert!(!within_tolerance(d("100.00"), d("100.01")));
        assert!(!within_tolerance(d("100.01"), d("100.00")));
        assert!(within_tolerance(d("0"), d("0")));
    }
}
