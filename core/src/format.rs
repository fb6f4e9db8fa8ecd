//! Display formatting for P&L cells: yen amounts and percentages.

use crate::pnl::PlLine;

pub const YEN_SIGN: char = '¥';
/// Shown for values that cannot be formatted.
pub const MISSING: &str = "-";

/// `¥1,234,567`; negatives as `¥-1,234`. Rounded to whole yen.
pub fn format_yen(value: f64) -> Option<String> {
    if !value.is_finite() {
        return None;
    }
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let sign = if rounded < 0.0 { "-" } else { "" };
    Some(format!("{YEN_SIGN}{sign}{}", group_thousands(&digits)))
}

/// A fraction rendered as a percentage with one decimal: 0.35 → `35.0%`.
pub fn format_percent(fraction: f64) -> Option<String> {
    if !fraction.is_finite() {
        return None;
    }
    Some(format!("{:.1}%", fraction * 100.0))
}

/// Format a P&L cell according to its row kind.
pub fn format_cell(line: PlLine, value: Option<f64>) -> String {
    let formatted = value.and_then(|v| {
        if line.is_ratio() {
            format_percent(v)
        } else {
            format_yen(v)
        }
    });
    formatted.unwrap_or_else(|| MISSING.to_string())
}

/// Numeric percent value of a formatted percentage, e.g. `35.0%` → 35.0.
pub fn parse_percent(text: &str) -> Option<f64> {
    let body = text.trim().strip_suffix('%')?;
    body.replace(',', "").parse().ok()
}

/// Numeric amount of a formatted yen value, e.g. `¥-1,234` → -1234.0.
pub fn parse_yen(text: &str) -> Option<f64> {
    let body = text.trim().strip_prefix(YEN_SIGN)?;
    body.replace(',', "").parse().ok()
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
