//! ISBN and date-field normalization.
//!
//! The library CSV has been through spreadsheet round-trips, so ISBN-13
//! values arrive as clean digit strings, float-formatted numbers
//! (`9781631490883.0`), or scientific notation (`9.781631490883e+12`).

use std::sync::OnceLock;

use regex_lite::Regex;

fn numeric_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+(\.\d+)?$").unwrap())
}

fn year_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(1[5-9]\d{2}|20\d{2}|21\d{2})\b").unwrap())
}

/// Coerce a raw CSV cell into a clean 13-digit ISBN string.
///
/// Returns `None` for blanks and for anything that does not come out to
/// exactly 13 digits.
pub fn normalize_isbn13(raw: &str) -> Option<String> {
    let s = raw.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("nan") {
        return None;
    }

    // Plain numeric string, possibly with a trailing fraction from a float
    // export.
    if numeric_re().is_match(s) {
        let digits = s.split('.').next().unwrap_or(s);
        return (digits.len() == 13).then(|| digits.to_string());
    }

    // Scientific notation from a spreadsheet export.
    if s.contains('e') || s.contains('E') {
        if let Ok(f) = s.parse::<f64>() {
            let digits = format!("{}", f as i64);
            return (digits.len() == 13).then_some(digits);
        }
    }

    // Last resort: strip separators (hyphens, spaces) and hope for 13 digits.
    let digits = digits_only(s);
    (digits.len() == 13).then_some(digits)
}

/// Keep only ASCII digits.
pub fn digits_only(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// First plausible 4-digit year (1500-2199) in a free-form date string such
/// as `"May 2013"` or `"1999-01-01"`.
pub fn extract_year(value: &str) -> Option<i32> {
    year_re()
        .captures(value)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Pick the best ISBN-13 from a candidate list: prefer codes starting with
/// `978`/`979`, else any 13-digit code.
pub fn pick_isbn13(candidates: &[String]) -> Option<String> {
    let cleaned: Vec<String> = candidates.iter().map(|c| digits_only(c)).collect();
    cleaned
        .iter()
        .find(|c| c.len() == 13 && (c.starts_with("978") || c.starts_with("979")))
        .or_else(|| cleaned.iter().find(|c| c.len() == 13))
        .cloned()
}
