use std::str::FromStr;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;

pub const NO_DESCRIPTION: &str = "No Description";
pub const UNKNOWN: &str = "Unknown";

/// Month-name layouts tried after the numeric ones.
const TEXT_DATE_FORMATS: &[&str] = &[
    "%b %d, %Y",
    "%B %d, %Y",
    "%b %d %Y",
    "%B %d %Y",
    "%d %b %Y",
    "%d %B %Y",
    "%d-%b-%Y",
    "%d-%b-%y",
];

/// Largest magnitude accepted from a cell. Totals over many rows stay far
/// below the decimal range.
const MAX_AMOUNT: i64 = 1_000_000_000_000_000;

fn currency_junk() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^0-9.\-]").expect("currency pattern is valid"))
}

/// Parse a currency cell into a signed amount.
///
/// Everything except digits, `.` and `-` is stripped, so thousands separators
/// and currency symbols are tolerated. Accounting-style parentheses are not
/// read as negatives; such cells are rejected rather than imported with the
/// wrong sign. Magnitudes of 10^15 or more are rejected too.
pub fn clean_currency(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim().trim_matches('"').trim();
    if trimmed.starts_with('(') && trimmed.ends_with(')') {
        return None;
    }
    let stripped = currency_junk().replace_all(trimmed, "");
    if stripped.is_empty() {
        return None;
    }
    Decimal::from_str(&stripped)
        .ok()
        .filter(|v| v.abs() < Decimal::from(MAX_AMOUNT))
}

/// Parse a loosely formatted date into a calendar date.
///
/// Accepts ISO dates (optionally followed by a time), US-style
/// month/day/year with `/`, `-` or `.` separators, year-first slash dates,
/// compact `YYYYMMDD`, and common month-name layouts.
pub fn clean_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim().trim_matches('"').trim();
    if s.is_empty() {
        return None;
    }

    // ISO date, possibly with a time part: 2024-01-05T10:00:00Z / 2024-01-05 10:00
    if s.len() >= 10 && s.is_char_boundary(10) {
        let (head, rest) = s.split_at(10);
        if rest.is_empty() || rest.starts_with('T') || rest.starts_with(' ') {
            if let Ok(date) = NaiveDate::parse_from_str(head, "%Y-%m-%d") {
                return Some(date);
            }
        }
    }

    if s.len() == 8 && s.bytes().all(|b| b.is_ascii_digit()) {
        return NaiveDate::parse_from_str(s, "%Y%m%d").ok();
    }

    if let Some(date) = parse_numeric_date(s) {
        return Some(date);
    }
    // "01/05/2024 10:30 AM"
    if let Some(date) = s.split_once(' ').and_then(|(head, _)| parse_numeric_date(head)) {
        return Some(date);
    }

    TEXT_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// `m/d/y`, `m-d-y`, `m.d.y` or `y/m/d`; two-digit years pivot at 50.
fn parse_numeric_date(s: &str) -> Option<NaiveDate> {
    let sep = ['/', '-', '.'].into_iter().find(|c| s.contains(*c))?;
    let parts: Vec<&str> = s.split(sep).map(str::trim).collect();
    if parts.len() != 3 || parts.iter().any(|p| p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit())) {
        return None;
    }
    if parts[0].len() == 4 {
        let y: i32 = parts[0].parse().ok()?;
        let m: u32 = parts[1].parse().ok()?;
        let d: u32 = parts[2].parse().ok()?;
        return NaiveDate::from_ymd_opt(y, m, d);
    }
    let m: u32 = parts[0].parse().ok()?;
    let d: u32 = parts[1].parse().ok()?;
    let y: i32 = match parts[2].len() {
        1 | 2 => {
            let short: i32 = parts[2].parse().ok()?;
            if short < 50 { 2000 + short } else { 1900 + short }
        }
        4 => parts[2].parse().ok()?,
        _ => return None,
    };
    NaiveDate::from_ymd_opt(y, m, d)
}

/// Canonical storage form of a date: `YYYY-MM-DD`.
pub fn canonical_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Trimmed text, or `fallback` when nothing is left.
pub fn clean_text(raw: &str, fallback: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_clean_currency_symbols_and_separators() {
        assert_eq!(clean_currency("$1,234.56"), Some(dec!(1234.56)));
        assert_eq!(clean_currency("-$50.00"), Some(dec!(-50.00)));
        assert_eq!(clean_currency("  250.00 "), Some(dec!(250.00)));
        assert_eq!(clean_currency("\"2,000.00\""), Some(dec!(2000)));
        assert_eq!(clean_currency("USD 12"), Some(dec!(12)));
    }

    #[test]
    fn test_clean_currency_rejects_parentheses() {
        assert_eq!(clean_currency("(500)"), None);
        assert_eq!(clean_currency("($1,234.56)"), None);
    }

    #[test]
    fn test_clean_currency_rejects_garbage() {
        assert_eq!(clean_currency(""), None);
        assert_eq!(clean_currency("N/A"), None);
        assert_eq!(clean_currency("-"), None);
        assert_eq!(clean_currency("1.2.3"), None);
        assert_eq!(clean_currency("12-34"), None);
        assert_eq!(clean_currency("50.00-"), None);
    }

    #[test]
    fn test_clean_currency_rejects_huge_magnitudes() {
        assert_eq!(clean_currency("79228162514264337593543950335"), None);
        assert_eq!(clean_currency("-1000000000000000"), None);
        assert_eq!(clean_currency("999,999,999,999,999.99"), Some(dec!(999999999999999.99)));
    }

    #[test]
    fn test_clean_date_iso() {
        assert_eq!(clean_date("2024-01-05"), Some(ymd(2024, 1, 5)));
        assert_eq!(clean_date("2024-01-05T14:30:00.000Z"), Some(ymd(2024, 1, 5)));
        assert_eq!(clean_date("2024-01-05 09:00"), Some(ymd(2024, 1, 5)));
        assert_eq!(clean_date("20240105"), Some(ymd(2024, 1, 5)));
    }

    #[test]
    fn test_clean_date_us_and_text() {
        assert_eq!(clean_date("01/15/2025"), Some(ymd(2025, 1, 15)));
        assert_eq!(clean_date("1/5/24"), Some(ymd(2024, 1, 5)));
        assert_eq!(clean_date("12-31-1999"), Some(ymd(1999, 12, 31)));
        assert_eq!(clean_date("2024/03/09"), Some(ymd(2024, 3, 9)));
        assert_eq!(clean_date("Jan 5, 2024"), Some(ymd(2024, 1, 5)));
        assert_eq!(clean_date("March 9 2024"), Some(ymd(2024, 3, 9)));
        assert_eq!(clean_date("05 Feb 2024"), Some(ymd(2024, 2, 5)));
        assert_eq!(clean_date("01/05/2024 10:30 AM"), Some(ymd(2024, 1, 5)));
    }

    #[test]
    fn test_clean_date_rejects_impossible() {
        assert_eq!(clean_date(""), None);
        assert_eq!(clean_date("Invalid Date"), None);
        assert_eq!(clean_date("02/30/2025"), None);
        assert_eq!(clean_date("13/01/2025"), None);
        assert_eq!(clean_date("2024-13-01"), None);
    }

    #[test]
    fn test_canonical_date() {
        assert_eq!(canonical_date(ymd(2024, 1, 5)), "2024-01-05");
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("  Coffee  ", NO_DESCRIPTION), "Coffee");
        assert_eq!(clean_text("   ", NO_DESCRIPTION), "No Description");
        assert_eq!(clean_text("", UNKNOWN), "Unknown");
    }
}
