//! Normalization for the three duck-typed scalar kinds that show up across
//! every input table: money, percentages, and dates. One function per kind.

use chrono::NaiveDate;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ParseError {
    #[error("empty value")]
    Empty,
    #[error("not a number: {0:?}")]
    NotNumeric(String),
    #[error("not a recognized date: {0:?}")]
    NotADate(String),
}

/// Strips a leading currency sign, thousands separators, and surrounding
/// whitespace, then parses as `f64`. Accepts parenthesized negatives, e.g.
/// `"($12.50)"` -> `-12.5`, the way spreadsheet exports commonly render them.
pub fn parse_money(raw: &str) -> Result<f64, ParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ParseError::Empty);
    }
    let (body, negative) = if let Some(inner) = trimmed.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        (inner, true)
    } else if let Some(inner) = trimmed.strip_prefix('-') {
        (inner, true)
    } else {
        (trimmed, false)
    };
    let cleaned: String =
        body.chars().filter(|c| !matches!(c, '$' | ',' | ' ')).collect();
    if cleaned.is_empty() {
        return Err(ParseError::NotNumeric(raw.to_string()));
    }
    let value: f64 = cleaned.parse().map_err(|_| ParseError::NotNumeric(raw.to_string()))?;
    Ok(if negative { -value } else { value })
}

/// Normalizes a percentage to `[0, 1]`. A trailing `%` is stripped before
/// parsing; either way, a resulting magnitude greater than `1` is assumed to
/// be expressed out of 100 and is divided down (`"95%"` and bare `95` both
/// become `0.95`; `"0.95"` is left alone).
pub fn parse_percent(raw: &str) -> Result<f64, ParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ParseError::Empty);
    }
    let numeric = trimmed.strip_suffix('%').map(str::trim_end).unwrap_or(trimmed);
    let value: f64 = numeric.parse().map_err(|_| ParseError::NotNumeric(raw.to_string()))?;
    Ok(if value > 1.0 { value / 100.0 } else { value })
}

/// Parses a date from any of the formats the source tables use in practice:
/// ISO `YYYY-MM-DD`, `MM/DD/YYYY`, `MM/DD/YY`, `MM_DD_YY`, or a bare integer
/// spreadsheet serial date (days since 1899-12-30, the Sheets/Excel epoch).
pub fn parse_date(raw: &str) -> Result<NaiveDate, ParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ParseError::Empty);
    }
    const FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%m/%d/%y", "%m_%d_%y", "%m-%d-%Y"];
    for format in FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Ok(date);
        }
    }
    if let Ok(serial) = trimmed.parse::<i64>() {
        if let Some(epoch) = NaiveDate::from_ymd_opt(1899, 12, 30) {
            if let Some(date) = epoch.checked_add_signed(chrono::Duration::days(serial)) {
                return Ok(date);
            }
        }
    }
    Err(ParseError::NotADate(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_strips_currency_and_commas() {
        assert_eq!(parse_money("$1,234.50").unwrap(), 1234.50);
        assert_eq!(parse_money("  42 ").unwrap(), 42.0);
        assert_eq!(parse_money("($12.50)").unwrap(), -12.50);
        assert!(parse_money("").is_err());
    }

    #[test]
    fn percent_normalizes_to_unit_interval() {
        assert_eq!(parse_percent("95%").unwrap(), 0.95);
        assert_eq!(parse_percent("95").unwrap(), 0.95);
        assert_eq!(parse_percent("0.95").unwrap(), 0.95);
        assert_eq!(parse_percent("100%").unwrap(), 1.0);
    }

    #[test]
    fn date_accepts_common_formats() {
        let expected = NaiveDate::from_ymd_opt(2026, 3, 5).unwrap();
        assert_eq!(parse_date("2026-03-05").unwrap(), expected);
        assert_eq!(parse_date("03/05/2026").unwrap(), expected);
        assert_eq!(parse_date("03/05/26").unwrap(), expected);
        assert_eq!(parse_date("03_05_26").unwrap(), expected);
    }

    #[test]
    fn date_accepts_serial_number() {
        // day 46000 from the Sheets epoch
        let parsed = parse_date("46000").unwrap();
        assert_eq!(parsed, NaiveDate::from_ymd_opt(1899, 12, 30).unwrap() + chrono::Duration::days(46000));
    }
}
