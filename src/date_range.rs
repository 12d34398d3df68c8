//! Pay-period parsing: either an explicit `MM/DD[/YY] - MM/DD[/YY]` range, or
//! a single `MM_DD_YY`-style date naming the end of a trailing 7-day window.

use anyhow::{bail, Context};
use chrono::{Duration, NaiveDate};

use crate::parsing::parse_date;

#[derive(Debug, Clone, PartialEq)]
pub struct PayPeriod {
    pub label: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl PayPeriod {
    /// Trailing window length, inclusive of the named end date, when only a
    /// single date is given.
    pub const TRAILING_WINDOW_DAYS: i64 = 7;

    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            bail!("empty pay period");
        }
        if let Some((from_str, to_str)) = split_range(trimmed) {
            let start = parse_date(from_str.trim())
                .with_context(|| format!("invalid pay period start date {:?}", from_str))?;
            let end = parse_date(to_str.trim())
                .with_context(|| format!("invalid pay period end date {:?}", to_str))?;
            return Ok(PayPeriod { label: trimmed.to_string(), start, end });
        }
        let end = parse_date(trimmed)
            .with_context(|| format!("invalid pay period date {:?}", trimmed))?;
        let start = end - Duration::days(Self::TRAILING_WINDOW_DAYS - 1);
        Ok(PayPeriod { label: trimmed.to_string(), start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

fn split_range(raw: &str) -> Option<(&str, &str)> {
    raw.split_once(" - ").or_else(|| raw.split_once(" to "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_explicit_range() {
        let period = PayPeriod::parse("03/01/26 - 03/07/26").unwrap();
        assert_eq!(period.start, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
        assert_eq!(period.end, NaiveDate::from_ymd_opt(2026, 3, 7).unwrap());
    }

    #[test]
    fn parses_single_date_as_trailing_window() {
        let period = PayPeriod::parse("03_07_26").unwrap();
        assert_eq!(period.end, NaiveDate::from_ymd_opt(2026, 3, 7).unwrap());
        assert_eq!(period.start, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
    }

    #[test]
    fn contains_is_inclusive_on_both_ends() {
        let period = PayPeriod::parse("03/01/26 - 03/07/26").unwrap();
        assert!(period.contains(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()));
        assert!(period.contains(NaiveDate::from_ymd_opt(2026, 3, 7).unwrap()));
        assert!(!period.contains(NaiveDate::from_ymd_opt(2026, 3, 8).unwrap()));
    }
}
