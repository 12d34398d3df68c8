//! KPI averager. Averages a technician's "call by call" percentage over
//! the active pay period, and derives the bonus threshold flag.
//!
//! The raw KPI table is grouped into a [`KpiIndex`] once per run -- a
//! process-wide index built once and reused across technicians -- rather
//! than re-scanned per technician.

use std::collections::HashMap;

use crate::date_range::PayPeriod;
use crate::model::{KpiEntry, Technician};
use crate::roster::normalize_name;

const BONUS_THRESHOLD: f64 = 0.90;
const BONUS_AMOUNT: f64 = 100.0;

pub struct KpiIndex {
    by_technician: HashMap<String, Vec<KpiEntry>>,
}

impl KpiIndex {
    pub fn build(entries: &[KpiEntry]) -> Self {
        let mut by_technician: HashMap<String, Vec<KpiEntry>> = HashMap::new();
        for entry in entries {
            by_technician.entry(normalize_name(&entry.technician)).or_default().push(entry.clone());
        }
        KpiIndex { by_technician }
    }

    fn entries_for(&self, name: &str) -> &[KpiEntry] {
        self.by_technician.get(&normalize_name(name)).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Returns `(average, bonus)`. Entries with a zero percentage are excluded
/// from the average -- they represent a call that was never scored, not a
/// genuine zero.
pub fn average_kpi_for_technician(tech: &Technician, index: &KpiIndex, period: &PayPeriod) -> (f64, f64) {
    let mut sum = 0.0;
    let mut count = 0usize;
    for entry in index.entries_for(&tech.name) {
        if !period.contains(entry.date) {
            continue;
        }
        if entry.percentage == 0.0 {
            continue;
        }
        sum += entry.percentage;
        count += 1;
    }
    let average = if count == 0 { 0.0 } else { sum / count as f64 };
    let bonus = if average > BONUS_THRESHOLD { BONUS_AMOUNT } else { 0.0 };
    (average, bonus)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Class;
    use chrono::NaiveDate;

    fn tech(name: &str) -> Technician {
        Technician {
            name: name.to_string(),
            department: None,
            position: None,
            base_hourly_rate: 20.0,
            commission_pct_override: None,
            exempt: false,
            class: Class::Three,
            split_default: 0,
        }
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
    }

    #[test]
    fn averages_nonzero_scores_in_window_and_awards_bonus() {
        let john = tech("John");
        let entries = vec![
            KpiEntry { technician: "John".into(), date: date(1), percentage: 0.95 },
            KpiEntry { technician: "John".into(), date: date(2), percentage: 0.0 },
            KpiEntry { technician: "John".into(), date: date(3), percentage: 0.85 },
            KpiEntry { technician: "John".into(), date: date(4), percentage: 0.95 },
            KpiEntry { technician: "John".into(), date: date(20), percentage: 0.50 },
        ];
        let index = KpiIndex::build(&entries);
        let period = PayPeriod { label: "window".into(), start: date(1), end: date(7) };
        let (average, bonus) = average_kpi_for_technician(&john, &index, &period);
        assert!((average - 0.9166666667).abs() < 1e-6);
        assert_eq!(bonus, 100.0);
    }

    #[test]
    fn average_at_or_below_threshold_earns_no_bonus() {
        let john = tech("John");
        let entries = vec![KpiEntry { technician: "John".into(), date: date(1), percentage: 0.88 }];
        let index = KpiIndex::build(&entries);
        let period = PayPeriod { label: "window".into(), start: date(1), end: date(7) };
        let (average, bonus) = average_kpi_for_technician(&john, &index, &period);
        assert_eq!(average, 0.88);
        assert_eq!(bonus, 0.0);
    }
}
