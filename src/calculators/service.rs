//! Service lookup. Copies `completedRevenue`/`totalSales` for a
//! technician from the service table into the ledger summary, verbatim.
//! This is a lookup, not a compensation category: its fields are
//! informational and excluded from `total_pay`.

use crate::model::{ServiceEntry, Technician};
use crate::roster::exact_match;

/// `None` if the technician has no row in the service table; the summary
/// fields should be left unchanged in that case.
pub fn lookup_service_for_technician(tech: &Technician, entries: &[ServiceEntry]) -> Option<(f64, f64)> {
    entries
        .iter()
        .find(|entry| exact_match(&entry.technician, &tech.name))
        .map(|entry| (entry.completed_revenue, entry.total_sales))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Class;

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

    #[test]
    fn copies_matching_row() {
        let john = tech("John");
        let entries = vec![ServiceEntry {
            technician: "John".into(),
            total_sales: 10_000.0,
            completed_revenue: 9_500.0,
            completed_jobs: Some(12),
        }];
        assert_eq!(lookup_service_for_technician(&john, &entries), Some((9_500.0, 10_000.0)));
    }

    #[test]
    fn missing_row_returns_none() {
        let john = tech("John");
        assert_eq!(lookup_service_for_technician(&john, &[]), None);
    }
}
