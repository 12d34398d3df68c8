//! Timesheet aggregator. Sums regular and overtime hours for a technician
//! over all rows in the period's timesheet table. Always eligible -- this
//! is payroll for hours worked, not a performance bonus.

use crate::model::{Technician, TimesheetEntry};
use crate::roster::exact_match;

/// Sums `regularHours`/`overtimeHours` over entries whose `employeeName`
/// matches `tech.name` case-insensitively, trimmed -- the same rule
/// `roster::exact_match` applies to every other single-name lookup.
pub fn aggregate_timesheet_for_technician(tech: &Technician, entries: &[TimesheetEntry]) -> (f64, f64) {
    let mut regular = 0.0;
    let mut overtime = 0.0;
    for entry in entries {
        if exact_match(&entry.employee_name, &tech.name) {
            regular += entry.regular_hours;
            overtime += entry.overtime_hours;
        }
    }
    (regular, overtime)
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
    fn sums_hours_for_exact_name_match() {
        let john = tech("John Smith");
        let entries = vec![
            TimesheetEntry { employee_name: "John Smith".into(), date: None, regular_hours: 8.0, overtime_hours: 0.0 },
            TimesheetEntry { employee_name: "John Smith".into(), date: None, regular_hours: 8.0, overtime_hours: 2.0 },
            TimesheetEntry { employee_name: "Jane Doe".into(), date: None, regular_hours: 40.0, overtime_hours: 0.0 },
        ];
        let (regular, overtime) = aggregate_timesheet_for_technician(&john, &entries);
        assert_eq!(regular, 16.0);
        assert_eq!(overtime, 2.0);
    }

    #[test]
    fn case_mismatch_still_matches() {
        let john = tech("John Smith");
        let entries = vec![TimesheetEntry {
            employee_name: "JOHN SMITH".into(),
            date: None,
            regular_hours: 8.0,
            overtime_hours: 0.0,
        }];
        let (regular, overtime) = aggregate_timesheet_for_technician(&john, &entries);
        assert_eq!(regular, 8.0);
        assert_eq!(overtime, 0.0);
    }
}
