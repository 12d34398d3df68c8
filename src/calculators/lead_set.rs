//! Lead-set calculator. Tiered commission on self-generated lead revenue,
//! in half-open brackets.

use crate::model::{CategoryTag, CategoryTotal, ComputedLine, LeadEntry, Technician};
use crate::roster::{exact_match, is_eligible, EligibilityCategory};

/// Returns `(rate, label)` for the bracket `revenue` falls into. Brackets are
/// half-open: `[1, 10000)` at 2%, `[10000, 30000)` at 3%, `[30000, inf)` at
/// 4%. Revenue below `1` falls outside the lowest bracket and earns nothing.
fn bracket_rate(revenue: f64) -> (f64, &'static str) {
    if revenue < 1.0 {
        (0.0, "below minimum")
    } else if revenue < 10_000.0 {
        (0.02, "2% bracket")
    } else if revenue < 30_000.0 {
        (0.03, "3% bracket")
    } else {
        (0.04, "4% bracket")
    }
}

/// Returns the computed lines, the lead-set `CategoryTotal` (commission
/// dollars, which is what counts toward total pay), and separately the raw
/// revenue sum (`lead_set_sale`, informational).
pub fn calculate_lead_set_for_technician(
    tech: &Technician,
    entries: &[LeadEntry],
) -> (Vec<ComputedLine>, CategoryTotal, f64) {
    let eligible = is_eligible(tech, EligibilityCategory::LeadSet);
    let mut lines = Vec::new();
    let mut sale_sum = 0.0;

    for entry in entries {
        if !exact_match(&entry.sold_by_technician, &tech.name) {
            continue;
        }
        if !eligible {
            continue;
        }

        sale_sum += entry.revenue;
        let (rate, label) = bracket_rate(entry.revenue);
        let commission = entry.revenue * rate;

        let mut notes = format!("{:.0}% commission on ${:.2} ({})", rate * 100.0, entry.revenue, label);
        if let Some(original) = entry.notes.as_deref() {
            if !original.trim().is_empty() {
                notes.push_str("; ");
                notes.push_str(original.trim());
            }
        }

        lines.push(ComputedLine {
            customer: entry.customer.clone(),
            business_unit: entry.business_unit.clone(),
            completion_date: entry.completion_date,
            amount: commission,
            notes: Some(notes),
            category_tag: CategoryTag::LeadSet,
        });
    }

    let commission_sum: f64 = lines.iter().map(|l| l.amount).sum();
    let total = CategoryTotal { category_tag: CategoryTag::LeadSet, count: lines.len(), amount: commission_sum };
    (lines, total, sale_sum)
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
    fn applies_tiered_brackets() {
        let john = tech("John");
        let entries = vec![
            LeadEntry {
                customer: "A".into(),
                business_unit: None,
                completion_date: None,
                revenue: 5000.0,
                notes: None,
                sold_by_technician: "John".into(),
            },
            LeadEntry {
                customer: "B".into(),
                business_unit: None,
                completion_date: None,
                revenue: 15_000.0,
                notes: None,
                sold_by_technician: "John".into(),
            },
            LeadEntry {
                customer: "C".into(),
                business_unit: None,
                completion_date: None,
                revenue: 50_000.0,
                notes: None,
                sold_by_technician: "John".into(),
            },
        ];
        let (lines, total, sale_sum) = calculate_lead_set_for_technician(&john, &entries);
        assert_eq!(lines[0].amount, 100.0);
        assert_eq!(lines[1].amount, 450.0);
        assert_eq!(lines[2].amount, 2000.0);
        assert_eq!(total.amount, 2550.0);
        assert_eq!(sale_sum, 70_000.0);
    }

    #[test]
    fn ineligible_technician_yields_an_empty_result_and_no_sale_sum() {
        let mut ann = tech("Ann");
        ann.class = Class::One;
        let entries = vec![LeadEntry {
            customer: "A".into(),
            business_unit: None,
            completion_date: None,
            revenue: 5000.0,
            notes: None,
            sold_by_technician: "Ann".into(),
        }];
        let (lines, total, sale_sum) = calculate_lead_set_for_technician(&ann, &entries);
        assert!(lines.is_empty());
        assert_eq!(total.count, 0);
        assert_eq!(total.amount, 0.0);
        assert_eq!(sale_sum, 0.0);
    }
}
