//! Spiff/bonus calculator. A flat per-job bonus split by the roster's
//! `soldBy` field, paid to every technician assigned to the job.

use crate::calculators::names::parse_name_list;
use crate::model::{CategoryTag, CategoryTotal, ComputedLine, SpiffBonusEntry, Technician};
use crate::parsing::parse_money;
use crate::roster::{contains_match, exact_match, is_eligible, EligibilityCategory};

pub fn calculate_spiff_for_technician(
    tech: &Technician,
    entries: &[SpiffBonusEntry],
) -> (Vec<ComputedLine>, CategoryTotal) {
    let eligible = is_eligible(tech, EligibilityCategory::Spiff);
    let mut lines = Vec::new();

    for entry in entries {
        let Ok(amount) = parse_money(&entry.bonus_amount_raw) else { continue };
        if amount <= 0.0 {
            continue;
        }

        let (names, warned) = parse_name_list(&entry.assigned_technicians);
        if warned {
            tracing::warn!(
                customer = %entry.customer,
                "Spiff/Bonus entry has an odd number of space-delimited name tokens; parsed each token as its own name"
            );
        }
        if !names.iter().any(|n| contains_match(n, &tech.name)) {
            continue;
        }

        let sold_by_ok = match entry.sold_by.as_deref() {
            Some(sold_by) if !sold_by.trim().is_empty() => exact_match(sold_by, &tech.name),
            _ => true,
        };
        if !sold_by_ok {
            continue;
        }
        if !eligible {
            continue;
        }

        lines.push(ComputedLine {
            customer: entry.customer.clone(),
            business_unit: entry.job_business_unit.clone(),
            completion_date: entry.completion_date,
            amount,
            notes: entry.item_name.clone(),
            category_tag: CategoryTag::Spiff,
        });
    }

    let total_amount: f64 = lines.iter().map(|l| l.amount).sum();
    let total = CategoryTotal { category_tag: CategoryTag::Spiff, count: lines.len(), amount: total_amount };
    (lines, total)
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
    fn pays_assigned_technician_regardless_of_sold_by_when_blank() {
        let john = tech("John");
        let entries = vec![SpiffBonusEntry {
            customer: "Acme".into(),
            job_business_unit: None,
            completion_date: None,
            sold_by: Some("".into()),
            assigned_technicians: "John".into(),
            item_name: Some("Widget Spiff".into()),
            bonus_amount_raw: "50".into(),
        }];
        let (lines, total) = calculate_spiff_for_technician(&john, &entries);
        assert_eq!(lines[0].amount, 50.0);
        assert_eq!(total.amount, 50.0);
    }

    #[test]
    fn sold_by_mismatch_skips_the_entry() {
        let john = tech("John");
        let entries = vec![SpiffBonusEntry {
            customer: "Acme".into(),
            job_business_unit: None,
            completion_date: None,
            sold_by: Some("Jane".into()),
            assigned_technicians: "John".into(),
            item_name: None,
            bonus_amount_raw: "50".into(),
        }];
        let (lines, _) = calculate_spiff_for_technician(&john, &entries);
        assert!(lines.is_empty());
    }

    #[test]
    fn ineligible_technician_yields_an_empty_result_not_zero_lines() {
        let mut ann = tech("Ann");
        ann.class = Class::One;
        let entries = vec![SpiffBonusEntry {
            customer: "Acme".into(),
            job_business_unit: None,
            completion_date: None,
            sold_by: Some("".into()),
            assigned_technicians: "Ann".into(),
            item_name: Some("Widget Spiff".into()),
            bonus_amount_raw: "50".into(),
        }];
        let (lines, total) = calculate_spiff_for_technician(&ann, &entries);
        assert!(lines.is_empty());
        assert_eq!(total.count, 0);
        assert_eq!(total.amount, 0.0);
    }
}
