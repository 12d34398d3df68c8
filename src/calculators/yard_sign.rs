//! Yard-sign calculator. A small flat per-install bonus, priced off a
//! tag on the job rather than any dollar figure in the input row.

use crate::calculators::names::parse_name_list;
use crate::model::{CategoryTag, CategoryTotal, ComputedLine, Technician, YardSignEntry};
use crate::roster::{contains_match, is_eligible, EligibilityCategory};

const WITH_PHOTO_TAG: &str = "yard sign w/ pic";
const WITH_PHOTO_AMOUNT: f64 = 25.0;
const STANDARD_AMOUNT: f64 = 10.0;

pub fn calculate_yard_sign_for_technician(
    tech: &Technician,
    entries: &[YardSignEntry],
) -> (Vec<ComputedLine>, CategoryTotal) {
    let eligible = is_eligible(tech, EligibilityCategory::YardSign);
    let mut lines = Vec::new();

    for entry in entries {
        let (names, warned) = parse_name_list(&entry.assigned_technicians);
        if warned {
            tracing::warn!(
                customer = %entry.customer,
                "Yard Sign entry has an odd number of space-delimited name tokens; parsed each token as its own name"
            );
        }
        if !names.iter().any(|n| contains_match(n, &tech.name)) {
            continue;
        }
        if !eligible {
            continue;
        }

        let amount =
            if entry.tags.to_lowercase().contains(WITH_PHOTO_TAG) { WITH_PHOTO_AMOUNT } else { STANDARD_AMOUNT };

        lines.push(ComputedLine {
            customer: entry.customer.clone(),
            business_unit: entry.business_unit.clone(),
            completion_date: entry.completion_date,
            amount,
            notes: Some(entry.tags.clone()),
            category_tag: CategoryTag::YardSign,
        });
    }

    let total_amount: f64 = lines.iter().map(|l| l.amount).sum();
    let total = CategoryTotal { category_tag: CategoryTag::YardSign, count: lines.len(), amount: total_amount };
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
    fn photo_tag_pays_25_others_pay_10() {
        let john = tech("John");
        let entries = vec![
            YardSignEntry {
                customer: "Acme".into(),
                job_number: None,
                business_unit: None,
                completion_date: None,
                jobs_total: None,
                tags: "Yard Sign w/ Pic".into(),
                assigned_technicians: "John".into(),
            },
            YardSignEntry {
                customer: "Beta".into(),
                job_number: None,
                business_unit: None,
                completion_date: None,
                jobs_total: None,
                tags: "Yard Sign".into(),
                assigned_technicians: "John".into(),
            },
        ];
        let (lines, total) = calculate_yard_sign_for_technician(&john, &entries);
        assert_eq!(lines[0].amount, 25.0);
        assert_eq!(lines[1].amount, 10.0);
        assert_eq!(total.amount, 35.0);
    }

    #[test]
    fn ineligible_technician_yields_an_empty_result_not_zero_lines() {
        let mut ann = tech("Ann");
        ann.class = Class::One;
        let entries = vec![YardSignEntry {
            customer: "Acme".into(),
            job_number: None,
            business_unit: None,
            completion_date: None,
            jobs_total: None,
            tags: "Yard Sign w/ Pic".into(),
            assigned_technicians: "Ann".into(),
        }];
        let (lines, total) = calculate_yard_sign_for_technician(&ann, &entries);
        assert!(lines.is_empty());
        assert_eq!(total.count, 0);
        assert_eq!(total.amount, 0.0);
    }
}
