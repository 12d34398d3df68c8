//! PBP (Pay-By-Performance) calculator. The most involved category: it
//! infers each job's team composition and role assignment from the roster,
//! then looks the result up in a fixed split table.

use std::collections::HashSet;

use crate::calculators::names::{ensure_primary, parse_name_list};
use crate::model::{CategoryTag, CategoryTotal, Class, ComputedLine, PbpEntry, Technician};
use crate::roster::{contains_match, exact_match, is_eligible, EligibilityCategory, Roster};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Role {
    Lead,
    Assistant,
    /// Occupies a team seat (counts toward team size) but never gets paid --
    /// an unresolvable or unknown-class participant.
    None,
}

struct TeamMember {
    name: String,
    class: Class,
    role: Role,
    is_primary: bool,
}

fn initial_role(class: Class) -> Role {
    match class {
        Class::Three | Class::Four => Role::Lead,
        Class::Two => Role::Assistant,
        // Ineligible for payout, but still occupies an Assistant seat for
        // team-composition purposes; eligibility zeroes the payout later.
        Class::One => Role::Assistant,
        Class::Unknown => Role::None,
    }
}

/// Applies the ordered team-refinement rules: assistant-only promotion,
/// Class-2 promotion when no higher class is present, and solo-job
/// promotion.
fn refine_roles(members: &mut [TeamMember]) {
    let lead_count = members.iter().filter(|m| m.role == Role::Lead).count();
    let assistant_count = members.iter().filter(|m| m.role == Role::Assistant).count();

    if assistant_count > 0 && lead_count == 0 {
        if let Some(idx) = members.iter().position(|m| m.is_primary) {
            members[idx].role = Role::Lead;
        } else if assistant_count == 1 {
            if let Some(idx) = members.iter().position(|m| m.role == Role::Assistant) {
                members[idx].role = Role::Lead;
            }
        }
    }

    let has_higher_class = members.iter().any(|m| matches!(m.class, Class::Three | Class::Four));
    let has_class_two = members.iter().any(|m| m.class == Class::Two);
    if has_class_two && !has_higher_class {
        for member in members.iter_mut() {
            if member.class == Class::Two {
                member.role = Role::Lead;
            }
        }
    }

    if members.len() == 1 && members[0].class != Class::Unknown {
        members[0].role = if matches!(members[0].class, Class::Two | Class::Three | Class::Four) {
            Role::Lead
        } else {
            Role::Assistant
        };
    }
}

/// The fixed split table, preserved verbatim -- including the mixed
/// 3-/4-person brackets whose percentages don't sum to 100%. Falls back to
/// an even `100 / total` split for any combination not listed.
fn split_percentages(total_paying: usize, leads: usize, assistants: usize) -> (f64, f64) {
    match (total_paying, leads, assistants) {
        (1, 1, 0) => (100.0, 0.0),
        (1, 0, 1) => (0.0, 100.0),
        (2, 1, 1) => (65.0, 35.0),
        (2, 2, 0) => (50.0, 0.0),
        (2, 0, 2) => (0.0, 50.0),
        (3, 1, 2) => (46.0, 27.0),
        (3, 2, 1) => (38.0, 24.0),
        (3, 3, 0) => (33.33, 0.0),
        (3, 0, 3) => (0.0, 33.33),
        (4, 2, 2) => (30.0, 20.0),
        (4, 3, 1) => (30.0, 10.0),
        (4, 4, 0) => (25.0, 0.0),
        (4, 0, 4) => (0.0, 25.0),
        (0, _, _) => (0.0, 0.0),
        (total, _, _) => {
            let even = 100.0 / total as f64;
            (even, even)
        }
    }
}

/// Extracts the PBP dollar amount from a `crossSaleGroup` cell such as
/// `"PBP 400"` or `"pbp 130.00 install"`. `None` if no `pbp` token is found
/// or it isn't followed by a number.
fn extract_pbp_amount(cross_sale_group: &str) -> Option<f64> {
    let lower = cross_sale_group.to_lowercase();
    let idx = lower.find("pbp")?;
    let rest = lower[idx + "pbp".len()..].trim_start();
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit() || *c == '.').collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse::<f64>().ok()
}

pub fn calculate_pbp_for_technician(
    tech: &Technician,
    entries: &[PbpEntry],
    roster: &Roster,
) -> (Vec<ComputedLine>, CategoryTotal) {
    let eligible = is_eligible(tech, EligibilityCategory::Pbp);
    let mut lines = Vec::new();
    let mut seen = HashSet::new();

    for entry in entries {
        let Some(amount) = extract_pbp_amount(&entry.cross_sale_group) else { continue };
        if amount <= 0.0 {
            continue;
        }

        let primary_matches =
            entry.primary_technician.as_deref().map(|p| exact_match(p, &tech.name)).unwrap_or(false);

        let (mut names, warned) = parse_name_list(&entry.assigned_technicians_raw);
        ensure_primary(&mut names, entry.primary_technician.as_deref());
        if warned {
            tracing::warn!(
                customer = %entry.customer,
                "PBP entry has an odd number of space-delimited name tokens; parsed each token as its own name"
            );
        }

        let assigned_contains = names.iter().any(|n| contains_match(n, &tech.name));
        if !primary_matches && !assigned_contains {
            continue;
        }

        let dedup_key = (
            entry.customer.to_lowercase(),
            entry.completion_date,
            entry.item_name.clone().unwrap_or_default().to_lowercase(),
            (amount * 100.0).round() as i64,
        );
        if !seen.insert(dedup_key) {
            continue;
        }

        let mut members: Vec<TeamMember> = names
            .iter()
            .map(|name| {
                let class = roster.resolve(name).map(|t| t.class).unwrap_or(Class::Unknown);
                let is_primary =
                    entry.primary_technician.as_deref().map(|p| exact_match(p, name)).unwrap_or(false);
                TeamMember { name: name.clone(), class, role: initial_role(class), is_primary }
            })
            .collect();

        refine_roles(&mut members);

        let lead_count = members.iter().filter(|m| m.role == Role::Lead).count();
        let assistant_count = members.iter().filter(|m| m.role == Role::Assistant).count();
        let total_paying = lead_count + assistant_count;

        let my_role =
            members.iter().find(|m| exact_match(&m.name, &tech.name)).map(|m| m.role).unwrap_or(Role::None);

        let (lead_pct, assistant_pct) = split_percentages(total_paying, lead_count, assistant_count);
        let pct = match my_role {
            Role::Lead => lead_pct,
            Role::Assistant => assistant_pct,
            Role::None => 0.0,
        };

        let share = if eligible { amount * pct / 100.0 } else { 0.0 };

        lines.push(ComputedLine {
            customer: entry.customer.clone(),
            business_unit: entry.job_business_unit.clone(),
            completion_date: entry.completion_date,
            amount: share,
            notes: entry.item_name.clone(),
            category_tag: CategoryTag::Pbp,
        });
    }

    let total_amount: f64 = lines.iter().map(|l| l.amount).sum();
    let total = CategoryTotal { category_tag: CategoryTag::Pbp, count: lines.len(), amount: total_amount };
    (lines, total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Technician;

    fn tech(name: &str, class: Class) -> Technician {
        Technician {
            name: name.to_string(),
            department: None,
            position: Some(format!("Class {}", match class {
                Class::One => "1",
                Class::Two => "2",
                Class::Three => "3",
                Class::Four => "4",
                Class::Unknown => "?",
            })),
            base_hourly_rate: 20.0,
            commission_pct_override: None,
            exempt: false,
            class,
            split_default: 0,
        }
    }

    fn entry(amount: &str, primary: &str, assigned: &str) -> PbpEntry {
        PbpEntry {
            customer: "Acme".into(),
            job_business_unit: Some("Residential".into()),
            completion_date: None,
            primary_technician: Some(primary.to_string()),
            assigned_technicians_raw: assigned.to_string(),
            item_name: Some("Install".into()),
            cross_sale_group: format!("PBP {}", amount),
        }
    }

    #[test]
    fn two_person_lead_and_assistant_split_65_35() {
        let john = tech("John", Class::Four);
        let jane = tech("Jane", Class::Two);
        let roster = Roster::new(vec![john.clone(), jane.clone()]);
        let entries = vec![entry("400", "John", "John, Jane")];

        let (lines, total) = calculate_pbp_for_technician(&john, &entries, &roster);
        assert_eq!(lines[0].amount, 260.0);
        assert_eq!(total.amount, 260.0);

        let (lines, total) = calculate_pbp_for_technician(&jane, &entries, &roster);
        assert_eq!(lines[0].amount, 140.0);
        assert_eq!(total.amount, 140.0);
    }

    #[test]
    fn solo_class_two_is_promoted_to_lead() {
        let jane = tech("Jane", Class::Two);
        let roster = Roster::new(vec![jane.clone()]);
        let entries = vec![entry("300", "Jane", "Jane")];

        let (lines, _) = calculate_pbp_for_technician(&jane, &entries, &roster);
        assert_eq!(lines[0].amount, 300.0);
    }

    #[test]
    fn three_person_one_lead_two_assistants() {
        let john = tech("John", Class::Four);
        let jane = tech("Jane", Class::Two);
        let bob = tech("Bob", Class::Two);
        let roster = Roster::new(vec![john.clone(), jane.clone(), bob.clone()]);
        let entries = vec![entry("1000", "John", "John, Jane, Bob")];

        let (lines, _) = calculate_pbp_for_technician(&john, &entries, &roster);
        assert_eq!(lines[0].amount, 460.0);
        let (lines, _) = calculate_pbp_for_technician(&jane, &entries, &roster);
        assert_eq!(lines[0].amount, 270.0);
        let (lines, _) = calculate_pbp_for_technician(&bob, &entries, &roster);
        assert_eq!(lines[0].amount, 270.0);
    }

    #[test]
    fn class_one_apprentice_is_zeroed_but_counted() {
        let john = tech("John", Class::Four);
        let mut ann = tech("Ann", Class::One);
        ann.position = Some("Class 1 Apprentice".into());
        let roster = Roster::new(vec![john.clone(), ann.clone()]);
        let entries = vec![entry("200", "John", "John, Ann")];

        let (lines, total) = calculate_pbp_for_technician(&john, &entries, &roster);
        assert_eq!(lines[0].amount, 130.0);
        assert_eq!(total.amount, 130.0);

        let (lines, total) = calculate_pbp_for_technician(&ann, &entries, &roster);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].amount, 0.0);
        assert_eq!(total.amount, 0.0);
    }
}
