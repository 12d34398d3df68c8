//! Roster & eligibility resolver. Builds the in-memory technician roster
//! from raw rows, resolves names to technician records, and answers whether
//! a technician is eligible to be paid under a given category.

use std::collections::HashMap;

use crate::model::{Class, Technician};
use crate::parsing::parse_money;

/// A category a technician's eligibility may be checked against. Timesheet,
/// KPI, and Service are always eligible; the rest exclude Class 1
/// technicians and zero-commission apprentices.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EligibilityCategory {
    Pbp,
    Spiff,
    YardSign,
    LeadSet,
    Timesheet,
    Kpi,
    Service,
}

/// A roster row exactly as read from the backend, before class/eligibility
/// inference. Mirrors the persistent roster table's column layout.
#[derive(Debug, Clone, Default)]
pub struct RosterRow {
    pub name: String,
    pub department: String,
    pub position: String,
    pub base_rate_raw: String,
    pub exempt_raw: String,
    pub commission_override_raw: String,
}

impl RosterRow {
    pub fn resolve(&self) -> Technician {
        let class = infer_class(&self.position);
        let split_default = infer_split_default(&self.position);
        let base_hourly_rate = parse_money(&self.base_rate_raw).unwrap_or(0.0);
        let commission_pct_override = crate::parsing::parse_percent(&self.commission_override_raw).ok();
        let exempt = matches!(self.exempt_raw.trim().to_lowercase().as_str(), "yes" | "y" | "true" | "1");
        Technician {
            name: self.name.trim().to_string(),
            department: non_empty(&self.department),
            position: non_empty(&self.position),
            base_hourly_rate,
            commission_pct_override,
            exempt,
            class,
            split_default,
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Case-insensitive, whitespace-trimmed equality -- the matching rule used
/// for roster resolution and most single-named fields (`soldBy`,
/// `soldByTechnician`, Service's technician column, Timesheet's
/// `employeeName`).
pub fn exact_match(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

/// Case-insensitive substring match in either direction -- the matching rule
/// used for "assigned list contains T" checks (PBP, Spiff, Yard Sign), which
/// tolerate a name appearing embedded in a longer cell value.
pub fn contains_match(haystack: &str, needle: &str) -> bool {
    let haystack = haystack.trim().to_lowercase();
    let needle = needle.trim().to_lowercase();
    if haystack.is_empty() || needle.is_empty() {
        return false;
    }
    haystack.contains(&needle) || needle.contains(&haystack)
}

pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Looks for a `Class\s*[1-4]` token in the position string (case
/// insensitive). Falls back to `Class::Unknown` if no digit immediately
/// follows "class" (ignoring intervening whitespace).
pub fn infer_class(position: &str) -> Class {
    let lower = position.to_lowercase();
    let mut search_from = 0;
    while let Some(rel) = lower[search_from..].find("class") {
        let after_keyword = search_from + rel + "class".len();
        let mut i = after_keyword;
        let bytes = lower.as_bytes();
        while i < bytes.len() && bytes[i] == b' ' {
            i += 1;
        }
        if i < bytes.len() {
            match bytes[i] {
                b'1' => return Class::One,
                b'2' => return Class::Two,
                b'3' => return Class::Three,
                b'4' => return Class::Four,
                _ => {}
            }
        }
        search_from = after_keyword;
    }
    Class::Unknown
}

/// Role-keyword fallback used when the position string carries no explicit
/// `Class X` token: "lead"/"senior" -> 65, "assist"/"apprentice"/"helper" ->
/// 35, otherwise 0.
pub fn infer_split_default(position: &str) -> u8 {
    let lower = position.to_lowercase();
    if lower.contains("lead") || lower.contains("senior") {
        65
    } else if lower.contains("assist") || lower.contains("apprentice") || lower.contains("helper") {
        35
    } else {
        0
    }
}

pub fn is_apprentice(tech: &Technician) -> bool {
    tech.position.as_deref().map(|p| p.to_lowercase().contains("apprentice")).unwrap_or(false)
}

/// Class 1 technicians, and apprentices with an explicit 0% commission
/// override, are ineligible for every category except Timesheet, KPI, and
/// Service, which are always eligible.
pub fn is_eligible(tech: &Technician, category: EligibilityCategory) -> bool {
    match category {
        EligibilityCategory::Timesheet | EligibilityCategory::Kpi | EligibilityCategory::Service => true,
        _ => {
            if tech.class == Class::One {
                return false;
            }
            if is_apprentice(tech) && tech.commission_pct_override == Some(0.0) {
                return false;
            }
            true
        }
    }
}

pub struct Roster {
    by_name: HashMap<String, Technician>,
    order: Vec<String>,
}

impl Roster {
    pub fn new(technicians: Vec<Technician>) -> Self {
        let mut by_name = HashMap::new();
        let mut order = Vec::new();
        for tech in technicians {
            let key = normalize_name(&tech.name);
            order.push(key.clone());
            by_name.insert(key, tech);
        }
        Roster { by_name, order }
    }

    /// Case-insensitive, whitespace-trimmed lookup by name.
    pub fn resolve(&self, name: &str) -> Option<&Technician> {
        self.by_name.get(&normalize_name(name))
    }

    /// All technicians, in roster order.
    pub fn iter(&self) -> impl Iterator<Item = &Technician> {
        self.order.iter().filter_map(move |key| self.by_name.get(key))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_class_from_position_token() {
        assert_eq!(infer_class("Install Tech - Class 3"), Class::Three);
        assert_eq!(infer_class("class4 lead"), Class::Four);
        assert_eq!(infer_class("Office Manager"), Class::Unknown);
    }

    #[test]
    fn infers_split_default_from_role_keywords() {
        assert_eq!(infer_split_default("Lead Installer"), 65);
        assert_eq!(infer_split_default("Install Assistant"), 35);
        assert_eq!(infer_split_default("Apprentice"), 35);
        assert_eq!(infer_split_default("Office Manager"), 0);
    }

    #[test]
    fn class_one_is_ineligible_except_for_always_on_categories() {
        let tech = Technician {
            name: "Ann".into(),
            department: None,
            position: Some("Class 1 Installer".into()),
            base_hourly_rate: 20.0,
            commission_pct_override: None,
            exempt: false,
            class: Class::One,
            split_default: 0,
        };
        assert!(!is_eligible(&tech, EligibilityCategory::Pbp));
        assert!(is_eligible(&tech, EligibilityCategory::Timesheet));
        assert!(is_eligible(&tech, EligibilityCategory::Kpi));
    }

    #[test]
    fn zero_commission_apprentice_is_ineligible() {
        let tech = Technician {
            name: "Sam".into(),
            department: None,
            position: Some("Apprentice".into()),
            base_hourly_rate: 18.0,
            commission_pct_override: Some(0.0),
            exempt: false,
            class: Class::Unknown,
            split_default: 35,
        };
        assert!(!is_eligible(&tech, EligibilityCategory::Spiff));
    }
}
