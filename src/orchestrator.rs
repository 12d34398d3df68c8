//! Batch orchestrator. Drives the fixed category pipeline for one
//! technician or the whole roster, never letting one category's or one
//! technician's failure abort the run.

use crate::backend::TabularBackend;
use crate::calculators::kpi::KpiIndex;
use crate::calculators::{kpi, lead_set, pbp, service, spiff, timesheet, yard_sign};
use crate::date_range::PayPeriod;
use crate::errors::EngineError;
use crate::ledger;
use crate::model::{CategoryTag, LeadEntry, PbpEntry, ServiceEntry, SpiffBonusEntry, TechnicianLedger, Technician, TimesheetEntry, YardSignEntry};
use crate::roster::{is_eligible, EligibilityCategory, Roster};

/// The fixed per-category order: Spiff/Bonus, PBP, KPI, Yard Sign,
/// Timesheet, Service, Lead Set.
const CATEGORY_ORDER: [&str; 7] = ["Spiff/Bonus", "PBP", "KPI", "Yard Sign", "Timesheet", "Service", "Lead Set"];

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CategoryOutcome {
    Complete,
    /// Not an error: the technician was ineligible, or (for Service) had no
    /// matching row. Recorded with zero/unchanged totals.
    Skipped,
    Error,
}

impl CategoryOutcome {
    fn severity(self) -> u8 {
        match self {
            CategoryOutcome::Complete => 0,
            CategoryOutcome::Skipped => 1,
            CategoryOutcome::Error => 2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TechnicianRunReport {
    pub name: String,
    pub category_outcomes: Vec<(&'static str, CategoryOutcome)>,
    pub worst: CategoryOutcome,
    pub total_pay: f64,
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub technicians: Vec<TechnicianRunReport>,
    /// Roster members the backend reported no ledger destination for.
    pub skipped_technicians: Vec<String>,
}

impl RunReport {
    pub fn any_errors(&self) -> bool {
        self.technicians.iter().any(|t| t.worst == CategoryOutcome::Error)
    }
}

pub struct Orchestrator<'a> {
    roster: &'a Roster,
    pbp_entries: &'a [PbpEntry],
    spiff_entries: &'a [SpiffBonusEntry],
    yard_sign_entries: &'a [YardSignEntry],
    lead_entries: &'a [LeadEntry],
    timesheet_entries: &'a [TimesheetEntry],
    service_entries: &'a [ServiceEntry],
    kpi_index: KpiIndex,
    pay_period: PayPeriod,
}

impl<'a> Orchestrator<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        roster: &'a Roster,
        pbp_entries: &'a [PbpEntry],
        spiff_entries: &'a [SpiffBonusEntry],
        yard_sign_entries: &'a [YardSignEntry],
        lead_entries: &'a [LeadEntry],
        timesheet_entries: &'a [TimesheetEntry],
        service_entries: &'a [ServiceEntry],
        kpi_entries: &'a [crate::model::KpiEntry],
        pay_period: PayPeriod,
    ) -> Self {
        Orchestrator {
            roster,
            pbp_entries,
            spiff_entries,
            yard_sign_entries,
            lead_entries,
            timesheet_entries,
            service_entries,
            kpi_index: KpiIndex::build(kpi_entries),
            pay_period,
        }
    }

    /// Runs every category for one technician, in the fixed order, and
    /// returns the resulting ledger plus a per-category outcome report.
    pub fn run_for_technician(&self, tech: &Technician) -> (TechnicianLedger, TechnicianRunReport) {
        let mut ledger = TechnicianLedger::default();
        let mut outcomes = Vec::with_capacity(CATEGORY_ORDER.len());

        outcomes.push(self.run_category("Spiff/Bonus", tech, &mut ledger, |tech, ledger| {
            let (lines, total) = spiff::calculate_spiff_for_technician(tech, self.spiff_entries);
            ledger::apply_category(ledger, CategoryTag::Spiff, lines, &total);
            category_outcome_for(tech, EligibilityCategory::Spiff)
        }));

        outcomes.push(self.run_category("PBP", tech, &mut ledger, |tech, ledger| {
            let (lines, total) = pbp::calculate_pbp_for_technician(tech, self.pbp_entries, self.roster);
            ledger::apply_category(ledger, CategoryTag::Pbp, lines, &total);
            category_outcome_for(tech, EligibilityCategory::Pbp)
        }));

        outcomes.push(self.run_category("KPI", tech, &mut ledger, |tech, ledger| {
            let (average, bonus) = kpi::average_kpi_for_technician(tech, &self.kpi_index, &self.pay_period);
            ledger::apply_kpi(ledger, average, bonus);
            CategoryOutcome::Complete
        }));

        outcomes.push(self.run_category("Yard Sign", tech, &mut ledger, |tech, ledger| {
            let (lines, total) = yard_sign::calculate_yard_sign_for_technician(tech, self.yard_sign_entries);
            ledger::apply_category(ledger, CategoryTag::YardSign, lines, &total);
            category_outcome_for(tech, EligibilityCategory::YardSign)
        }));

        outcomes.push(self.run_category("Timesheet", tech, &mut ledger, |tech, ledger| {
            let (regular, overtime) = timesheet::aggregate_timesheet_for_technician(tech, self.timesheet_entries);
            ledger::apply_timesheet(ledger, regular, overtime, tech.base_hourly_rate);
            CategoryOutcome::Complete
        }));

        outcomes.push(self.run_category("Service", tech, &mut ledger, |tech, ledger| {
            let lookup = service::lookup_service_for_technician(tech, self.service_entries);
            match lookup {
                Some((revenue, sales)) => {
                    ledger::apply_service(ledger, Some(revenue), Some(sales));
                    CategoryOutcome::Complete
                }
                None => {
                    ledger::apply_service(ledger, None, None);
                    CategoryOutcome::Skipped
                }
            }
        }));

        outcomes.push(self.run_category("Lead Set", tech, &mut ledger, |tech, ledger| {
            let (lines, total, sale_sum) = lead_set::calculate_lead_set_for_technician(tech, self.lead_entries);
            ledger::apply_category(ledger, CategoryTag::LeadSet, lines, &total);
            ledger::apply_lead_set_sale(ledger, sale_sum);
            category_outcome_for(tech, EligibilityCategory::LeadSet)
        }));

        let total_pay = ledger::finalize_total_pay(&mut ledger);
        let worst = outcomes.iter().map(|(_, outcome)| *outcome).max_by_key(|o| o.severity()).unwrap_or(CategoryOutcome::Complete);

        let report =
            TechnicianRunReport { name: tech.name.clone(), category_outcomes: outcomes, worst, total_pay };
        (ledger, report)
    }

    /// Runs `body`, catching a panic so one category's bug never takes down
    /// the rest of the technician's run -- never fatal to other categories
    /// or other technicians.
    fn run_category(
        &self,
        label: &'static str,
        tech: &Technician,
        ledger: &mut TechnicianLedger,
        body: impl FnOnce(&Technician, &mut TechnicianLedger) -> CategoryOutcome,
    ) -> (&'static str, CategoryOutcome) {
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| body(tech, ledger)));
        let outcome = result.unwrap_or_else(|_| {
            tracing::error!(technician = %tech.name, category = label, "category computation panicked");
            CategoryOutcome::Error
        });
        (label, outcome)
    }

    /// Enumerates the roster in order, running every technician the backend
    /// has a ledger destination for and writing the result back.
    pub fn run_all<B: TabularBackend>(&self, backend: &mut B) -> RunReport {
        let mut report = RunReport::default();
        for tech in self.roster.iter() {
            if !backend.has_ledger(&tech.name) {
                tracing::warn!(technician = %tech.name, "no ledger destination found; skipping");
                report.skipped_technicians.push(tech.name.clone());
                continue;
            }
            let (ledger, mut tech_report) = self.run_for_technician(tech);
            if let Err(e) = backend.write_ledger(&tech.name, &ledger) {
                tracing::error!(technician = %tech.name, error = %e, "failed to write ledger");
                tech_report.worst = CategoryOutcome::Error;
            }
            if let Err(e) = backend.update_roster_pay(&tech.name, tech_report.total_pay) {
                tracing::error!(technician = %tech.name, error = %e, "failed to update roster pay");
                tech_report.worst = CategoryOutcome::Error;
            }
            report.technicians.push(tech_report);
        }
        report
    }

    /// Runs and writes back a single named technician.
    pub fn run_for_named_technician<B: TabularBackend>(
        &self,
        backend: &mut B,
        name: &str,
    ) -> anyhow::Result<TechnicianRunReport> {
        let tech = self
            .roster
            .resolve(name)
            .ok_or_else(|| EngineError::NotFound { what: "technician".to_string(), name: name.to_string() })?;
        if !backend.has_ledger(&tech.name) {
            return Err(EngineError::NotFound { what: "ledger".to_string(), name: tech.name.clone() }.into());
        }
        let (ledger, mut report) = self.run_for_technician(tech);
        if let Err(e) = backend.write_ledger(&tech.name, &ledger) {
            report.worst = CategoryOutcome::Error;
            return Err(e.context("failed to write ledger"));
        }
        if let Err(e) = backend.update_roster_pay(&tech.name, report.total_pay) {
            report.worst = CategoryOutcome::Error;
            return Err(e.context("failed to update roster pay"));
        }
        Ok(report)
    }
}

fn category_outcome_for(tech: &Technician, category: EligibilityCategory) -> CategoryOutcome {
    if is_eligible(tech, category) {
        CategoryOutcome::Complete
    } else {
        CategoryOutcome::Skipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Class;

    fn tech(name: &str, class: Class) -> Technician {
        Technician {
            name: name.to_string(),
            department: None,
            position: None,
            base_hourly_rate: 25.0,
            commission_pct_override: None,
            exempt: false,
            class,
            split_default: 0,
        }
    }

    #[test]
    fn category_order_is_fixed_and_complete() {
        assert_eq!(CATEGORY_ORDER, ["Spiff/Bonus", "PBP", "KPI", "Yard Sign", "Timesheet", "Service", "Lead Set"]);
    }

    #[test]
    fn ineligible_class_one_technician_is_skipped_not_errored() {
        let ann = tech("Ann", Class::One);
        let roster = Roster::new(vec![ann.clone()]);
        let pay_period = PayPeriod::parse("03/01/26 - 03/07/26").unwrap();
        let orchestrator =
            Orchestrator::new(&roster, &[], &[], &[], &[], &[], &[], &[], pay_period);
        let (_, report) = orchestrator.run_for_technician(&ann);
        assert!(report.category_outcomes.iter().any(|(label, outcome)| {
            *label == "PBP" && *outcome == CategoryOutcome::Skipped
        }));
        assert_ne!(report.worst, CategoryOutcome::Error);
    }
}
