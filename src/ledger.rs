//! Per-technician ledger writer. Applies a category's computed output to a
//! [`TechnicianLedger`] under a tagged-block contract: writing a category
//! replaces exactly the rows previously tagged with that category (in the
//! new source order) and updates the matching summary cell(s) to the new
//! total.

use crate::model::{CategoryTag, CategoryTotal, ComputedLine, TechnicianLedger};

/// Replaces all lines tagged `tag` with `lines`, and updates the summary
/// field that category feeds.
pub fn apply_category(ledger: &mut TechnicianLedger, tag: CategoryTag, lines: Vec<ComputedLine>, total: &CategoryTotal) {
    debug_assert!(lines.iter().all(|l| l.category_tag == tag));
    ledger.lines.retain(|line| line.category_tag != tag);
    ledger.lines.extend(lines);

    match tag {
        CategoryTag::Pbp => ledger.summary.total_install_pay = total.amount,
        CategoryTag::Spiff => ledger.summary.bonus = total.amount,
        CategoryTag::YardSign => ledger.summary.yard_sign_spiff = total.amount,
        CategoryTag::LeadSet => ledger.summary.lead_set_commission = total.amount,
    }
}

/// Lead Set is the one category with two summary fields: the commission
/// (applied via [`apply_category`]) and the raw revenue sum.
pub fn apply_lead_set_sale(ledger: &mut TechnicianLedger, sale_sum: f64) {
    ledger.summary.lead_set_sale = sale_sum;
}

/// Feeds in the Timesheet category's output: hours, plus the derived hourly
/// pay (`base_rate * regular + base_rate * 1.5 * overtime`).
pub fn apply_timesheet(ledger: &mut TechnicianLedger, regular_hours: f64, overtime_hours: f64, base_hourly_rate: f64) {
    ledger.summary.regular_hours = regular_hours;
    ledger.summary.overtime_hours = overtime_hours;
    ledger.summary.total_hourly_pay = base_hourly_rate * regular_hours + base_hourly_rate * 1.5 * overtime_hours;
}

pub fn apply_kpi(ledger: &mut TechnicianLedger, average: f64, bonus: f64) {
    ledger.summary.call_by_call_score = average;
    ledger.summary.kpi_bonus = bonus;
}

/// `None` for either field leaves it unchanged: a missing Service row
/// should not zero out a previously-written value.
pub fn apply_service(ledger: &mut TechnicianLedger, revenue: Option<f64>, sales: Option<f64>) {
    if let Some(revenue) = revenue {
        ledger.summary.completed_revenue = revenue;
    }
    if let Some(sales) = sales {
        ledger.summary.total_sales = sales;
    }
}

/// `total_pay = total_hourly_pay + bonus + total_install_pay +
/// yard_sign_spiff + lead_set_commission + kpi_bonus`. Service's fields are
/// informational and excluded. Call once all categories have run.
pub fn finalize_total_pay(ledger: &mut TechnicianLedger) -> f64 {
    let summary = &mut ledger.summary;
    summary.total_pay = summary.total_hourly_pay
        + summary.bonus
        + summary.total_install_pay
        + summary.yard_sign_spiff
        + summary.lead_set_commission
        + summary.kpi_bonus;
    summary.total_pay
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(tag: CategoryTag, amount: f64) -> ComputedLine {
        ComputedLine { customer: "Acme".into(), business_unit: None, completion_date: None, amount, notes: None, category_tag: tag }
    }

    #[test]
    fn reapplying_a_category_replaces_its_block_only() {
        let mut ledger = TechnicianLedger::default();
        apply_category(
            &mut ledger,
            CategoryTag::Pbp,
            vec![line(CategoryTag::Pbp, 100.0)],
            &CategoryTotal { category_tag: CategoryTag::Pbp, count: 1, amount: 100.0 },
        );
        apply_category(
            &mut ledger,
            CategoryTag::Spiff,
            vec![line(CategoryTag::Spiff, 50.0)],
            &CategoryTotal { category_tag: CategoryTag::Spiff, count: 1, amount: 50.0 },
        );
        assert_eq!(ledger.lines.len(), 2);

        apply_category(
            &mut ledger,
            CategoryTag::Pbp,
            vec![line(CategoryTag::Pbp, 260.0), line(CategoryTag::Pbp, 40.0)],
            &CategoryTotal { category_tag: CategoryTag::Pbp, count: 2, amount: 300.0 },
        );
        assert_eq!(ledger.lines.len(), 3);
        assert_eq!(ledger.summary.total_install_pay, 300.0);
        assert_eq!(ledger.summary.bonus, 50.0);
    }

    #[test]
    fn total_pay_excludes_service_fields() {
        let mut ledger = TechnicianLedger::default();
        ledger.summary.total_hourly_pay = 800.0;
        ledger.summary.bonus = 50.0;
        ledger.summary.total_install_pay = 300.0;
        ledger.summary.yard_sign_spiff = 25.0;
        ledger.summary.lead_set_commission = 100.0;
        ledger.summary.kpi_bonus = 100.0;
        ledger.summary.completed_revenue = 99_999.0;
        ledger.summary.total_sales = 99_999.0;

        let total = finalize_total_pay(&mut ledger);
        assert_eq!(total, 1375.0);
    }
}
