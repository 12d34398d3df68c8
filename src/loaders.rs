//! Turns the raw string rows a [`crate::backend::TabularBackend`] returns
//! into typed entry structs, using the header map to find each logical
//! field's column and `parsing` to normalize its value. A row that's
//! missing a required value is skipped and logged, never fatal to the load.

use crate::errors::EngineError;
use crate::header_map::{
    HeaderMap, KPI_FIELDS, LEAD_SET_FIELDS, PBP_FIELDS, ROSTER_FIELDS, SERVICE_FIELDS, SPIFF_FIELDS,
    TIMESHEET_FIELDS, YARD_SIGN_FIELDS,
};
use crate::model::{KpiEntry, LeadEntry, PbpEntry, ServiceEntry, SpiffBonusEntry, TimesheetEntry, YardSignEntry};
use crate::parsing::{parse_date, parse_money, parse_percent};
use crate::roster::RosterRow;

fn split_table(rows: &[Vec<String>]) -> Option<(&[String], &[Vec<String>])> {
    let (header, data) = rows.split_first()?;
    Some((header.as_slice(), data))
}

fn field<'a>(map: &HeaderMap, row: &'a [String], field: &str) -> Option<&'a str> {
    map.cell(row, field).filter(|s| !s.is_empty())
}

/// Downgrades a scalar parse failure to a logged, skipped value: builds the
/// typed `DataParseError` spec.md §7 names, logs it via its `Display`, then
/// returns `None` so the caller can fall back to a default or drop the row.
fn parse_logged<T, E: std::fmt::Display>(
    table: &str,
    kind: &str,
    raw: &str,
    result: Result<T, E>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            let err = EngineError::DataParseError {
                table: table.to_string(),
                kind: kind.to_string(),
                raw: raw.to_string(),
                reason: e.to_string(),
            };
            tracing::warn!("{}", err);
            None
        }
    }
}

pub fn load_roster(table: &str, rows: &[Vec<String>]) -> Vec<RosterRow> {
    let Some((header, data)) = split_table(rows) else { return Vec::new() };
    let map = HeaderMap::build(header, ROSTER_FIELDS);
    data.iter()
        .enumerate()
        .filter_map(|(i, row)| {
            let Some(name) = field(&map, row, "name") else {
                tracing::warn!(table, row = i, "roster row has no resolvable name; skipped");
                return None;
            };
            Some(RosterRow {
                name: name.to_string(),
                department: field(&map, row, "department").unwrap_or_default().to_string(),
                position: field(&map, row, "position").unwrap_or_default().to_string(),
                base_rate_raw: field(&map, row, "base_rate").unwrap_or_default().to_string(),
                exempt_raw: field(&map, row, "exempt").unwrap_or_default().to_string(),
                commission_override_raw: field(&map, row, "commission_override").unwrap_or_default().to_string(),
            })
        })
        .collect()
}

/// PBP's amount column and the assigned-technicians column are the two
/// fields whose absence is fatal to the whole category (every other field
/// degrades gracefully to an optional, per-row skip).
pub fn load_pbp_entries(table: &str, rows: &[Vec<String>]) -> Result<Vec<PbpEntry>, EngineError> {
    let Some((header, data)) = split_table(rows) else { return Ok(Vec::new()) };
    let map = HeaderMap::build(header, PBP_FIELDS);
    map.require(table, "cross_sale_group")?;
    map.require(table, "assigned_technicians")?;
    Ok(data.iter()
        .enumerate()
        .filter_map(|(i, row)| {
            let Some(customer) = field(&map, row, "customer") else {
                tracing::warn!(table, row = i, "PBP row has no customer; skipped");
                return None;
            };
            let completion_date =
                field(&map, row, "completion_date").and_then(|raw| parse_logged(table, "completion_date", raw, parse_date(raw)));
            Some(PbpEntry {
                customer: customer.to_string(),
                job_business_unit: field(&map, row, "business_unit").map(str::to_string),
                completion_date,
                primary_technician: field(&map, row, "primary_technician").map(str::to_string),
                assigned_technicians_raw: field(&map, row, "assigned_technicians").unwrap_or_default().to_string(),
                item_name: field(&map, row, "item_name").map(str::to_string),
                cross_sale_group: field(&map, row, "cross_sale_group").unwrap_or_default().to_string(),
            })
        })
        .collect())
}

pub fn load_spiff_entries(table: &str, rows: &[Vec<String>]) -> Result<Vec<SpiffBonusEntry>, EngineError> {
    let Some((header, data)) = split_table(rows) else { return Ok(Vec::new()) };
    let map = HeaderMap::build(header, SPIFF_FIELDS);
    map.require(table, "assigned_technicians")?;
    map.require(table, "bonus_amount")?;
    Ok(data
        .iter()
        .enumerate()
        .filter_map(|(i, row)| {
            let Some(customer) = field(&map, row, "customer") else {
                tracing::warn!(table, row = i, "Spiff/Bonus row has no customer; skipped");
                return None;
            };
            let completion_date =
                field(&map, row, "completion_date").and_then(|raw| parse_logged(table, "completion_date", raw, parse_date(raw)));
            Some(SpiffBonusEntry {
                customer: customer.to_string(),
                job_business_unit: field(&map, row, "business_unit").map(str::to_string),
                completion_date,
                sold_by: field(&map, row, "sold_by").map(str::to_string),
                assigned_technicians: field(&map, row, "assigned_technicians").unwrap_or_default().to_string(),
                item_name: field(&map, row, "item_name").map(str::to_string),
                bonus_amount_raw: field(&map, row, "bonus_amount").unwrap_or_default().to_string(),
            })
        })
        .collect())
}

pub fn load_yard_sign_entries(table: &str, rows: &[Vec<String>]) -> Vec<YardSignEntry> {
    let Some((header, data)) = split_table(rows) else { return Vec::new() };
    let map = HeaderMap::build(header, YARD_SIGN_FIELDS);
    data.iter()
        .enumerate()
        .filter_map(|(i, row)| {
            let Some(customer) = field(&map, row, "customer") else {
                tracing::warn!(table, row = i, "Yard Sign row has no customer; skipped");
                return None;
            };
            let completion_date =
                field(&map, row, "completion_date").and_then(|raw| parse_logged(table, "completion_date", raw, parse_date(raw)));
            let jobs_total =
                field(&map, row, "jobs_total").and_then(|raw| parse_logged(table, "jobs_total", raw, parse_money(raw)));
            Some(YardSignEntry {
                customer: customer.to_string(),
                job_number: field(&map, row, "job_number").map(str::to_string),
                business_unit: field(&map, row, "business_unit").map(str::to_string),
                completion_date,
                jobs_total,
                tags: field(&map, row, "tags").unwrap_or_default().to_string(),
                assigned_technicians: field(&map, row, "assigned_technicians").unwrap_or_default().to_string(),
            })
        })
        .collect()
}

pub fn load_lead_entries(table: &str, rows: &[Vec<String>]) -> Vec<LeadEntry> {
    let Some((header, data)) = split_table(rows) else { return Vec::new() };
    let map = HeaderMap::build(header, LEAD_SET_FIELDS);
    data.iter()
        .enumerate()
        .filter_map(|(i, row)| {
            let Some(customer) = field(&map, row, "customer") else {
                tracing::warn!(table, row = i, "Lead Set row has no customer; skipped");
                return None;
            };
            let Some(sold_by_technician) = field(&map, row, "sold_by_technician") else {
                tracing::warn!(table, row = i, customer, "Lead Set row has no sold-by technician; skipped");
                return None;
            };
            let revenue = match field(&map, row, "revenue") {
                Some(raw) => match parse_logged(table, "revenue", raw, parse_money(raw)) {
                    Some(value) => value,
                    None => return None,
                },
                None => {
                    tracing::warn!(table, row = i, customer, "Lead Set row has no revenue; skipped");
                    return None;
                }
            };
            let completion_date =
                field(&map, row, "completion_date").and_then(|raw| parse_logged(table, "completion_date", raw, parse_date(raw)));
            Some(LeadEntry {
                customer: customer.to_string(),
                business_unit: field(&map, row, "business_unit").map(str::to_string),
                completion_date,
                revenue,
                notes: field(&map, row, "notes").map(str::to_string),
                sold_by_technician: sold_by_technician.to_string(),
            })
        })
        .collect()
}

pub fn load_timesheet_entries(table: &str, rows: &[Vec<String>]) -> Vec<TimesheetEntry> {
    let Some((header, data)) = split_table(rows) else { return Vec::new() };
    let map = HeaderMap::build(header, TIMESHEET_FIELDS);
    data.iter()
        .enumerate()
        .filter_map(|(i, row)| {
            let Some(employee_name) = field(&map, row, "employee_name") else {
                tracing::warn!(table, row = i, "timesheet row has no employee name; skipped");
                return None;
            };
            let date = field(&map, row, "date").and_then(|raw| parse_logged(table, "date", raw, parse_date(raw)));
            let regular_hours = field(&map, row, "regular_hours")
                .and_then(|raw| parse_logged(table, "regular_hours", raw, parse_money(raw)))
                .unwrap_or(0.0);
            let overtime_hours = field(&map, row, "overtime_hours")
                .and_then(|raw| parse_logged(table, "overtime_hours", raw, parse_money(raw)))
                .unwrap_or(0.0);
            Some(TimesheetEntry { employee_name: employee_name.to_string(), date, regular_hours, overtime_hours })
        })
        .collect()
}

pub fn load_kpi_entries(table: &str, rows: &[Vec<String>]) -> Vec<KpiEntry> {
    let Some((header, data)) = split_table(rows) else { return Vec::new() };
    let map = HeaderMap::build(header, KPI_FIELDS);
    data.iter()
        .enumerate()
        .filter_map(|(i, row)| {
            let Some(technician) = field(&map, row, "technician") else {
                tracing::warn!(table, row = i, "KPI row has no technician; skipped");
                return None;
            };
            let Some(date) = field(&map, row, "date").and_then(|raw| parse_logged(table, "date", raw, parse_date(raw)))
            else {
                tracing::warn!(table, row = i, technician, "KPI row has no parseable date; skipped");
                return None;
            };
            let percentage = field(&map, row, "percentage")
                .and_then(|raw| parse_logged(table, "percentage", raw, parse_percent(raw)))
                .unwrap_or(0.0);
            Some(KpiEntry { technician: technician.to_string(), date, percentage })
        })
        .collect()
}

pub fn load_service_entries(table: &str, rows: &[Vec<String>]) -> Vec<ServiceEntry> {
    let Some((header, data)) = split_table(rows) else { return Vec::new() };
    let map = HeaderMap::build(header, SERVICE_FIELDS);
    data.iter()
        .enumerate()
        .filter_map(|(i, row)| {
            let Some(technician) = field(&map, row, "technician") else {
                tracing::warn!(table, row = i, "service row has no technician; skipped");
                return None;
            };
            let total_sales = field(&map, row, "total_sales")
                .and_then(|raw| parse_logged(table, "total_sales", raw, parse_money(raw)))
                .unwrap_or(0.0);
            let completed_revenue = field(&map, row, "completed_revenue")
                .and_then(|raw| parse_logged(table, "completed_revenue", raw, parse_money(raw)))
                .unwrap_or(0.0);
            let completed_jobs = field(&map, row, "completed_jobs")
                .and_then(|raw| parse_logged(table, "completed_jobs", raw, raw.parse::<u32>()));
            Some(ServiceEntry { technician: technician.to_string(), total_sales, completed_revenue, completed_jobs })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn pbp_loads_when_required_columns_are_mapped() {
        let rows = vec![
            row(&["Customer", "Business Unit", "Completion Date", "Primary Technician", "Assigned Technicians", "Item Name", "Cross Sale Group"]),
            row(&["Acme", "Residential", "03/01/2026", "John", "John, Jane", "Install", "PBP 400"]),
        ];
        let entries = load_pbp_entries("pbp", &rows).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].cross_sale_group, "PBP 400");
    }

    #[test]
    fn pbp_surfaces_schema_error_when_amount_column_is_missing() {
        let rows = vec![
            row(&["Customer", "Business Unit", "Completion Date", "Primary Technician", "Assigned Technicians", "Item Name"]),
            row(&["Acme", "Residential", "03/01/2026", "John", "John, Jane", "Install"]),
        ];
        let err = load_pbp_entries("pbp", &rows).unwrap_err();
        assert!(matches!(err, EngineError::SchemaError { field, .. } if field == "cross_sale_group"));
    }

    #[test]
    fn spiff_surfaces_schema_error_when_assigned_technicians_column_is_missing() {
        let rows = vec![
            row(&["Customer", "Business Unit", "Completion Date", "Sold By", "Item Name", "Bonus Amount"]),
            row(&["Acme", "Residential", "03/01/2026", "John", "Widget", "50"]),
        ];
        let err = load_spiff_entries("spiff_bonus", &rows).unwrap_err();
        assert!(matches!(err, EngineError::SchemaError { field, .. } if field == "assigned_technicians"));
    }

    #[test]
    fn lead_set_row_with_unparseable_revenue_is_skipped_not_fatal() {
        let rows = vec![
            row(&["Customer", "Business Unit", "Completion Date", "Revenue", "Notes", "Sold By Technician"]),
            row(&["Acme", "Residential", "03/01/2026", "not-a-number", "", "John"]),
        ];
        let entries = load_lead_entries("lead_set", &rows);
        assert!(entries.is_empty());
    }

    #[test]
    fn kpi_row_with_unparseable_date_is_skipped_not_fatal() {
        let rows = vec![
            row(&["Technician", "Date", "Percentage"]),
            row(&["John", "not-a-date", "95"]),
        ];
        let entries = load_kpi_entries("kpi", &rows);
        assert!(entries.is_empty());
    }
}
