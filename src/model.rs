//! The plain-data shapes that flow through the compensation engine: the
//! technician roster, the per-category input rows, and the computed output
//! that the ledger writer materializes.

use std::fmt;

use chrono::NaiveDate;

/// A technician's skill tier. Drives PBP eligibility and default role.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Class {
    One,
    Two,
    Three,
    Four,
    Unknown,
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Class::One => write!(f, "Class 1"),
            Class::Two => write!(f, "Class 2"),
            Class::Three => write!(f, "Class 3"),
            Class::Four => write!(f, "Class 4"),
            Class::Unknown => write!(f, "Unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Technician {
    pub name: String,
    pub department: Option<String>,
    pub position: Option<String>,
    pub base_hourly_rate: f64,
    pub commission_pct_override: Option<f64>,
    pub exempt: bool,
    pub class: Class,
    /// Default split percentage (0, 35, or 65) inferred from role keywords
    /// when the position string carries no explicit `Class X` token. Not
    /// itself consumed by the PBP split table (which keys off `class`
    /// directly), but part of the resolved technician record per spec.
    pub split_default: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PbpEntry {
    pub customer: String,
    pub job_business_unit: Option<String>,
    pub completion_date: Option<NaiveDate>,
    pub primary_technician: Option<String>,
    pub assigned_technicians_raw: String,
    pub item_name: Option<String>,
    pub cross_sale_group: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpiffBonusEntry {
    pub customer: String,
    pub job_business_unit: Option<String>,
    pub completion_date: Option<NaiveDate>,
    pub sold_by: Option<String>,
    pub assigned_technicians: String,
    pub item_name: Option<String>,
    pub bonus_amount_raw: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct YardSignEntry {
    pub customer: String,
    pub job_number: Option<String>,
    pub business_unit: Option<String>,
    pub completion_date: Option<NaiveDate>,
    pub jobs_total: Option<f64>,
    pub tags: String,
    pub assigned_technicians: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeadEntry {
    pub customer: String,
    pub business_unit: Option<String>,
    pub completion_date: Option<NaiveDate>,
    pub revenue: f64,
    pub notes: Option<String>,
    pub sold_by_technician: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimesheetEntry {
    pub employee_name: String,
    pub date: Option<NaiveDate>,
    pub regular_hours: f64,
    pub overtime_hours: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KpiEntry {
    pub technician: String,
    pub date: NaiveDate,
    /// Already normalized to `[0, 1]` by the time it lands here; see
    /// `parsing::parse_percent`.
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceEntry {
    pub technician: String,
    pub total_sales: f64,
    pub completed_revenue: f64,
    pub completed_jobs: Option<u32>,
}

/// Which category a [`ComputedLine`] was produced by. Only the four
/// eligibility-gated, line-producing categories get a tag; Timesheet, KPI,
/// and Service write directly into the ledger summary.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CategoryTag {
    Pbp,
    Spiff,
    YardSign,
    LeadSet,
}

impl fmt::Display for CategoryTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryTag::Pbp => write!(f, "PBP"),
            CategoryTag::Spiff => write!(f, "Spiff"),
            CategoryTag::YardSign => write!(f, "Yard Sign"),
            CategoryTag::LeadSet => write!(f, "Lead Set"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComputedLine {
    pub customer: String,
    pub business_unit: Option<String>,
    pub completion_date: Option<NaiveDate>,
    pub amount: f64,
    pub notes: Option<String>,
    pub category_tag: CategoryTag,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    pub category_tag: CategoryTag,
    pub count: usize,
    pub amount: f64,
}

/// The summary section of a technician's ledger. Field names follow the
/// persistent ledger schema, with each category's output landing in its own
/// field (PBP -> `total_install_pay`, Spiff -> `bonus`, Yard Sign ->
/// `yard_sign_spiff`, Lead Set -> `lead_set_sale`/`lead_set_commission`,
/// Timesheet -> `regular_hours`/`overtime_hours`/`total_hourly_pay`, KPI ->
/// `call_by_call_score`/`kpi_bonus`, Service ->
/// `completed_revenue`/`total_sales`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerSummary {
    pub total_hourly_pay: f64,
    pub regular_hours: f64,
    pub overtime_hours: f64,
    pub pto_hours: f64,
    pub bonus: f64,
    pub yard_sign_spiff: f64,
    pub total_install_pay: f64,
    pub lead_set_sale: f64,
    pub lead_set_commission: f64,
    pub call_by_call_score: f64,
    pub kpi_bonus: f64,
    pub completed_revenue: f64,
    pub total_sales: f64,
    pub total_pay: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TechnicianLedger {
    /// Ordered list of computed lines across all categories. Order within a
    /// category follows the order its entries appeared in the source table.
    pub lines: Vec<ComputedLine>,
    pub summary: LedgerSummary,
}

impl TechnicianLedger {
    /// Lines tagged with the given category, in ledger order.
    pub fn lines_for(&self, tag: CategoryTag) -> impl Iterator<Item = &ComputedLine> {
        self.lines.iter().filter(move |line| line.category_tag == tag)
    }
}
