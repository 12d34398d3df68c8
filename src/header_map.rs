//! Header/schema mapper. Resolves each logical field a table needs to a
//! column index in that table's actual header row, tolerating renamed or
//! reordered columns the way the source spreadsheets drift over time.

/// One logical field's resolution rule: an ordered list of header synonyms
/// to try (exact match first, then substring), and a fallback column index
/// to fall back to if nothing in the header text matches at all.
pub struct FieldSpec {
    pub field: &'static str,
    pub accepted_substrings: &'static [&'static str],
    pub fallback_index: Option<usize>,
}

pub struct HeaderMap {
    indices: std::collections::HashMap<&'static str, usize>,
}

impl HeaderMap {
    /// Builds a map from a table's header row and the field specs it needs.
    /// For each field: first exact (case-insensitive, trimmed) match against
    /// any accepted synonym wins; otherwise the first accepted synonym (in
    /// list order) that appears as a substring of any header cell (scanned
    /// left to right) wins; otherwise the fallback index, if any.
    pub fn build(header_row: &[String], specs: &[FieldSpec]) -> Self {
        let normalized: Vec<String> = header_row.iter().map(|h| h.trim().to_lowercase()).collect();
        let mut indices = std::collections::HashMap::new();
        for spec in specs {
            if let Some(idx) = Self::resolve_field(&normalized, spec) {
                indices.insert(spec.field, idx);
            }
        }
        HeaderMap { indices }
    }

    fn resolve_field(normalized: &[String], spec: &FieldSpec) -> Option<usize> {
        for accepted in spec.accepted_substrings {
            let accepted = accepted.to_lowercase();
            if let Some(idx) = normalized.iter().position(|h| *h == accepted) {
                return Some(idx);
            }
        }
        for accepted in spec.accepted_substrings {
            let accepted = accepted.to_lowercase();
            if let Some(idx) = normalized.iter().position(|h| h.contains(&accepted)) {
                return Some(idx);
            }
        }
        spec.fallback_index
    }

    pub fn index_of(&self, field: &str) -> Option<usize> {
        self.indices.get(field).copied()
    }

    /// Like [`Self::index_of`], but for a field the caller treats as fatal
    /// when unmapped. Used for the handful of fields a category cannot
    /// compute anything meaningful without, e.g. PBP's amount column.
    pub fn require(&self, table: &str, field: &'static str) -> Result<usize, crate::errors::EngineError> {
        self.index_of(field).ok_or_else(|| crate::errors::EngineError::SchemaError {
            table: table.to_string(),
            field: field.to_string(),
        })
    }

    /// Looks up the cell for `field` in `row`, trimmed. `None` if the field
    /// was never mapped or the row is too short to hold that column.
    pub fn cell<'a>(&self, row: &'a [String], field: &str) -> Option<&'a str> {
        let idx = self.index_of(field)?;
        row.get(idx).map(|s| s.trim())
    }
}

pub const ROSTER_FIELDS: &[FieldSpec] = &[
    FieldSpec { field: "name", accepted_substrings: &["name", "technician", "employee"], fallback_index: Some(0) },
    FieldSpec { field: "department", accepted_substrings: &["department", "dept"], fallback_index: Some(1) },
    FieldSpec { field: "position", accepted_substrings: &["position", "title", "role"], fallback_index: Some(2) },
    FieldSpec { field: "base_rate", accepted_substrings: &["base rate", "base hourly rate", "hourly rate", "rate"], fallback_index: Some(3) },
    FieldSpec { field: "exempt", accepted_substrings: &["exempt"], fallback_index: Some(4) },
    FieldSpec { field: "commission_override", accepted_substrings: &["commission", "commission override", "commission pct"], fallback_index: Some(7) },
    FieldSpec { field: "pay", accepted_substrings: &["pay", "total pay"], fallback_index: Some(8) },
    FieldSpec { field: "approval", accepted_substrings: &["approval", "approved"], fallback_index: Some(9) },
];

// `assigned_technicians` and `cross_sale_group` carry no fallback index:
// these are the fields whose absence is fatal to the category, so guessing a
// position for them would silently manufacture PBP amounts/teams out of the
// wrong column instead of surfacing the schema problem.
pub const PBP_FIELDS: &[FieldSpec] = &[
    FieldSpec { field: "customer", accepted_substrings: &["customer", "client"], fallback_index: Some(0) },
    FieldSpec { field: "business_unit", accepted_substrings: &["business unit", "job business unit"], fallback_index: Some(1) },
    FieldSpec { field: "completion_date", accepted_substrings: &["completion date", "completed date", "date completed"], fallback_index: Some(2) },
    FieldSpec { field: "primary_technician", accepted_substrings: &["primary technician", "primary tech", "lead technician"], fallback_index: Some(3) },
    FieldSpec { field: "assigned_technicians", accepted_substrings: &["assigned technicians", "assigned techs", "technicians"], fallback_index: None },
    FieldSpec { field: "item_name", accepted_substrings: &["item name", "item", "product"], fallback_index: Some(5) },
    FieldSpec { field: "cross_sale_group", accepted_substrings: &["cross sale group", "cross-sale group", "group"], fallback_index: None },
];

pub const SPIFF_FIELDS: &[FieldSpec] = &[
    FieldSpec { field: "customer", accepted_substrings: &["customer", "client"], fallback_index: Some(0) },
    FieldSpec { field: "business_unit", accepted_substrings: &["business unit", "job business unit"], fallback_index: Some(1) },
    FieldSpec { field: "completion_date", accepted_substrings: &["completion date", "completed date", "date completed"], fallback_index: Some(2) },
    FieldSpec { field: "sold_by", accepted_substrings: &["sold by", "salesperson"], fallback_index: Some(3) },
    FieldSpec { field: "assigned_technicians", accepted_substrings: &["assigned technicians", "assigned techs", "technicians"], fallback_index: None },
    FieldSpec { field: "item_name", accepted_substrings: &["item name", "item", "product"], fallback_index: Some(5) },
    FieldSpec { field: "bonus_amount", accepted_substrings: &["bonus amount", "bonus", "spiff"], fallback_index: None },
];

pub const YARD_SIGN_FIELDS: &[FieldSpec] = &[
    FieldSpec { field: "customer", accepted_substrings: &["customer", "client"], fallback_index: Some(0) },
    FieldSpec { field: "job_number", accepted_substrings: &["job number", "job #", "job id"], fallback_index: Some(1) },
    FieldSpec { field: "business_unit", accepted_substrings: &["business unit"], fallback_index: Some(2) },
    FieldSpec { field: "completion_date", accepted_substrings: &["completion date", "completed date"], fallback_index: Some(3) },
    FieldSpec { field: "jobs_total", accepted_substrings: &["jobs total", "job total", "total"], fallback_index: Some(4) },
    FieldSpec { field: "tags", accepted_substrings: &["tags", "tag"], fallback_index: Some(5) },
    FieldSpec { field: "assigned_technicians", accepted_substrings: &["assigned technicians", "assigned techs", "technicians"], fallback_index: Some(6) },
];

pub const LEAD_SET_FIELDS: &[FieldSpec] = &[
    FieldSpec { field: "customer", accepted_substrings: &["customer", "client"], fallback_index: Some(0) },
    FieldSpec { field: "business_unit", accepted_substrings: &["business unit"], fallback_index: Some(1) },
    FieldSpec { field: "completion_date", accepted_substrings: &["completion date", "completed date"], fallback_index: Some(2) },
    FieldSpec { field: "revenue", accepted_substrings: &["revenue", "sale amount", "amount"], fallback_index: Some(3) },
    FieldSpec { field: "notes", accepted_substrings: &["notes", "note"], fallback_index: Some(4) },
    FieldSpec { field: "sold_by_technician", accepted_substrings: &["sold by", "sold by technician", "technician"], fallback_index: Some(5) },
];

pub const TIMESHEET_FIELDS: &[FieldSpec] = &[
    FieldSpec { field: "employee_name", accepted_substrings: &["employee name", "employee", "name"], fallback_index: Some(0) },
    FieldSpec { field: "date", accepted_substrings: &["date"], fallback_index: Some(1) },
    FieldSpec { field: "regular_hours", accepted_substrings: &["regular hours", "reg hours"], fallback_index: Some(2) },
    FieldSpec { field: "overtime_hours", accepted_substrings: &["overtime hours", "ot hours"], fallback_index: Some(3) },
];

pub const KPI_FIELDS: &[FieldSpec] = &[
    FieldSpec { field: "technician", accepted_substrings: &["technician", "employee", "name"], fallback_index: Some(0) },
    FieldSpec { field: "date", accepted_substrings: &["date"], fallback_index: Some(1) },
    FieldSpec { field: "percentage", accepted_substrings: &["percentage", "call by call", "score", "pct"], fallback_index: Some(2) },
];

pub const SERVICE_FIELDS: &[FieldSpec] = &[
    FieldSpec { field: "technician", accepted_substrings: &["technician", "employee", "name"], fallback_index: Some(0) },
    FieldSpec { field: "total_sales", accepted_substrings: &["total sales", "sales"], fallback_index: Some(1) },
    FieldSpec { field: "completed_revenue", accepted_substrings: &["completed revenue", "revenue"], fallback_index: Some(2) },
    FieldSpec { field: "completed_jobs", accepted_substrings: &["completed jobs", "jobs"], fallback_index: Some(3) },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_wins_over_substring() {
        let header = vec!["Job Number".to_string(), "Customer Name".to_string()];
        let specs = &[FieldSpec {
            field: "customer",
            accepted_substrings: &["customer", "customer name"],
            fallback_index: None,
        }];
        let map = HeaderMap::build(&header, specs);
        // "customer name" matches exactly at index 1; "customer" (listed
        // first) only ever matches as a substring, so the exact match wins.
        assert_eq!(map.index_of("customer"), Some(1));
    }

    #[test]
    fn falls_back_to_index_when_unmapped() {
        let header = vec!["???".to_string(), "???".to_string()];
        let specs = &[FieldSpec { field: "name", accepted_substrings: &["name"], fallback_index: Some(1) }];
        let map = HeaderMap::build(&header, specs);
        assert_eq!(map.index_of("name"), Some(1));
    }

    #[test]
    fn require_succeeds_when_mapped() {
        let header = vec!["Customer".to_string()];
        let specs = &[FieldSpec { field: "customer", accepted_substrings: &["customer"], fallback_index: None }];
        let map = HeaderMap::build(&header, specs);
        assert_eq!(map.require("PBP", "customer").unwrap(), 0);
    }

    #[test]
    fn require_fails_with_schema_error_when_unmappable() {
        let header = vec!["???".to_string()];
        let specs = &[FieldSpec { field: "cross_sale_group", accepted_substrings: &["cross sale group"], fallback_index: None }];
        let map = HeaderMap::build(&header, specs);
        let err = map.require("PBP", "cross_sale_group").unwrap_err();
        assert!(matches!(err, crate::errors::EngineError::SchemaError { .. }));
    }
}
