//! The storage abstraction the orchestrator drives. `TabularBackend` models
//! exactly four operations --
//! `listRoster`/`readTable`/`writeLedger`/`updateRosterPay` -- so the
//! compute engine never depends on how a table is actually stored.

pub mod csv_backend;

use crate::model::TechnicianLedger;
use crate::roster::RosterRow;

/// Logical table names, matching the persistent schema's table identifiers.
pub const TABLE_PBP: &str = "pbp";
pub const TABLE_SPIFF_BONUS: &str = "spiff_bonus";
pub const TABLE_YARD_SIGN: &str = "yard_sign";
pub const TABLE_LEAD_SET: &str = "lead_set";
pub const TABLE_TIME_SHEET: &str = "time_sheet";
pub const TABLE_SERVICE: &str = "service";
pub const TABLE_KPI: &str = "kpi";

pub trait TabularBackend {
    /// All technicians on the roster, as raw (unresolved) rows.
    fn list_roster(&self) -> anyhow::Result<Vec<RosterRow>>;

    /// A logical table's rows, each as an ordered list of cell strings. The
    /// first row is the header.
    fn read_table(&self, table: &str) -> anyhow::Result<Vec<Vec<String>>>;

    /// Whether a ledger destination exists for this technician. A backend
    /// whose ledgers are pre-provisioned (e.g. one tab per technician) may
    /// say `false` for a roster addition that hasn't been set up yet; the
    /// orchestrator skips such technicians rather than failing the run.
    fn has_ledger(&self, technician_name: &str) -> bool;

    /// Writes the computed ledger for a technician, replacing any ledger
    /// previously written for them in this backend.
    fn write_ledger(&mut self, technician_name: &str, ledger: &TechnicianLedger) -> anyhow::Result<()>;

    /// Mirrors a technician's computed total pay back onto their roster row.
    fn update_roster_pay(&mut self, technician_name: &str, total_pay: f64) -> anyhow::Result<()>;
}
