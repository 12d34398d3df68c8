//! The per-category compensation calculators. Each is a pure
//! function (or small pair of functions) from a technician plus a table of
//! entries to either a set of [`crate::model::ComputedLine`]s or a pair of
//! summary numbers -- no I/O, no shared mutable state beyond the read-only
//! [`kpi::KpiIndex`] the orchestrator builds once per run.

pub mod kpi;
pub mod lead_set;
mod names;
pub mod pbp;
pub mod service;
pub mod spiff;
pub mod timesheet;
pub mod yard_sign;
