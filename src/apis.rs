//! Integrations with external APIs. The payroll engine's only outbound
//! integration is the optional Google Sheets export path
//! (`--format google-sheets`); everything else is local file I/O.

pub mod google_sheets;
