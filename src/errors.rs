//! Typed domain errors for the compensation engine.
//!
//! Category calculators themselves are infallible: a malformed row is
//! skipped and logged rather than raised (see each `calculators::*` module).
//! `EngineError` covers the layer above that — schema resolution and backend
//! I/O — where a problem really does mean the run cannot proceed for that
//! table or technician.
//!
//! `DataParseError` is the exception: `loaders` constructs it at each per-row
//! scalar parse failure and logs it via `Display` before downgrading to a
//! skipped value, so the taxonomy stays meaningful even though the row itself
//! doesn't fail the load.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("table '{table}' has no column mappable to required field '{field}'")]
    SchemaError { table: String, field: String },

    #[error("could not parse {kind} value {raw:?} in table '{table}': {reason}")]
    DataParseError { table: String, kind: String, raw: String, reason: String },

    #[error("{what} '{name}' not found")]
    NotFound { what: String, name: String },

    #[error("backend error: {0}")]
    Backend(#[from] anyhow::Error),
}
