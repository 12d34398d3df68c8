//! Wire types for the Google Sheets v4 REST API: just enough of
//! `Spreadsheet`/`Sheet`/`GridData` to push a finished ledger report up as a
//! new tab, and the `batchUpdate` request shapes needed to patch an existing
//! one in place. See
//! <https://developers.google.com/sheets/api/reference/rest/v4/spreadsheets>.

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Spreadsheet {
    pub properties: SpreadsheetProperties,
    pub sheets: Option<Vec<Sheet>>,
    pub spreadsheet_id: Option<String>,
    pub spreadsheet_url: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct SpreadsheetProperties {
    pub title: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Sheet {
    pub properties: SheetProperties,
    pub data: Option<GridData>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct SheetProperties {
    pub sheet_id: Option<u64>,
    pub title: Option<String>,
    pub grid_properties: Option<GridProperties>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct GridProperties {
    pub row_count: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct GridData {
    pub row_data: Vec<RowData>,
    pub start_row: u64,
    pub start_column: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct RowData {
    pub values: Vec<CellData>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct CellData {
    pub user_entered_value: Option<ExtendedValue>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub enum ExtendedValue {
    StringValue(String),
    NumberValue(f64),
    BoolValue(bool),
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
#[serde(rename_all = "camelCase")]
pub struct GridCoordinate {
    pub sheet_id: u64,
    pub row_index: u64,
    pub column_index: u64,
}

/// Request payloads for the `spreadsheets.batchUpdate` endpoint. Each variant
/// serializes to the externally-tagged shape the API expects, e.g.
/// `{"addSheet": {"properties": {...}}}`.
pub mod update {
    use super::{GridCoordinate, RowData, SheetProperties, SpreadsheetProperties};
    use serde::Serialize;

    #[derive(Serialize, Debug, Clone)]
    #[serde(rename_all = "camelCase")]
    pub enum Request {
        UpdateSpreadsheetProperties { properties: SpreadsheetProperties, fields: &'static str },
        AddSheet { properties: SheetProperties },
        UpdateCells { rows: Vec<RowData>, fields: &'static str, start: GridCoordinate },
        DeleteSheet { sheet_id: u64 },
    }
}
