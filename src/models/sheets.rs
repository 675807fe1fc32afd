//! Spreadsheet addressing and Sheets API payloads.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::AppError;

/// A1-notation range such as `Sheet1!A1:B1` or `'My Sheet'!A:B`.
///
/// Only presence is validated; the provider interprets the rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeSpec(String);

impl RangeSpec {
    pub fn new(range: impl Into<String>) -> Result<Self, AppError> {
        let range = range.into().trim().to_string();
        if range.is_empty() {
            return Err(AppError::Validation("range is required".to_string()));
        }
        Ok(Self(range))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Sheet name part, unquoted. `None` when the range has no `!` (first sheet).
    pub fn sheet_name(&self) -> Option<String> {
        sheet_name_of(&self.0)
    }
}

impl fmt::Display for RangeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn sheet_name_of(range: &str) -> Option<String> {
    let (sheet, _) = range.rsplit_once('!')?;
    let sheet = sheet
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .map(|s| s.replace("''", "'"))
        .unwrap_or_else(|| sheet.to_string());
    Some(sheet)
}

/// `spreadsheets.values.get` response. `values` is absent for an empty range.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    #[serde(default)]
    pub range: Option<String>,
    #[serde(default)]
    pub values: Option<Vec<Vec<serde_json::Value>>>,
}

/// `spreadsheets.values.append` response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendValuesResponse {
    pub spreadsheet_id: String,
    #[serde(default)]
    pub table_range: Option<String>,
    pub updates: UpdateValuesResponse,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateValuesResponse {
    pub updated_range: String,
    #[serde(default)]
    pub updated_rows: u32,
    #[serde(default)]
    pub updated_columns: u32,
    #[serde(default)]
    pub updated_cells: u32,
}

/// Where the provider actually put an appended row.
///
/// Callers must read this rather than assume a row index.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendConfirmation {
    pub spreadsheet_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_range: Option<String>,
    pub updated_range: String,
    pub updated_rows: u32,
    pub updated_cells: u32,
}

impl AppendConfirmation {
    /// Unquoted sheet name of the updated range.
    pub fn sheet_name(&self) -> Option<String> {
        sheet_name_of(&self.updated_range)
    }
}

impl From<AppendValuesResponse> for AppendConfirmation {
    fn from(resp: AppendValuesResponse) -> Self {
        Self {
            spreadsheet_id: resp.spreadsheet_id,
            table_range: resp.table_range,
            updated_range: resp.updates.updated_range,
            updated_rows: resp.updates.updated_rows,
            updated_cells: resp.updates.updated_cells,
        }
    }
}
