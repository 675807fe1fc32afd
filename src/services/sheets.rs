// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google Sheets v4 client for range reads and row appends.
//!
//! Every call takes the caller's [`AccessToken`] explicitly; the client
//! itself carries no credentials and is safe to share across requests.

use serde::Deserialize;
use serde_json::Value;

use crate::error::AppError;
use crate::models::sheets::{AppendValuesResponse, ValueRange};
use crate::models::{AccessToken, AppendConfirmation, RangeSpec};

/// Sheets API client.
#[derive(Clone)]
pub struct SheetsClient {
    http: reqwest::Client,
    base_url: String,
}

/// Google API error envelope: `{"error": {"code", "message", "status"}}`.
#[derive(Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: String,
}

impl SheetsClient {
    pub fn new(base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Read a range as rows of cell values.
    ///
    /// An empty range is reported as `NotFound`, not as an empty list.
    pub async fn read_range(
        &self,
        token: &AccessToken,
        spreadsheet_id: &str,
        range: &RangeSpec,
    ) -> Result<Vec<Vec<Value>>, AppError> {
        let url = self.values_url(spreadsheet_id, range, "");

        let response = self
            .http
            .get(&url)
            .bearer_auth(token.secret())
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let value_range: ValueRange = check_response_json(response).await?;

        match value_range.values {
            Some(rows) if !rows.is_empty() => {
                tracing::debug!(range = %range, rows = rows.len(), "Read range");
                Ok(rows)
            }
            _ => Err(AppError::NotFound(format!("No data found in {}", range))),
        }
    }

    /// Append a single row after the last row of the table found in `range`.
    pub async fn append_row(
        &self,
        token: &AccessToken,
        spreadsheet_id: &str,
        range: &RangeSpec,
        row: Vec<Value>,
    ) -> Result<AppendConfirmation, AppError> {
        self.append_rows(token, spreadsheet_id, range, vec![row])
            .await
    }

    /// Append rows with `valueInputOption=RAW`.
    ///
    /// The provider chooses the target rows; read them from the confirmation.
    pub async fn append_rows(
        &self,
        token: &AccessToken,
        spreadsheet_id: &str,
        range: &RangeSpec,
        rows: Vec<Vec<Value>>,
    ) -> Result<AppendConfirmation, AppError> {
        let url = self.values_url(spreadsheet_id, range, ":append");

        let body = serde_json::json!({
            "range": range.as_str(),
            "majorDimension": "ROWS",
            "values": rows,
        });

        let response = self
            .http
            .post(&url)
            .bearer_auth(token.secret())
            .query(&[("valueInputOption", "RAW")])
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let appended: AppendValuesResponse = check_response_json(response).await?;
        let confirmation = AppendConfirmation::from(appended);

        tracing::info!(
            updated_range = %confirmation.updated_range,
            updated_rows = confirmation.updated_rows,
            "Data added successfully"
        );
        Ok(confirmation)
    }

    fn values_url(&self, spreadsheet_id: &str, range: &RangeSpec, suffix: &str) -> String {
        format!(
            "{}/spreadsheets/{}/values/{}{}",
            self.base_url,
            urlencoding::encode(spreadsheet_id),
            urlencoding::encode(range.as_str()),
            suffix
        )
    }
}

fn transport_error(e: &reqwest::Error) -> AppError {
    AppError::Api {
        status: e.status().map(|s| s.as_u16()).unwrap_or(0),
        message: e.to_string(),
    }
}

/// Check response status and parse the JSON body.
///
/// Errors keep the provider's status and message as-is.
async fn check_response_json<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, AppError> {
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);
        return Err(AppError::Api {
            status: status.as_u16(),
            message,
        });
    }

    response.json().await.map_err(|e| AppError::Api {
        status: status.as_u16(),
        message: format!("JSON parse error: {}", e),
    })
}
