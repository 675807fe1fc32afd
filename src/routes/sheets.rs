// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Spreadsheet routes (token set required).

use axum::{
    extract::{FromRequest, Query, Request, State},
    http::header,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Extension, Form, Json, Router,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::middleware::auth::BoundCredentials;
use crate::models::{RangeSpec, RecordForm};
use crate::AppState;

/// Sheet routes. The token middleware is applied in routes/mod.rs.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/enter-details", get(enter_details))
        .route("/sheets", get(read_sheet))
        .route("/sheets/add", post(add_to_sheet))
}

const ENTRY_FORM: &str = r#"<form action="/sheets/add" method="post">
    <label for="name">Name:</label>
    <input type="text" id="name" name="name" required><br><br>
    <label for="email">Email:</label>
    <input type="email" id="email" name="email" required><br><br>
    <button type="submit">Submit</button>
</form>"#;

/// Data-entry form posting to `/sheets/add`.
async fn enter_details() -> Html<&'static str> {
    Html(ENTRY_FORM)
}

// ─── Reads ───────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct SheetQuery {
    /// Range to read; defaults to the configured range
    range: Option<String>,
    /// Spreadsheet to read; defaults to the configured spreadsheet
    spreadsheet_id: Option<String>,
}

/// Read a range and return its rows as JSON.
async fn read_sheet(
    State(state): State<Arc<AppState>>,
    Extension(creds): Extension<BoundCredentials>,
    Query(query): Query<SheetQuery>,
) -> Result<Json<Vec<Vec<Value>>>> {
    let range = RangeSpec::new(query.range.unwrap_or_else(|| state.config.sheet_range.clone()))?;
    let spreadsheet_id = query
        .spreadsheet_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| state.config.spreadsheet_id.clone());

    let rows = state
        .sheets
        .read_range(&creds.access_token, &spreadsheet_id, &range)
        .await?;

    Ok(Json(rows))
}

// ─── Appends ─────────────────────────────────────────────────

/// JSON append body: `{"range": "...", "values": [[...], ...]}`.
#[derive(Debug, Default, Deserialize)]
pub struct AppendBody {
    range: Option<String>,
    values: Option<Vec<Vec<Value>>>,
}

/// `/sheets/add` accepts either a JSON body or the HTML form.
pub enum AppendInput {
    Json(AppendBody),
    Form(RecordForm),
}

impl<S> FromRequest<S> for AppendInput
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> std::result::Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/json"));

        if is_json {
            let Json(body) = Json::<AppendBody>::from_request(req, state)
                .await
                .map_err(|e| AppError::Validation(e.body_text()))?;
            Ok(AppendInput::Json(body))
        } else {
            let Form(form) = Form::<RecordForm>::from_request(req, state)
                .await
                .map_err(|e| AppError::Validation(e.body_text()))?;
            Ok(AppendInput::Form(form))
        }
    }
}

/// Append a row, from either the JSON API or the data-entry form.
async fn add_to_sheet(
    State(state): State<Arc<AppState>>,
    Extension(creds): Extension<BoundCredentials>,
    input: AppendInput,
) -> Result<Response> {
    match input {
        AppendInput::Json(body) => append_values(&state, &creds, body).await,
        AppendInput::Form(form) => append_record(&state, &creds, form).await,
    }
}

/// JSON variant: validate, append, return the provider's confirmation.
async fn append_values(
    state: &AppState,
    creds: &BoundCredentials,
    body: AppendBody,
) -> Result<Response> {
    let (range, values) = match (body.range, body.values) {
        (Some(range), Some(values)) if !values.is_empty() => (range, values),
        _ => {
            return Err(AppError::Validation(
                "range and values are required".to_string(),
            ))
        }
    };
    let range = RangeSpec::new(range)?;

    let confirmation = state
        .sheets
        .append_rows(
            &creds.access_token,
            &state.config.spreadsheet_id,
            &range,
            values,
        )
        .await?;

    Ok(Json(confirmation).into_response())
}

/// Form variant: duplicate guard (if enabled), then append `[name, email]`.
async fn append_record(
    state: &AppState,
    creds: &BoundCredentials,
    form: RecordForm,
) -> Result<Response> {
    let record = form.into_record()?;
    let range = RangeSpec::new(state.config.sheet_range.clone())?;

    if let Some(records) = &state.records {
        records.check_and_reserve(&record).await?;
    }

    let appended = state
        .sheets
        .append_row(
            &creds.access_token,
            &state.config.spreadsheet_id,
            &range,
            record.to_row(),
        )
        .await;

    if let Err(e) = appended {
        if let Some(records) = &state.records {
            if let Err(release_err) = records.release(&record).await {
                tracing::warn!(error = %release_err, "Failed to release record reservation");
            }
        }
        return Err(e);
    }

    Ok("Data added successfully!".into_response())
}
