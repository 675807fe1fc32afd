// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Missing or malformed caller input.
    #[error("Invalid request: {0}")]
    Validation(String),

    /// A record with the same unique key already exists.
    #[error("Duplicate record: {0}")]
    Duplicate(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    /// The auth flow was driven out of order (e.g. callback with no pending consent).
    #[error("Session error: {0}")]
    Session(String),

    /// Authorization code exchange or token refresh was rejected.
    #[error("Token exchange failed: {0}")]
    Exchange(String),

    /// Non-success response from the spreadsheet API, passed through verbatim.
    #[error("Sheets API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Token storage error: {0}")]
    TokenStorage(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl AppError {
    /// HTTP status this error is surfaced as.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Duplicate(_) | AppError::Session(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Exchange(_)
            | AppError::Api { .. }
            | AppError::TokenStorage(_)
            | AppError::Database(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (error, details) = match &self {
            AppError::Validation(msg) => ("bad_request", Some(msg.clone())),
            AppError::Duplicate(msg) => ("duplicate", Some(msg.clone())),
            AppError::NotFound(msg) => ("not_found", Some(msg.clone())),
            AppError::Session(msg) => ("session_error", Some(msg.clone())),
            AppError::Exchange(msg) => {
                tracing::error!(error = %msg, "Error exchanging code for tokens");
                ("exchange_error", Some(msg.clone()))
            }
            AppError::Api { status, message } => {
                tracing::error!(status, error = %message, "Sheets API error");
                ("sheets_error", Some(format!("HTTP {}: {}", status, message)))
            }
            AppError::TokenStorage(msg) => {
                tracing::error!(error = %msg, "Token storage error");
                ("token_storage_error", None)
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                ("database_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                ("internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
