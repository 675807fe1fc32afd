//! Form submissions and their stored form in the document store.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::AppError;

/// A user-submitted entry, appended to the sheet as `[name, email]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Record {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(email)]
    pub email: String,
}

impl Record {
    /// Uniqueness key: trimmed, lowercased e-mail.
    pub fn email_key(&self) -> String {
        normalize_email(&self.email)
    }

    /// Sheet row for this record.
    pub fn to_row(&self) -> Vec<serde_json::Value> {
        vec![
            serde_json::Value::String(self.name.clone()),
            serde_json::Value::String(self.email.clone()),
        ]
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Raw `application/x-www-form-urlencoded` body of the data-entry form.
#[derive(Debug, Default, Deserialize)]
pub struct RecordForm {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl RecordForm {
    /// Require both fields and validate them.
    pub fn into_record(self) -> Result<Record, AppError> {
        let name = self.name.map(|s| s.trim().to_string()).unwrap_or_default();
        let email = self.email.map(|s| s.trim().to_string()).unwrap_or_default();

        if name.is_empty() || email.is_empty() {
            return Err(AppError::Validation(
                "Name and email are required".to_string(),
            ));
        }

        let record = Record { name, email };
        record
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        Ok(record)
    }
}

/// Document stored per unique e-mail (document ID = [`Record::email_key`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub name: String,
    pub email: String,
    /// When the submission was accepted (RFC3339)
    pub submitted_at: String,
}
