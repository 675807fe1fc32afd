// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper for the submitted-records collection.
//!
//! Record documents use the normalized e-mail as document ID and are created
//! with `insert`, so Firestore itself refuses a second record for the same
//! address.

use crate::db::collections;
use crate::error::AppError;
use crate::models::StoredRecord;
use firestore::errors::FirestoreError;

/// Firestore handle. `None` means offline; every operation then fails.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Connect to Firestore for `project_id`.
    ///
    /// Honors `FIRESTORE_EMULATOR_HOST`, in which case no Google credentials
    /// are looked up.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        let client = if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            Self::connect_emulator(project_id).await?
        } else {
            firestore::FirestoreDb::new(project_id)
                .await
                .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?
        };

        tracing::info!(project = project_id, "Connected to Firestore");
        Ok(Self {
            client: Some(client),
        })
    }

    /// Emulator connection with a static unsigned token.
    async fn connect_emulator(project_id: &str) -> Result<firestore::FirestoreDb, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJzaGVldC1pbnRha2UifQ."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        firestore::FirestoreDb::with_options_token_source(
            firestore::FirestoreDbOptions::new(project_id.to_string()),
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e)))
    }

    /// Offline handle for tests; all operations return `AppError::Database`.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Record Operations ───────────────────────────────────────

    /// Get the record stored under a normalized e-mail.
    pub async fn get_record(&self, email_key: &str) -> Result<Option<StoredRecord>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::RECORDS)
            .obj()
            .one(email_key)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create the record document. Returns `false` if one already exists.
    pub async fn insert_record(
        &self,
        email_key: &str,
        record: &StoredRecord,
    ) -> Result<bool, AppError> {
        let result: Result<StoredRecord, FirestoreError> = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::RECORDS)
            .document_id(email_key)
            .object(record)
            .execute()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(FirestoreError::DataConflictError(_)) => Ok(false),
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    /// Delete the record stored under a normalized e-mail.
    pub async fn delete_record(&self, email_key: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::RECORDS)
            .document_id(email_key)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
