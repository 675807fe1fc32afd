//! Database layer for the duplicate guard (Firestore, or in-memory).

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryRecords;

use crate::error::AppError;
use crate::models::{Record, StoredRecord};
use crate::time_utils::format_utc_rfc3339;

/// Collection names as constants.
pub mod collections {
    /// Submitted records keyed by normalized e-mail
    pub const RECORDS: &str = "records";
}

/// Document store that enforces one record per e-mail.
///
/// The storage layer rejects a second document with the same key; the
/// lookup in [`RecordStore::check_and_reserve`] only exists to report the
/// common case with a friendlier message.
#[derive(Clone)]
pub enum RecordStore {
    Firestore(FirestoreDb),
    Memory(MemoryRecords),
}

impl RecordStore {
    pub fn in_memory() -> Self {
        RecordStore::Memory(MemoryRecords::default())
    }

    /// Get the stored record for an e-mail, if any.
    pub async fn get(&self, email: &str) -> Result<Option<StoredRecord>, AppError> {
        let key = crate::models::record::normalize_email(email);
        match self {
            RecordStore::Firestore(db) => db.get_record(&key).await,
            RecordStore::Memory(mem) => Ok(mem.get(&key)),
        }
    }

    /// Accept the record if its e-mail is new, otherwise fail with `Duplicate`.
    pub async fn check_and_reserve(&self, record: &Record) -> Result<StoredRecord, AppError> {
        let key = record.email_key();

        if self.get(&key).await?.is_some() {
            tracing::info!(email = %key, "Rejected duplicate submission");
            return Err(duplicate(&record.email));
        }

        let stored = StoredRecord {
            name: record.name.clone(),
            email: record.email.clone(),
            submitted_at: format_utc_rfc3339(chrono::Utc::now()),
        };

        let inserted = match self {
            RecordStore::Firestore(db) => db.insert_record(&key, &stored).await?,
            RecordStore::Memory(mem) => mem.insert(&key, stored.clone()),
        };

        if !inserted {
            // Lost the race against a concurrent submission.
            tracing::info!(email = %key, "Duplicate caught by storage constraint");
            return Err(duplicate(&record.email));
        }

        tracing::debug!(email = %key, "Record reserved");
        Ok(stored)
    }

    /// Drop a reservation, e.g. when the sheet append that followed it failed.
    pub async fn release(&self, record: &Record) -> Result<(), AppError> {
        let key = record.email_key();
        match self {
            RecordStore::Firestore(db) => db.delete_record(&key).await,
            RecordStore::Memory(mem) => {
                mem.remove(&key);
                Ok(())
            }
        }
    }
}

fn duplicate(email: &str) -> AppError {
    AppError::Duplicate(format!("A record for {} already exists", email))
}
