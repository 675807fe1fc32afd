// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process record store for tests and single-instance deployments.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

use crate::models::StoredRecord;

/// Records keyed by normalized e-mail. Clones share the same map.
#[derive(Clone, Default)]
pub struct MemoryRecords {
    records: Arc<DashMap<String, StoredRecord>>,
}

impl MemoryRecords {
    pub fn get(&self, key: &str) -> Option<StoredRecord> {
        self.records.get(key).map(|r| r.clone())
    }

    /// Insert only if the key is vacant. Returns false if it was taken.
    pub fn insert(&self, key: &str, record: StoredRecord) -> bool {
        match self.records.entry(key.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(record);
                true
            }
        }
    }

    pub fn remove(&self, key: &str) {
        self.records.remove(key);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
