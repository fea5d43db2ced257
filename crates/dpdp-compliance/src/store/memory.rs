//! In-memory record store.

use super::RecordStore;
use crate::model::ComplianceRecord;
use dpdp_audit_log::StorageError;
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Process-local record store.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    records: RwLock<BTreeMap<String, ComplianceRecord>>,
}

impl InMemoryRecordStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for InMemoryRecordStore {
    fn contains(&self, client_id: &str) -> Result<bool, StorageError> {
        Ok(self.records.read().contains_key(client_id))
    }

    fn insert(&self, record: &ComplianceRecord) -> Result<(), StorageError> {
        let mut records = self.records.write();
        if records.contains_key(&record.client_id) {
            return Err(StorageError::Corrupt(format!(
                "record for '{}' inserted twice",
                record.client_id
            )));
        }
        records.insert(record.client_id.clone(), record.clone());
        Ok(())
    }

    fn load(&self, client_id: &str) -> Result<Option<ComplianceRecord>, StorageError> {
        Ok(self.records.read().get(client_id).cloned())
    }

    fn save(&self, record: &ComplianceRecord) -> Result<(), StorageError> {
        self.records
            .write()
            .insert(record.client_id.clone(), record.clone());
        Ok(())
    }

    fn remove(&self, client_id: &str) -> Result<(), StorageError> {
        self.records.write().remove(client_id);
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<ComplianceRecord>, StorageError> {
        Ok(self.records.read().values().cloned().collect())
    }

    fn client_ids(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.records.read().keys().cloned().collect())
    }
}
