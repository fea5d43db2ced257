//! The compliance record store port and its adapters.

mod memory;
mod sqlite;

pub use memory::InMemoryRecordStore;
pub use sqlite::SqliteRecordStore;

use crate::model::ComplianceRecord;
use dpdp_audit_log::StorageError;

/// Keyed storage of one compliance record per client.
///
/// Stores hold whole records; the engine does all read-modify-write work
/// under its per-client lock and hands back complete records to persist.
/// Every read returns an owned copy.
pub trait RecordStore: Send + Sync {
    /// Whether a record exists for the client.
    fn contains(&self, client_id: &str) -> Result<bool, StorageError>;

    /// Persist a new record.
    fn insert(&self, record: &ComplianceRecord) -> Result<(), StorageError>;

    /// Load a record.
    fn load(&self, client_id: &str) -> Result<Option<ComplianceRecord>, StorageError>;

    /// Replace an existing record.
    fn save(&self, record: &ComplianceRecord) -> Result<(), StorageError>;

    /// Drop a record.
    ///
    /// Only used to undo an insert whose audit entry could not be written.
    fn remove(&self, client_id: &str) -> Result<(), StorageError>;

    /// Every record, ordered by client id.
    fn load_all(&self) -> Result<Vec<ComplianceRecord>, StorageError>;

    /// Every client id, ordered.
    fn client_ids(&self) -> Result<Vec<String>, StorageError>;
}
