//! SQLite-backed record store.

use super::RecordStore;
use crate::model::ComplianceRecord;
use dpdp_audit_log::{SharedConnection, StorageError};
use rusqlite::{Connection, OptionalExtension};

/// Records persisted as JSON bodies in the `compliance_records` table.
pub struct SqliteRecordStore {
    conn: SharedConnection,
}

impl SqliteRecordStore {
    /// Create the store and its table.
    pub fn new(conn: SharedConnection) -> Result<Self, StorageError> {
        let store = Self { conn };
        store.init_tables()?;
        Ok(store)
    }

    fn init_tables(&self) -> Result<(), StorageError> {
        let conn = self.conn.lock();
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS compliance_records (
                client_id TEXT PRIMARY KEY,
                record TEXT NOT NULL,
                compliance_score INTEGER NOT NULL,
                last_updated TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    /// Insert a new record on a connection the caller controls.
    pub fn insert_in(conn: &Connection, record: &ComplianceRecord) -> Result<(), StorageError> {
        let body = serde_json::to_string(record)?;
        conn.execute(
            "INSERT INTO compliance_records (client_id, record, compliance_score, last_updated)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![
                &record.client_id,
                body,
                record.compliance_score,
                record.last_updated.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Replace an existing record on a connection the caller controls.
    pub fn save_in(conn: &Connection, record: &ComplianceRecord) -> Result<(), StorageError> {
        let body = serde_json::to_string(record)?;
        let updated = conn.execute(
            "UPDATE compliance_records
             SET record = ?2, compliance_score = ?3, last_updated = ?4
             WHERE client_id = ?1",
            rusqlite::params![
                &record.client_id,
                body,
                record.compliance_score,
                record.last_updated.to_rfc3339(),
            ],
        )?;
        if updated != 1 {
            return Err(StorageError::Corrupt(format!(
                "no stored record for '{}' to update",
                record.client_id
            )));
        }
        Ok(())
    }

    fn decode(body: &str) -> Result<ComplianceRecord, StorageError> {
        Ok(serde_json::from_str(body)?)
    }
}

impl RecordStore for SqliteRecordStore {
    fn contains(&self, client_id: &str) -> Result<bool, StorageError> {
        let conn = self.conn.lock();
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM compliance_records WHERE client_id = ?1",
                [client_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn insert(&self, record: &ComplianceRecord) -> Result<(), StorageError> {
        Self::insert_in(&self.conn.lock(), record)
    }

    fn load(&self, client_id: &str) -> Result<Option<ComplianceRecord>, StorageError> {
        let body: Option<String> = {
            let conn = self.conn.lock();
            conn.query_row(
                "SELECT record FROM compliance_records WHERE client_id = ?1",
                [client_id],
                |row| row.get(0),
            )
            .optional()?
        };
        body.as_deref().map(Self::decode).transpose()
    }

    fn save(&self, record: &ComplianceRecord) -> Result<(), StorageError> {
        Self::save_in(&self.conn.lock(), record)
    }

    fn remove(&self, client_id: &str) -> Result<(), StorageError> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM compliance_records WHERE client_id = ?1", [client_id])?;
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<ComplianceRecord>, StorageError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT record FROM compliance_records ORDER BY client_id")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut records = Vec::new();
        for body in rows {
            records.push(Self::decode(&body?)?);
        }
        Ok(records)
    }

    fn client_ids(&self) -> Result<Vec<String>, StorageError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT client_id FROM compliance_records ORDER BY client_id")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let ids = rows.collect::<Result<Vec<String>, _>>()?;
        Ok(ids)
    }
}
