//! SQLite-backed audit log.

use crate::{AuditLogStore, AuditTrail, ChainLink, IntegrityReport, SortOrder, StorageError};
use dpdp_audit_types::AuditLogEntry;
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Connection shared by the SQLite-backed stores.
pub type SharedConnection = Arc<Mutex<Connection>>;

/// Open (or create) a database file for the SQLite stores.
pub fn open_connection(path: impl AsRef<Path>) -> Result<SharedConnection, StorageError> {
    let conn = Connection::open(path.as_ref())?;
    conn.busy_timeout(Duration::from_secs(5))?;
    let mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    info!(path = %path.as_ref().display(), journal_mode = %mode, "opened compliance database");
    Ok(Arc::new(Mutex::new(conn)))
}

/// Open a private in-memory database.
pub fn open_in_memory_connection() -> Result<SharedConnection, StorageError> {
    Ok(Arc::new(Mutex::new(Connection::open_in_memory()?)))
}

/// Audit log persisted in the `audit_log` table.
///
/// The table is only ever inserted into; each row carries its chain link.
pub struct SqliteAuditLog {
    conn: SharedConnection,
}

impl SqliteAuditLog {
    /// Create the store and its tables.
    pub fn new(conn: SharedConnection) -> Result<Self, StorageError> {
        let store = Self { conn };
        store.init_tables()?;
        Ok(store)
    }

    fn init_tables(&self) -> Result<(), StorageError> {
        let conn = self.conn.lock();
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS audit_log (
                sequence INTEGER PRIMARY KEY,
                id TEXT NOT NULL UNIQUE,
                client_id TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                entry TEXT NOT NULL,
                entry_hash TEXT NOT NULL,
                prev_hash TEXT NOT NULL,
                link_hash TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_audit_log_client ON audit_log (client_id);",
        )?;
        Ok(())
    }

    fn last_link(conn: &Connection) -> Result<Option<ChainLink>, StorageError> {
        let link = conn
            .query_row(
                "SELECT sequence, entry_hash, prev_hash, link_hash FROM audit_log
                 ORDER BY sequence DESC LIMIT 1",
                [],
                |row| {
                    Ok(ChainLink {
                        sequence: row.get::<_, i64>(0)? as u64,
                        entry_hash: row.get(1)?,
                        prev_hash: row.get(2)?,
                        link_hash: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(link)
    }

    /// Append entries on a connection the caller controls.
    ///
    /// Lets a caller write audit entries inside its own transaction, so they
    /// commit or roll back together with the change they describe.
    pub fn append_in(conn: &Connection, entries: &[AuditLogEntry]) -> Result<(), StorageError> {
        let mut previous = Self::last_link(conn)?;
        for entry in entries {
            let link = ChainLink::next(entry, previous.as_ref())?;
            conn.execute(
                "INSERT INTO audit_log
                 (sequence, id, client_id, timestamp, entry, entry_hash, prev_hash, link_hash)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                rusqlite::params![
                    link.sequence as i64,
                    entry.id.to_string(),
                    &entry.client_id,
                    entry.timestamp.to_rfc3339(),
                    serde_json::to_string(entry)?,
                    &link.entry_hash,
                    &link.prev_hash,
                    &link.link_hash,
                ],
            )?;
            debug!(client_id = %entry.client_id, action = %entry.action, sequence = link.sequence, "audit entry persisted");
            previous = Some(link);
        }
        Ok(())
    }

    fn load_entries(
        &self,
        client_id: Option<&str>,
        order: SortOrder,
    ) -> Result<AuditTrail, StorageError> {
        let conn = self.conn.lock();
        let bodies: Vec<String> = match client_id {
            Some(client_id) => {
                let mut stmt = conn.prepare(
                    "SELECT entry FROM audit_log WHERE client_id = ?1 ORDER BY sequence",
                )?;
                let rows = stmt.query_map([client_id], |row| row.get(0))?;
                let bodies = rows.collect::<Result<Vec<String>, _>>()?;
                bodies
            }
            None => {
                let mut stmt = conn.prepare("SELECT entry FROM audit_log ORDER BY sequence")?;
                let rows = stmt.query_map([], |row| row.get(0))?;
                let bodies = rows.collect::<Result<Vec<String>, _>>()?;
                bodies
            }
        };

        let entries = bodies
            .iter()
            .map(|body| serde_json::from_str(body))
            .collect::<Result<Vec<AuditLogEntry>, _>>()?;
        Ok(AuditTrail::new(order.apply(entries)))
    }
}

impl AuditLogStore for SqliteAuditLog {
    fn append(&self, entry: AuditLogEntry) -> Result<(), StorageError> {
        self.append_all(vec![entry])
    }

    fn append_all(&self, entries: Vec<AuditLogEntry>) -> Result<(), StorageError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        Self::append_in(&tx, &entries)?;
        tx.commit()?;
        Ok(())
    }

    fn query_by_client(&self, client_id: &str, order: SortOrder) -> Result<AuditTrail, StorageError> {
        self.load_entries(Some(client_id), order)
    }

    fn query_all(&self, order: SortOrder) -> Result<AuditTrail, StorageError> {
        self.load_entries(None, order)
    }

    fn count(&self) -> Result<usize, StorageError> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM audit_log", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn verify_integrity(&self) -> Result<IntegrityReport, StorageError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT sequence, entry, entry_hash, prev_hash, link_hash FROM audit_log
             ORDER BY sequence",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut entries = Vec::new();
        let mut links = Vec::new();
        for row in rows {
            let (sequence, body, entry_hash, prev_hash, link_hash) = row?;
            entries.push(serde_json::from_str::<AuditLogEntry>(&body)?);
            links.push(ChainLink {
                sequence: sequence as u64,
                entry_hash,
                prev_hash,
                link_hash,
            });
        }

        IntegrityReport::check(&entries, &links)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dpdp_audit_types::{AuditAction, AuditActor};

    fn store() -> SqliteAuditLog {
        SqliteAuditLog::new(open_in_memory_connection().unwrap()).unwrap()
    }

    #[test]
    fn test_persisted_entries_read_back_unchanged() {
        let log = store();
        let entry = AuditLogEntry::builder("client-1", AuditAction::DataSubjectRightExercised)
            .actor(AuditActor::Client)
            .detail("right_type", "erasure")
            .build();
        log.append(entry.clone()).unwrap();

        let trail = log.query_by_client("client-1", SortOrder::Ascending).unwrap();
        assert_eq!(trail.into_vec(), vec![entry]);
    }

    #[test]
    fn test_chain_survives_persistence() {
        let log = store();
        for i in 0..10 {
            log.append(
                AuditLogEntry::builder(format!("c{}", i % 2), AuditAction::ConsentUpdated).build(),
            )
            .unwrap();
        }
        let report = log.verify_integrity().unwrap();
        assert!(report.is_intact());
        assert_eq!(report.entries_checked, 10);
        assert_eq!(log.count().unwrap(), 10);
    }

    #[test]
    fn test_failed_batch_writes_nothing() {
        let log = store();
        let first = AuditLogEntry::builder("c", AuditAction::ConsentUpdated).build();
        log.append(first.clone()).unwrap();

        // The duplicate id violates the UNIQUE constraint on the second row.
        let fresh = AuditLogEntry::builder("c", AuditAction::ConsentWithdrawn).build();
        assert!(log.append_all(vec![fresh, first]).is_err());

        assert_eq!(log.count().unwrap(), 1);
        assert!(log.verify_integrity().unwrap().is_intact());
    }

    #[test]
    fn test_tampering_with_a_row_breaks_the_chain() {
        let conn = open_in_memory_connection().unwrap();
        let log = SqliteAuditLog::new(Arc::clone(&conn)).unwrap();
        for _ in 0..3 {
            log.append(AuditLogEntry::builder("c", AuditAction::ConsentUpdated).build())
                .unwrap();
        }

        {
            let conn = conn.lock();
            let body: String = conn
                .query_row("SELECT entry FROM audit_log WHERE sequence = 1", [], |r| r.get(0))
                .unwrap();
            let forged = body.replace("CONSENT_UPDATED", "CONSENT_WITHDRAWN");
            conn.execute("UPDATE audit_log SET entry = ?1 WHERE sequence = 1", [forged])
                .unwrap();
        }

        assert_eq!(log.verify_integrity().unwrap().first_broken, Some(1));
    }

    #[test]
    fn test_file_database_reopens_with_history() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.db");
        {
            let log = SqliteAuditLog::new(open_connection(&path).unwrap()).unwrap();
            log.append(AuditLogEntry::builder("c", AuditAction::ComplianceRecordCreated).build())
                .unwrap();
        }
        let log = SqliteAuditLog::new(open_connection(&path).unwrap()).unwrap();
        log.append(AuditLogEntry::builder("c", AuditAction::ConsentUpdated).build())
            .unwrap();
        assert_eq!(log.count().unwrap(), 2);
        assert!(log.verify_integrity().unwrap().is_intact());
    }
}
