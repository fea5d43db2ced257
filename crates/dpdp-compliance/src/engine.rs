//! The compliance engine facade.

use crate::config::EngineConfig;
use crate::error::{ComplianceError, ComplianceResult};
use crate::locks::ClientLocks;
use crate::model::ComplianceRecord;
use crate::store::{InMemoryRecordStore, RecordStore, SqliteRecordStore};
use chrono::{DateTime, Utc};
use dpdp_audit_log::{
    AuditLogStore, AuditTrail, InMemoryAuditLog, IntegrityReport, SharedConnection, SortOrder,
    SqliteAuditLog, StorageError,
};
use dpdp_audit_types::{
    AuditAction, AuditActor, AuditLogEntry, AuditLogEntryBuilder, ComplianceImpact,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

/// How a record reaches its store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordWrite {
    Insert,
    Update,
}

/// Compliance state and audit trail for every data subject.
///
/// All writes to one client run under that client's lock: the record is
/// loaded, changed and rescored, then saved together with the matching
/// audit entries before the lock is released. A record change never
/// outlives a failed audit append.
pub struct ComplianceEngine {
    records: Arc<dyn RecordStore>,
    audit: Arc<dyn AuditLogStore>,
    // Set when both stores live in one SQLite database.
    shared: Option<SharedConnection>,
    locks: ClientLocks,
    config: EngineConfig,
}

impl ComplianceEngine {
    /// Create an engine over the given stores.
    pub fn new(
        records: Arc<dyn RecordStore>,
        audit: Arc<dyn AuditLogStore>,
        config: EngineConfig,
    ) -> Self {
        Self {
            records,
            audit,
            shared: None,
            locks: ClientLocks::new(),
            config,
        }
    }

    /// Engine with process-local stores.
    pub fn in_memory(config: EngineConfig) -> Self {
        Self::new(
            Arc::new(InMemoryRecordStore::new()),
            Arc::new(InMemoryAuditLog::new()),
            config,
        )
    }

    /// Engine with both stores in one SQLite database.
    pub fn sqlite(conn: SharedConnection, config: EngineConfig) -> ComplianceResult<Self> {
        let records = SqliteRecordStore::new(Arc::clone(&conn))?;
        let audit = SqliteAuditLog::new(Arc::clone(&conn))?;
        Ok(Self {
            shared: Some(conn),
            ..Self::new(Arc::new(records), Arc::new(audit), config)
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Create the record for a new data subject.
    #[instrument(skip(self))]
    pub fn create_record(&self, client_id: &str) -> ComplianceResult<ComplianceRecord> {
        self.locks.with_client_lock(client_id, || {
            if self.records.contains(client_id)? {
                return Err(ComplianceError::AlreadyExists {
                    client_id: client_id.to_string(),
                });
            }

            let now = Utc::now();
            let record = ComplianceRecord::new(client_id, &self.config, now)?;
            let entry = self
                .entry(client_id, AuditAction::ComplianceRecordCreated)
                .timestamp(now)
                .build();
            self.commit(&record, RecordWrite::Insert, vec![entry])?;

            info!(score = record.compliance_score, "compliance record created");
            Ok(record)
        })
    }

    /// Current record for a data subject.
    pub fn get_record(&self, client_id: &str) -> ComplianceResult<ComplianceRecord> {
        self.records
            .load(client_id)?
            .ok_or_else(|| ComplianceError::not_found(client_id))
    }

    /// Ids of every data subject with a record.
    pub fn client_ids(&self) -> ComplianceResult<Vec<String>> {
        Ok(self.records.client_ids()?)
    }

    /// Record an event raised outside the engine's own workflows.
    ///
    /// `impact` falls back to the action's default impact.
    pub fn append_audit_event(
        &self,
        client_id: &str,
        action: impl Into<AuditAction>,
        actor: AuditActor,
        details: Value,
        impact: Option<ComplianceImpact>,
    ) -> ComplianceResult<AuditLogEntry> {
        let mut builder = self
            .entry(client_id, action.into())
            .actor(actor)
            .details(details);
        if let Some(impact) = impact {
            builder = builder.impact(impact);
        }
        let entry = builder.build();
        self.record_audit_entry(entry.clone())?;
        Ok(entry)
    }

    /// Append a fully built entry.
    pub fn record_audit_entry(&self, entry: AuditLogEntry) -> ComplianceResult<()> {
        debug!(client_id = %entry.client_id, action = %entry.action, "recording audit entry");
        self.audit.append(entry)?;
        Ok(())
    }

    /// Audit entries for one client.
    pub fn audit_trail(&self, client_id: &str, order: SortOrder) -> ComplianceResult<AuditTrail> {
        Ok(self.audit.query_by_client(client_id, order)?)
    }

    /// The whole audit log.
    pub fn audit_log(&self, order: SortOrder) -> ComplianceResult<AuditTrail> {
        Ok(self.audit.query_all(order)?)
    }

    /// Recompute the audit hash chain.
    #[instrument(skip(self))]
    pub fn verify_audit_integrity(&self) -> ComplianceResult<IntegrityReport> {
        let report = self.audit.verify_integrity()?;
        if report.is_intact() {
            info!(entries = report.entries_checked, "audit chain intact");
        } else {
            tracing::error!(first_broken = ?report.first_broken, "audit chain broken");
        }
        Ok(report)
    }

    pub(crate) fn records(&self) -> &dyn RecordStore {
        self.records.as_ref()
    }

    /// Load, change and persist one record under its client lock.
    ///
    /// `mutate` returns the audit entries for the change; they are appended
    /// after the rescored record is saved. Nothing is written if `mutate`
    /// fails, and an empty entry list means the record was left unchanged.
    pub(crate) fn modify_record<T>(
        &self,
        client_id: &str,
        mutate: impl FnOnce(&mut ComplianceRecord, DateTime<Utc>) -> ComplianceResult<(T, Vec<AuditLogEntry>)>,
    ) -> ComplianceResult<(T, ComplianceRecord)> {
        self.with_client_lock(client_id, || {
            let mut record = self.get_record(client_id)?;
            let now = Utc::now();
            let (value, entries) = mutate(&mut record, now)?;
            if !entries.is_empty() {
                self.persist(&mut record, now, entries)?;
            }
            Ok((value, record))
        })
    }

    pub(crate) fn with_client_lock<T>(&self, client_id: &str, f: impl FnOnce() -> T) -> T {
        self.locks.with_client_lock(client_id, f)
    }

    /// Rescore and save a record together with its audit entries.
    ///
    /// Callers must hold the record's client lock.
    pub(crate) fn persist(
        &self,
        record: &mut ComplianceRecord,
        now: DateTime<Utc>,
        entries: Vec<AuditLogEntry>,
    ) -> ComplianceResult<()> {
        record.touch(now);
        self.commit(record, RecordWrite::Update, entries)
    }

    /// Write a record and its audit entries as one unit.
    fn commit(
        &self,
        record: &ComplianceRecord,
        write: RecordWrite,
        entries: Vec<AuditLogEntry>,
    ) -> ComplianceResult<()> {
        match &self.shared {
            Some(conn) => {
                let mut conn = conn.lock();
                let tx = conn.transaction().map_err(StorageError::from)?;
                match write {
                    RecordWrite::Insert => SqliteRecordStore::insert_in(&tx, record)?,
                    RecordWrite::Update => SqliteRecordStore::save_in(&tx, record)?,
                }
                SqliteAuditLog::append_in(&tx, &entries)?;
                tx.commit().map_err(StorageError::from)?;
                Ok(())
            }
            None => self.commit_with_undo(record, write, entries),
        }
    }

    // Stores that cannot share a transaction: write the record, then undo
    // it if the audit entries do not land.
    fn commit_with_undo(
        &self,
        record: &ComplianceRecord,
        write: RecordWrite,
        entries: Vec<AuditLogEntry>,
    ) -> ComplianceResult<()> {
        let client_id = record.client_id.as_str();
        let previous = match write {
            RecordWrite::Insert => {
                self.records.insert(record)?;
                None
            }
            RecordWrite::Update => {
                let previous = self.records.load(client_id)?;
                self.records.save(record)?;
                previous
            }
        };

        if let Err(e) = self.audit.append_all(entries) {
            let undo = match previous {
                Some(previous) => self.records.save(&previous),
                None => self.records.remove(client_id),
            };
            if let Err(undo_err) = undo {
                error!(%client_id, error = %undo_err, "could not undo record write after audit failure");
            }
            return Err(e.into());
        }
        Ok(())
    }

    /// Entry builder carrying the configured request address.
    pub(crate) fn entry(&self, client_id: &str, action: AuditAction) -> AuditLogEntryBuilder {
        AuditLogEntry::builder(client_id, action).ip_address(&self.config.audit.default_ip_address)
    }
}
