//! In-memory audit log.

use crate::{AuditLogStore, AuditTrail, ChainLink, IntegrityReport, SortOrder, StorageError};
use dpdp_audit_types::AuditLogEntry;
use parking_lot::RwLock;
use tracing::debug;

#[derive(Debug, Default)]
struct LogState {
    entries: Vec<AuditLogEntry>,
    links: Vec<ChainLink>,
}

/// Process-local audit log.
///
/// Appends from many threads are serialized by a write lock, so each
/// writer's entries keep their relative order.
#[derive(Debug, Default)]
pub struct InMemoryAuditLog {
    state: RwLock<LogState>,
}

impl InMemoryAuditLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    fn snapshot<F>(&self, filter: F, order: SortOrder) -> AuditTrail
    where
        F: Fn(&AuditLogEntry) -> bool,
    {
        let state = self.state.read();
        let entries = state.entries.iter().filter(|e| filter(e)).cloned().collect();
        AuditTrail::new(order.apply(entries))
    }
}

impl AuditLogStore for InMemoryAuditLog {
    fn append(&self, entry: AuditLogEntry) -> Result<(), StorageError> {
        self.append_all(vec![entry])
    }

    fn append_all(&self, entries: Vec<AuditLogEntry>) -> Result<(), StorageError> {
        let mut state = self.state.write();

        // Link every entry before touching the log.
        let mut links: Vec<ChainLink> = Vec::with_capacity(entries.len());
        for entry in &entries {
            let link = ChainLink::next(entry, links.last().or(state.links.last()))?;
            links.push(link);
        }

        for (entry, link) in entries.iter().zip(&links) {
            debug!(client_id = %entry.client_id, action = %entry.action, sequence = link.sequence, "audit entry appended");
        }
        state.entries.extend(entries);
        state.links.extend(links);
        Ok(())
    }

    fn query_by_client(&self, client_id: &str, order: SortOrder) -> Result<AuditTrail, StorageError> {
        Ok(self.snapshot(|e| e.client_id == client_id, order))
    }

    fn query_all(&self, order: SortOrder) -> Result<AuditTrail, StorageError> {
        Ok(self.snapshot(|_| true, order))
    }

    fn count(&self) -> Result<usize, StorageError> {
        Ok(self.state.read().entries.len())
    }

    fn verify_integrity(&self) -> Result<IntegrityReport, StorageError> {
        let state = self.state.read();
        IntegrityReport::check(&state.entries, &state.links)
    }
}
