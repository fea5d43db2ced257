//! The audit log port.

use crate::{IntegrityReport, StorageError};
use dpdp_audit_types::AuditLogEntry;
use serde::{Deserialize, Serialize};

/// Order in which a query returns entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Oldest first (full history).
    #[default]
    Ascending,
    /// Most recent first (recent-events reporting).
    Descending,
}

impl SortOrder {
    /// Order entries given in append order.
    ///
    /// Sorting by timestamp is stable, so entries sharing a timestamp keep
    /// their append order (reversed for `Descending`).
    pub fn apply(self, mut entries: Vec<AuditLogEntry>) -> Vec<AuditLogEntry> {
        entries.sort_by_key(|e| e.timestamp);
        if self == Self::Descending {
            entries.reverse();
        }
        entries
    }
}

/// Append-only audit log.
///
/// `append` is the only mutator. Implementations must be safe to share
/// between threads and must never rewrite or drop an appended entry.
pub trait AuditLogStore: Send + Sync {
    /// Append one entry.
    fn append(&self, entry: AuditLogEntry) -> Result<(), StorageError>;

    /// Append entries as one unit: either every entry is written or none is.
    fn append_all(&self, entries: Vec<AuditLogEntry>) -> Result<(), StorageError>;

    /// All entries for one data subject.
    fn query_by_client(&self, client_id: &str, order: SortOrder) -> Result<AuditTrail, StorageError>;

    /// Every entry in the log.
    fn query_all(&self, order: SortOrder) -> Result<AuditTrail, StorageError>;

    /// Number of entries in the log.
    fn count(&self) -> Result<usize, StorageError>;

    /// Recompute the hash chain and report the first broken link, if any.
    fn verify_integrity(&self) -> Result<IntegrityReport, StorageError>;
}

/// A finite snapshot of audit entries.
///
/// Iterating borrows the snapshot, so it can be walked any number of times.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuditTrail {
    entries: Vec<AuditLogEntry>,
}

impl AuditTrail {
    /// Wrap entries that are already in the requested order.
    pub fn new(entries: Vec<AuditLogEntry>) -> Self {
        Self { entries }
    }

    /// Iterate over the entries.
    pub fn iter(&self) -> std::slice::Iter<'_, AuditLogEntry> {
        self.entries.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the trail is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First `n` entries in the trail's order.
    pub fn head(&self, n: usize) -> Vec<AuditLogEntry> {
        self.entries.iter().take(n).cloned().collect()
    }

    /// Take the entries.
    pub fn into_vec(self) -> Vec<AuditLogEntry> {
        self.entries
    }
}

impl IntoIterator for AuditTrail {
    type Item = AuditLogEntry;
    type IntoIter = std::vec::IntoIter<AuditLogEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a AuditTrail {
    type Item = &'a AuditLogEntry;
    type IntoIter = std::slice::Iter<'a, AuditLogEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
