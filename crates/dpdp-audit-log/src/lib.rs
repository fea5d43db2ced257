//! Append-only audit log stores.
//!
//! This crate provides the storage side of the audit trail:
//!
//! - the [`AuditLogStore`] port every backend implements
//! - an in-memory backend for tests and single-process use
//! - a SQLite backend sharing one connection with the record store
//! - a SHA-256 hash chain that lets any backend prove no entry was altered

mod chain;
mod error;
mod memory;
mod sqlite;
mod store;

pub use chain::{ChainLink, IntegrityReport, GENESIS_HASH};
pub use error::StorageError;
pub use memory::InMemoryAuditLog;
pub use sqlite::{open_connection, open_in_memory_connection, SharedConnection, SqliteAuditLog};
pub use store::{AuditLogStore, AuditTrail, SortOrder};

// Re-export types for convenience
pub use dpdp_audit_types::{
    AuditAction, AuditActor, AuditEntryId, AuditLogEntry, AuditLogEntryBuilder, ComplianceImpact,
};
