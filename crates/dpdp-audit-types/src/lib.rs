//! Audit log entry types for the DPDP compliance engine.
//!
//! These types describe what the audit trail records. They carry no storage
//! logic; see `dpdp-audit-log` for the append-only stores.

mod action;
mod actor;
mod entry;
mod id;
mod impact;

pub use action::AuditAction;
pub use actor::AuditActor;
pub use entry::{AuditLogEntry, AuditLogEntryBuilder, DEFAULT_DATA_CATEGORY, DEFAULT_IP_ADDRESS};
pub use id::{AuditEntryId, IdParseError, RequestId};
pub use impact::ComplianceImpact;
