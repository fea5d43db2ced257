//! Data-protection compliance and audit engine.
//!
//! Tracks, for every data subject, which personal-data categories are held,
//! on what legal basis they are processed, whether consent was given and
//! how rights requests were handled. Every change is recorded in an
//! append-only audit trail.
//!
//! ```no_run
//! use dpdp_compliance::{ComplianceEngine, EngineConfig, RightType};
//!
//! # fn main() -> Result<(), dpdp_compliance::ComplianceError> {
//! let engine = ComplianceEngine::in_memory(EngineConfig::default());
//! engine.create_record("client-42")?;
//! engine.update_consent("client-42", true, "1.0")?;
//! let request = engine.exercise_right("client-42", RightType::Access, serde_json::json!({}))?;
//! let report = engine.get_compliance_report("client-42")?;
//! assert!(report.exercised_rights.iter().any(|r| r.request_id == request));
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod config;
mod consent;
mod engine;
pub mod error;
mod export;
mod locks;
pub mod model;
pub mod report;
pub mod rights;
pub mod scorer;
pub mod store;

pub use catalog::{Catalog, CatalogError};
pub use config::{AuditConfig, ConsentConfig, EngineConfig, RetentionTemplate, RightsConfig};
pub use engine::ComplianceEngine;
pub use error::{ComplianceError, ComplianceResult};
pub use export::{ConsentHistory, PortableData, SubjectDataExport};
pub use locks::ClientLocks;
pub use model::{
    ComplianceRecord, ConsentStatus, DataCategory, DataRetentionPolicy, DataSubjectRights,
    ExercisedRight, ProcessingPurpose, RequestStatus, Resolution, RightType, RightsCapabilities,
    Sensitivity,
};
pub use report::{
    ClientAuditSummary, ClientComplianceReport, ComplianceIssue, FleetAuditSummary,
    FleetComplianceReport, FleetIssue, IssueCount,
};
pub use rights::{assess_erasure, BlockingPurpose, ErasureAssessment};
pub use store::{InMemoryRecordStore, RecordStore, SqliteRecordStore};

// Re-export the audit types callers need alongside the engine
pub use dpdp_audit_log::{
    open_connection, open_in_memory_connection, AuditLogStore, AuditTrail, IntegrityReport,
    SharedConnection, SortOrder, StorageError,
};
pub use dpdp_audit_types::{AuditAction, AuditActor, AuditLogEntry, ComplianceImpact, RequestId};
