//! Subject data exports for access and portability requests.

use crate::engine::ComplianceEngine;
use crate::error::ComplianceResult;
use crate::model::{ComplianceRecord, ConsentStatus, DataCategory, ExercisedRight, ProcessingPurpose};
use chrono::{DateTime, Utc};
use dpdp_audit_log::{SortOrder, StorageError};
use dpdp_audit_types::{AuditAction, AuditLogEntry};
use serde::{Deserialize, Serialize};

/// Format tag of a portable export.
pub const PORTABLE_FORMAT: &str = "json";

/// Schema version of a portable export.
pub const PORTABLE_SCHEMA_VERSION: &str = "1.0";

/// Read-only copy of everything held about a subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectDataExport {
    pub client_id: String,
    pub generated_at: DateTime<Utc>,
    pub personal_data: Vec<DataCategory>,
    pub processing_activities: Vec<ProcessingPurpose>,
    pub consent_history: ConsentHistory,
    pub exercised_rights: Vec<ExercisedRight>,
}

/// Current consent plus every consent event in the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsentHistory {
    pub current: ConsentStatus,
    pub events: Vec<AuditLogEntry>,
}

impl SubjectDataExport {
    /// Section names, in export order.
    pub const SECTIONS: [&'static str; 4] = [
        "personal_data",
        "processing_activities",
        "consent_history",
        "exercised_rights",
    ];

    fn from_record(record: &ComplianceRecord, consent_events: Vec<AuditLogEntry>, at: DateTime<Utc>) -> Self {
        Self {
            client_id: record.client_id.clone(),
            generated_at: at,
            personal_data: record.data_categories.clone(),
            processing_activities: record.processing_purposes.clone(),
            consent_history: ConsentHistory {
                current: record.consent_status.clone(),
                events: consent_events,
            },
            exercised_rights: record.exercised_rights().to_vec(),
        }
    }
}

/// Machine-readable export handed to the subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortableData {
    pub format: String,
    pub schema_version: String,
    pub exported_at: DateTime<Utc>,
    pub subject_id: String,
    pub data: serde_json::Value,
}

impl PortableData {
    fn from_export(export: &SubjectDataExport) -> Result<Self, StorageError> {
        Ok(Self {
            format: PORTABLE_FORMAT.to_string(),
            schema_version: PORTABLE_SCHEMA_VERSION.to_string(),
            exported_at: export.generated_at,
            subject_id: export.client_id.clone(),
            data: serde_json::to_value(export)?,
        })
    }

    /// Size of the serialized document.
    pub fn size_bytes(&self) -> Result<usize, StorageError> {
        Ok(serde_json::to_vec(self)?.len())
    }
}

fn is_consent_event(entry: &AuditLogEntry) -> bool {
    matches!(
        entry.action,
        AuditAction::ConsentUpdated
            | AuditAction::ConsentWithdrawn
            | AuditAction::ConsentRenewalRequired
    )
}

impl ComplianceEngine {
    /// Everything held about a subject, as returned to an access request.
    pub fn export_subject_data(&self, client_id: &str) -> ComplianceResult<SubjectDataExport> {
        let record = self.get_record(client_id)?;
        self.subject_export(&record, Utc::now())
    }

    /// The subject's data as a portable JSON document.
    pub fn export_portable_data(&self, client_id: &str) -> ComplianceResult<PortableData> {
        let export = self.export_subject_data(client_id)?;
        Ok(PortableData::from_export(&export)?)
    }

    pub(crate) fn subject_export(
        &self,
        record: &ComplianceRecord,
        at: DateTime<Utc>,
    ) -> ComplianceResult<SubjectDataExport> {
        let consent_events = self
            .audit_trail(&record.client_id, SortOrder::Ascending)?
            .into_iter()
            .filter(is_consent_event)
            .collect();
        Ok(SubjectDataExport::from_record(record, consent_events, at))
    }

    pub(crate) fn portable_export(
        &self,
        record: &ComplianceRecord,
        at: DateTime<Utc>,
    ) -> ComplianceResult<PortableData> {
        let export = self.subject_export(record, at)?;
        Ok(PortableData::from_export(&export)?)
    }
}
