//! Audit event actions.

use crate::ComplianceImpact;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Event names written to the audit trail.
///
/// Built-in actions serialize to their upper snake case event name
/// (`CONSENT_UPDATED`). Collaborators may log any other name through
/// [`AuditAction::Custom`], which round-trips verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AuditAction {
    // Record lifecycle
    ComplianceRecordCreated,

    // Consent
    ConsentUpdated,
    ConsentWithdrawn,
    ConsentRenewalRequired,

    // Data-subject rights
    DataSubjectRightExercised,
    AccessRequestProcessed,
    CorrectionRequestProcessed,
    ErasureRequestProcessed,
    DataDeletionScheduled,
    PortabilityRequestProcessed,
    DataSubjectRequestResolved,

    /// Free-text action supplied by a collaborator.
    Custom(String),
}

impl AuditAction {
    /// Event name as written to the log.
    pub fn as_str(&self) -> &str {
        match self {
            Self::ComplianceRecordCreated => "COMPLIANCE_RECORD_CREATED",
            Self::ConsentUpdated => "CONSENT_UPDATED",
            Self::ConsentWithdrawn => "CONSENT_WITHDRAWN",
            Self::ConsentRenewalRequired => "CONSENT_RENEWAL_REQUIRED",
            Self::DataSubjectRightExercised => "DATA_SUBJECT_RIGHT_EXERCISED",
            Self::AccessRequestProcessed => "ACCESS_REQUEST_PROCESSED",
            Self::CorrectionRequestProcessed => "CORRECTION_REQUEST_PROCESSED",
            Self::ErasureRequestProcessed => "ERASURE_REQUEST_PROCESSED",
            Self::DataDeletionScheduled => "DATA_DELETION_SCHEDULED",
            Self::PortabilityRequestProcessed => "PORTABILITY_REQUEST_PROCESSED",
            Self::DataSubjectRequestResolved => "DATA_SUBJECT_REQUEST_RESOLVED",
            Self::Custom(name) => name,
        }
    }

    /// Get the default compliance impact for this action.
    pub fn default_impact(&self) -> ComplianceImpact {
        match self {
            // High
            Self::DataDeletionScheduled => ComplianceImpact::High,

            // Medium
            Self::ConsentWithdrawn | Self::ErasureRequestProcessed => ComplianceImpact::Medium,

            // Low (default)
            _ => ComplianceImpact::Low,
        }
    }

    /// Whether this is one of the engine's own event names.
    pub fn is_builtin(&self) -> bool {
        !matches!(self, Self::Custom(_))
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditAction {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "COMPLIANCE_RECORD_CREATED" => Self::ComplianceRecordCreated,
            "CONSENT_UPDATED" => Self::ConsentUpdated,
            "CONSENT_WITHDRAWN" => Self::ConsentWithdrawn,
            "CONSENT_RENEWAL_REQUIRED" => Self::ConsentRenewalRequired,
            "DATA_SUBJECT_RIGHT_EXERCISED" => Self::DataSubjectRightExercised,
            "ACCESS_REQUEST_PROCESSED" => Self::AccessRequestProcessed,
            "CORRECTION_REQUEST_PROCESSED" => Self::CorrectionRequestProcessed,
            "ERASURE_REQUEST_PROCESSED" => Self::ErasureRequestProcessed,
            "DATA_DELETION_SCHEDULED" => Self::DataDeletionScheduled,
            "PORTABILITY_REQUEST_PROCESSED" => Self::PortabilityRequestProcessed,
            "DATA_SUBJECT_REQUEST_RESOLVED" => Self::DataSubjectRequestResolved,
            other => Self::Custom(other.to_string()),
        })
    }
}

impl From<String> for AuditAction {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(action) => action,
            Err(never) => match never {},
        }
    }
}

impl From<&str> for AuditAction {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<AuditAction> for String {
    fn from(action: AuditAction) -> Self {
        match action {
            AuditAction::Custom(name) => name,
            builtin => builtin.as_str().to_string(),
        }
    }
}
