//! Compliance record data model.

use crate::config::{days_after, EngineConfig};
use crate::error::ComplianceResult;
use crate::scorer;
use chrono::{DateTime, Utc};
use dpdp_audit_types::RequestId;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Sensitivity classification of a data category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Display, EnumIter, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Sensitivity {
    Low,
    Medium,
    High,
    Critical,
}

impl Sensitivity {
    /// High and critical data must be encrypted.
    pub fn requires_encryption(&self) -> bool {
        matches!(self, Self::High | Self::Critical)
    }
}

/// A category of personal data held about a subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataCategory {
    /// Unique name within a record.
    pub category: String,
    #[serde(default)]
    pub description: String,
    /// Missing when a configured catalog leaves the category unclassified.
    #[serde(default)]
    pub sensitivity: Option<Sensitivity>,
    #[serde(default)]
    pub data_elements: Vec<String>,
    #[serde(default)]
    pub collection_method: String,
    #[serde(default)]
    pub storage_location: String,
    /// Whether the category is encrypted at rest elsewhere in the platform.
    #[serde(default)]
    pub encryption_status: bool,
}

impl DataCategory {
    /// Classified categories count towards the documentation score.
    pub fn is_classified(&self) -> bool {
        self.sensitivity.is_some()
    }

    /// Sensitive data held without encryption.
    pub fn is_unencrypted_sensitive(&self) -> bool {
        self.sensitivity
            .map(|s| s.requires_encryption())
            .unwrap_or(false)
            && !self.encryption_status
    }
}

/// Why and on what basis data is processed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingPurpose {
    /// Unique name within a record.
    pub purpose: String,
    /// Free-text basis, e.g. "Legal Obligation (Section 9, DPDP Act 2023)".
    #[serde(default)]
    pub legal_basis: String,
    #[serde(default)]
    pub description: String,
    /// Names of the data categories this purpose uses.
    #[serde(default)]
    pub data_categories: Vec<String>,
    #[serde(default)]
    pub retention_period: String,
    #[serde(default)]
    pub sharing_partners: Vec<String>,
}

impl ProcessingPurpose {
    /// Both a legal basis and a retention period are recorded.
    pub fn is_documented(&self) -> bool {
        !self.legal_basis.is_empty() && !self.retention_period.is_empty()
    }
}

/// Subject-level consent state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsentStatus {
    pub consent_given: bool,
    pub consent_date: Option<DateTime<Utc>>,
    pub consent_version: String,
    pub withdrawal_date: Option<DateTime<Utc>>,
    pub renewal_required: bool,
    pub renewal_due: Option<DateTime<Utc>>,
}

impl ConsentStatus {
    /// Initial state: nothing consented yet.
    pub fn not_given(version: impl Into<String>) -> Self {
        Self {
            consent_given: false,
            consent_date: None,
            consent_version: version.into(),
            withdrawal_date: None,
            renewal_required: false,
            renewal_due: None,
        }
    }

    /// Consent is given and its renewal date has passed.
    pub fn renewal_is_due(&self, as_of: DateTime<Utc>) -> bool {
        self.consent_given
            && !self.renewal_required
            && self.renewal_due.map(|due| due <= as_of).unwrap_or(false)
    }
}

/// Retention policy applied to the subject's data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataRetentionPolicy {
    pub retention_period: String,
    pub deletion_schedule: String,
    pub archival_policy: String,
    pub last_review_date: DateTime<Utc>,
    pub next_review_date: DateTime<Utc>,
    /// Set when an erasure request has been accepted.
    #[serde(default)]
    pub scheduled_deletion: Option<DateTime<Utc>>,
}

impl DataRetentionPolicy {
    /// Both a retention period and a deletion schedule are recorded.
    pub fn is_documented(&self) -> bool {
        !self.retention_period.is_empty() && !self.deletion_schedule.is_empty()
    }
}

/// The five statutory rights a subject may exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Display, EnumIter, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RightType {
    Access,
    Correction,
    Erasure,
    Portability,
    WithdrawConsent,
}

impl RightType {
    /// Human-readable name used in rejection reasons.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Access => "Right to access",
            Self::Correction => "Right to correction",
            Self::Erasure => "Right to erasure",
            Self::Portability => "Right to portability",
            Self::WithdrawConsent => "Right to withdraw consent",
        }
    }
}

/// Which rights are enabled for a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RightsCapabilities {
    pub right_to_access: bool,
    pub right_to_correction: bool,
    pub right_to_erasure: bool,
    pub right_to_portability: bool,
    pub right_to_withdraw_consent: bool,
}

impl RightsCapabilities {
    /// Number of capability flags.
    pub const COUNT: usize = 5;

    /// Whether the given right may be exercised.
    pub fn allows(&self, right: RightType) -> bool {
        match right {
            RightType::Access => self.right_to_access,
            RightType::Correction => self.right_to_correction,
            RightType::Erasure => self.right_to_erasure,
            RightType::Portability => self.right_to_portability,
            RightType::WithdrawConsent => self.right_to_withdraw_consent,
        }
    }

    /// Number of enabled flags.
    pub fn enabled_count(&self) -> usize {
        [
            self.right_to_access,
            self.right_to_correction,
            self.right_to_erasure,
            self.right_to_portability,
            self.right_to_withdraw_consent,
        ]
        .iter()
        .filter(|enabled| **enabled)
        .count()
    }
}

impl Default for RightsCapabilities {
    fn default() -> Self {
        Self {
            right_to_access: true,
            right_to_correction: true,
            right_to_erasure: true,
            right_to_portability: true,
            right_to_withdraw_consent: true,
        }
    }
}

/// Lifecycle state of an exercised right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Fulfilled,
    Rejected,
}

impl RequestStatus {
    /// Terminal states are never re-opened.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// How a pending request ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Resolution {
    Fulfilled,
    Rejected { reason: String },
}

/// One entry in a subject's rights history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExercisedRight {
    pub request_id: RequestId,
    pub right_type: RightType,
    pub request_date: DateTime<Utc>,
    pub fulfillment_date: Option<DateTime<Utc>>,
    pub status: RequestStatus,
    pub reason: Option<String>,
}

impl ExercisedRight {
    /// A freshly received request.
    pub fn pending(request_id: RequestId, right_type: RightType, at: DateTime<Utc>) -> Self {
        Self {
            request_id,
            right_type,
            request_date: at,
            fulfillment_date: None,
            status: RequestStatus::Pending,
            reason: None,
        }
    }

    /// Move a pending request to its terminal state.
    ///
    /// Returns the current status unchanged if the request is already terminal.
    pub fn resolve(&mut self, resolution: Resolution, at: DateTime<Utc>) -> Result<(), RequestStatus> {
        if self.status.is_terminal() {
            return Err(self.status);
        }
        match resolution {
            Resolution::Fulfilled => {
                self.status = RequestStatus::Fulfilled;
                self.fulfillment_date = Some(at);
            }
            Resolution::Rejected { reason } => {
                self.status = RequestStatus::Rejected;
                self.reason = Some(reason);
            }
        }
        Ok(())
    }
}

/// Rights capabilities plus the append-only history of exercised rights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSubjectRights {
    #[serde(flatten)]
    pub capabilities: RightsCapabilities,
    pub exercised_rights: Vec<ExercisedRight>,
}

/// Everything the engine tracks for one data subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceRecord {
    pub client_id: String,
    pub data_categories: Vec<DataCategory>,
    pub processing_purposes: Vec<ProcessingPurpose>,
    pub consent_status: ConsentStatus,
    pub data_retention: DataRetentionPolicy,
    pub data_subject_rights: DataSubjectRights,
    pub last_updated: DateTime<Utc>,
    /// Derived by the scorer on every write.
    pub compliance_score: u8,
}

impl ComplianceRecord {
    /// Build a record from the configured catalog and templates.
    pub fn new(
        client_id: impl Into<String>,
        config: &EngineConfig,
        now: DateTime<Utc>,
    ) -> ComplianceResult<Self> {
        let retention = &config.retention;
        let next_review_date = days_after(
            now,
            retention.review_interval_days,
            "retention.review_interval_days",
        )?;
        let mut record = Self {
            client_id: client_id.into(),
            data_categories: config.catalog.data_categories.clone(),
            processing_purposes: config.catalog.processing_purposes.clone(),
            consent_status: ConsentStatus::not_given(&config.consent.default_version),
            data_retention: DataRetentionPolicy {
                retention_period: retention.retention_period.clone(),
                deletion_schedule: retention.deletion_schedule.clone(),
                archival_policy: retention.archival_policy.clone(),
                last_review_date: now,
                next_review_date,
                scheduled_deletion: None,
            },
            data_subject_rights: DataSubjectRights {
                capabilities: config.rights.enabled,
                exercised_rights: Vec::new(),
            },
            last_updated: now,
            compliance_score: 0,
        };
        record.compliance_score = scorer::score(&record);
        Ok(record)
    }

    /// Stamp the update time and recompute the score.
    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        self.last_updated = now;
        self.compliance_score = scorer::score(self);
    }

    /// History entries in request order.
    pub fn exercised_rights(&self) -> &[ExercisedRight] {
        &self.data_subject_rights.exercised_rights
    }

    /// Look up a request by id.
    pub fn exercised_right(&self, request_id: RequestId) -> Option<&ExercisedRight> {
        self.exercised_rights()
            .iter()
            .find(|r| r.request_id == request_id)
    }

    pub(crate) fn exercised_right_mut(&mut self, request_id: RequestId) -> Option<&mut ExercisedRight> {
        self.data_subject_rights
            .exercised_rights
            .iter_mut()
            .find(|r| r.request_id == request_id)
    }

    /// Whether the score meets the given compliance threshold.
    pub fn is_compliant(&self, threshold: u8) -> bool {
        self.compliance_score >= threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_new_record_starts_without_consent() {
        let record = ComplianceRecord::new("c-1", &EngineConfig::default(), Utc::now()).unwrap();
        assert!(!record.consent_status.consent_given);
        assert!(record.consent_status.consent_date.is_none());
        assert_eq!(record.consent_status.consent_version, "1.0");
        assert_eq!(record.data_subject_rights.capabilities.enabled_count(), 5);
        assert!(record.exercised_rights().is_empty());
        assert_eq!(record.compliance_score, scorer::score(&record));
    }

    #[test]
    fn test_review_dates_follow_interval() {
        let now = Utc::now();
        let record = ComplianceRecord::new("c-1", &EngineConfig::default(), now).unwrap();
        assert_eq!(record.data_retention.last_review_date, now);
        assert_eq!(record.data_retention.next_review_date, now + Duration::days(365));
    }

    #[test]
    fn test_resolve_only_from_pending() {
        let now = Utc::now();
        let mut right = ExercisedRight::pending(RequestId::new(), RightType::Erasure, now);
        right
            .resolve(Resolution::Rejected { reason: "blocked".into() }, now)
            .unwrap();
        assert_eq!(right.status, RequestStatus::Rejected);
        assert_eq!(right.reason.as_deref(), Some("blocked"));
        assert!(right.fulfillment_date.is_none());

        let err = right.resolve(Resolution::Fulfilled, now).unwrap_err();
        assert_eq!(err, RequestStatus::Rejected);
        assert_eq!(right.status, RequestStatus::Rejected);
    }

    #[test]
    fn test_right_type_wire_names() {
        assert_eq!(RightType::WithdrawConsent.to_string(), "withdraw_consent");
        assert_eq!("erasure".parse::<RightType>().unwrap(), RightType::Erasure);
        assert!("deletion".parse::<RightType>().is_err());
    }

    #[test]
    fn test_unencrypted_sensitive_detection() {
        let mut category = DataCategory {
            category: "Financial Information".into(),
            description: String::new(),
            sensitivity: Some(Sensitivity::High),
            data_elements: vec![],
            collection_method: String::new(),
            storage_location: String::new(),
            encryption_status: true,
        };
        assert!(!category.is_unencrypted_sensitive());
        category.encryption_status = false;
        assert!(category.is_unencrypted_sensitive());
        category.sensitivity = Some(Sensitivity::Low);
        assert!(!category.is_unencrypted_sensitive());
        category.sensitivity = None;
        assert!(!category.is_classified());
    }

    #[test]
    fn test_capabilities_flatten_into_rights() {
        let rights = DataSubjectRights {
            capabilities: RightsCapabilities::default(),
            exercised_rights: vec![],
        };
        let json = serde_json::to_value(&rights).unwrap();
        assert_eq!(json["right_to_erasure"], serde_json::json!(true));
        assert!(json["exercised_rights"].as_array().unwrap().is_empty());
    }
}
