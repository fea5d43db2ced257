//! Per-client and fleet compliance reports.

use crate::engine::ComplianceEngine;
use crate::error::ComplianceResult;
use crate::model::{ComplianceRecord, ConsentStatus, DataCategory, ExercisedRight};
use dpdp_audit_log::{AuditTrail, SortOrder};
use dpdp_audit_types::AuditLogEntry;
use serde::{Deserialize, Serialize};
use strum::Display;
use tracing::instrument;

/// A problem found on a single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum ComplianceIssue {
    #[serde(rename = "Consent not obtained")]
    #[strum(serialize = "Consent not obtained")]
    ConsentNotObtained,
    #[serde(rename = "Compliance score below threshold")]
    #[strum(serialize = "Compliance score below threshold")]
    ScoreBelowThreshold,
    #[serde(rename = "Sensitive data not encrypted")]
    #[strum(serialize = "Sensitive data not encrypted")]
    UnencryptedSensitiveData,
}

/// An issue counted across the fleet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum FleetIssue {
    #[serde(rename = "Missing Consent")]
    #[strum(serialize = "Missing Consent")]
    MissingConsent,
    #[serde(rename = "Low Compliance Score")]
    #[strum(serialize = "Low Compliance Score")]
    LowComplianceScore,
}

/// Issues present on a record.
pub fn compliance_issues(record: &ComplianceRecord, threshold: u8) -> Vec<ComplianceIssue> {
    let mut issues = Vec::new();
    if !record.consent_status.consent_given {
        issues.push(ComplianceIssue::ConsentNotObtained);
    }
    if !record.is_compliant(threshold) {
        issues.push(ComplianceIssue::ScoreBelowThreshold);
    }
    if record.data_categories.iter().any(|c| c.is_unencrypted_sensitive()) {
        issues.push(ComplianceIssue::UnencryptedSensitiveData);
    }
    issues
}

/// Audit section of a per-client report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientAuditSummary {
    pub total_events: usize,
    pub recent_events: Vec<AuditLogEntry>,
    pub compliance_issues: Vec<ComplianceIssue>,
}

/// Compliance report for one data subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientComplianceReport {
    pub client_id: String,
    pub compliance_score: u8,
    pub consent_status: ConsentStatus,
    pub data_categories: Vec<DataCategory>,
    pub exercised_rights: Vec<ExercisedRight>,
    pub audit_summary: ClientAuditSummary,
}

impl ClientComplianceReport {
    /// Build from a record and its audit trail, most recent first.
    pub fn build(
        record: &ComplianceRecord,
        trail: &AuditTrail,
        threshold: u8,
        recent_limit: usize,
    ) -> Self {
        Self {
            client_id: record.client_id.clone(),
            compliance_score: record.compliance_score,
            consent_status: record.consent_status.clone(),
            data_categories: record.data_categories.clone(),
            exercised_rights: record.exercised_rights().to_vec(),
            audit_summary: ClientAuditSummary {
                total_events: trail.len(),
                recent_events: trail.head(recent_limit),
                compliance_issues: compliance_issues(record, threshold),
            },
        }
    }
}

/// How often an issue occurs across the fleet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueCount {
    pub issue: FleetIssue,
    pub count: usize,
}

/// Audit section of the fleet report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetAuditSummary {
    pub total_audit_events: usize,
    pub high_risk_events: usize,
    pub recent_events: Vec<AuditLogEntry>,
}

/// Compliance report across every data subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetComplianceReport {
    pub total_clients: usize,
    pub compliant_clients: usize,
    /// Percentage of compliant clients; zero when there are none.
    pub compliance_rate: f64,
    /// Issues that occur at least once, most frequent first.
    pub common_issues: Vec<IssueCount>,
    pub audit_summary: FleetAuditSummary,
}

impl FleetComplianceReport {
    /// Build from every record and the whole audit log, most recent first.
    pub fn build(
        records: &[ComplianceRecord],
        log: &AuditTrail,
        threshold: u8,
        recent_limit: usize,
    ) -> Self {
        let total_clients = records.len();
        let compliant_clients = records.iter().filter(|r| r.is_compliant(threshold)).count();
        let compliance_rate = if total_clients == 0 {
            0.0
        } else {
            compliant_clients as f64 / total_clients as f64 * 100.0
        };

        let missing_consent = records
            .iter()
            .filter(|r| !r.consent_status.consent_given)
            .count();
        let low_score = total_clients - compliant_clients;
        let mut common_issues: Vec<IssueCount> = [
            (FleetIssue::MissingConsent, missing_consent),
            (FleetIssue::LowComplianceScore, low_score),
        ]
        .into_iter()
        .filter(|(_, count)| *count > 0)
        .map(|(issue, count)| IssueCount { issue, count })
        .collect();
        common_issues.sort_by(|a, b| b.count.cmp(&a.count));

        Self {
            total_clients,
            compliant_clients,
            compliance_rate,
            common_issues,
            audit_summary: FleetAuditSummary {
                total_audit_events: log.len(),
                high_risk_events: log
                    .iter()
                    .filter(|e| e.compliance_impact.is_high_risk())
                    .count(),
                recent_events: log.head(recent_limit),
            },
        }
    }
}

impl ComplianceEngine {
    /// Compliance report for one data subject.
    #[instrument(skip(self))]
    pub fn get_compliance_report(&self, client_id: &str) -> ComplianceResult<ClientComplianceReport> {
        let record = self.get_record(client_id)?;
        let trail = self.audit_trail(client_id, SortOrder::Descending)?;
        let config = self.config();
        Ok(ClientComplianceReport::build(
            &record,
            &trail,
            config.compliance_threshold,
            config.audit.client_recent_events,
        ))
    }

    /// Compliance report across every data subject.
    #[instrument(skip(self))]
    pub fn get_fleet_compliance_report(&self) -> ComplianceResult<FleetComplianceReport> {
        let records = self.records().load_all()?;
        let log = self.audit_log(SortOrder::Descending)?;
        let config = self.config();
        Ok(FleetComplianceReport::build(
            &records,
            &log,
            config.compliance_threshold,
            config.audit.fleet_recent_events,
        ))
    }
}
